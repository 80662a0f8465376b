//! Link event notifications
//!
//! The core reports lifecycle events through [`LinkNotifier`]; front ends
//! decide how to render them. `TracingNotifier` writes them to the log.

use tracing::{info, warn};

use crate::config::NotificationConfig;
use crate::storage::Link;

pub trait LinkNotifier: Send + Sync {
    fn link_created(&self, _link: &Link, _ttl_hours: u32) {}

    /// The click that just succeeded used up the quota.
    fn limit_reached(&self, _link: &Link) {}

    /// A resolve was refused because the link expired.
    fn link_expired(&self, _link: &Link) {}

    fn near_limit(&self, _link: &Link, _threshold_percent: u32) {}

    /// Emitted once per sweep for the whole batch of deleted links.
    fn links_cleaned_up(&self, _links: &[Link]) {}

    /// Emitted once per sweep for links whose flag the sweep cleared.
    fn links_deactivated(&self, _links: &[Link]) {}
}

/// Notifier that drops every event.
pub struct NoopNotifier;

impl LinkNotifier for NoopNotifier {}

/// Notifier that logs events through `tracing`.
pub struct TracingNotifier {
    config: NotificationConfig,
}

impl TracingNotifier {
    pub fn new(config: NotificationConfig) -> Self {
        Self { config }
    }
}

impl LinkNotifier for TracingNotifier {
    fn link_created(&self, link: &Link, ttl_hours: u32) {
        info!(
            code = link.code(),
            owner = %link.owner(),
            "Link created: {} -> {} (valid for {} hours, max {} clicks)",
            link.code(),
            link.target(),
            ttl_hours,
            link.max_clicks()
        );
    }

    fn limit_reached(&self, link: &Link) {
        if self.config.limit_notification {
            warn!(
                code = link.code(),
                owner = %link.owner(),
                "Link '{}' reached its click limit ({}/{})",
                link.code(),
                link.current_clicks(),
                link.max_clicks()
            );
        }
    }

    fn link_expired(&self, link: &Link) {
        if self.config.expire_notification {
            warn!(
                code = link.code(),
                owner = %link.owner(),
                "Link '{}' expired at {}",
                link.code(),
                link.expires_at().format("%Y-%m-%d %H:%M:%S UTC")
            );
        }
    }

    fn near_limit(&self, link: &Link, threshold_percent: u32) {
        if self.config.limit_notification {
            info!(
                code = link.code(),
                "Link '{}' used {:.1}% of its quota (threshold {}%)",
                link.code(),
                link.usage_percentage(),
                threshold_percent
            );
        }
    }

    fn links_cleaned_up(&self, links: &[Link]) {
        let codes: Vec<&str> = links.iter().map(|l| l.code()).collect();
        info!(
            "Cleaned up {} expired links: {}",
            links.len(),
            codes.join(", ")
        );
    }

    fn links_deactivated(&self, links: &[Link]) {
        info!("Deactivated {} expired links", links.len());
    }
}
