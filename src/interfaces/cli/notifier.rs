//! Terminal notifier
//!
//! Prints link events for the interactive user and forwards them to the log.
//! Events about a user with a notification address also say where the mail
//! would go; nothing is sent.

use std::io::{self, Write};
use std::sync::Arc;

use colored::Colorize;
use parking_lot::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::config::NotificationConfig;
use crate::services::{LinkNotifier, TracingNotifier};
use crate::storage::{Link, UserDirectory};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 通知输出目标，清理线程和 REPL 共用
pub type SharedWriter = Arc<Mutex<dyn Write + Send>>;

pub struct ConsoleNotifier {
    config: NotificationConfig,
    users: Arc<UserDirectory>,
    log: TracingNotifier,
    out: SharedWriter,
}

impl ConsoleNotifier {
    pub fn new(config: NotificationConfig, users: Arc<UserDirectory>) -> Self {
        Self::with_writer(config, users, Arc::new(Mutex::new(io::stdout())))
    }

    pub fn with_writer(
        config: NotificationConfig,
        users: Arc<UserDirectory>,
        out: SharedWriter,
    ) -> Self {
        let log = TracingNotifier::new(config.clone());
        Self {
            config,
            users,
            log,
            out,
        }
    }

    /// 一个事件整块写出，避免和其他输出交错
    fn emit(&self, lines: &[String]) {
        let mut text = lines.join("\n");
        text.push('\n');
        let mut out = self.out.lock();
        if let Err(e) = out.write_all(text.as_bytes()).and_then(|_| out.flush()) {
            debug!("ConsoleNotifier: write failed: {}", e);
        }
    }

    fn mail_line(&self, owner: Uuid) -> Option<String> {
        self.users
            .find(owner)
            .and_then(|u| u.notification_email().map(str::to_string))
            .map(|email| format!("{} {}", "Notification email sent to:".dimmed(), email))
    }
}

impl LinkNotifier for ConsoleNotifier {
    fn link_created(&self, link: &Link, ttl_hours: u32) {
        self.log.link_created(link, ttl_hours);
        let rule = "=".repeat(50);
        let mut lines = vec![
            String::new(),
            rule.clone(),
            "LINK CREATED".bold().green().to_string(),
            rule.clone(),
            format!("Short Code:   {}", link.code().cyan()),
            format!("Original URL: {}", link.target()),
            format!("Expires At:   {}", link.expires_at().format(TIME_FORMAT)),
            format!("Max Clicks:   {}", link.max_clicks()),
        ];
        if !link.description().is_empty() {
            lines.push(format!("Description:  {}", link.description()));
        }
        lines.push("-".repeat(50));
        lines.push(format!(
            "{} This link will expire in {} hours",
            "!".yellow().bold(),
            ttl_hours
        ));
        lines.push(rule);
        self.emit(&lines);
    }

    fn limit_reached(&self, link: &Link) {
        self.log.limit_reached(link);
        if !self.config.limit_notification {
            return;
        }
        let mut lines = vec![format!(
            "{} Link '{}' has reached its click limit ({}/{}). It is now inactive.",
            "NOTIFICATION:".yellow().bold(),
            link.code(),
            link.current_clicks(),
            link.max_clicks()
        )];
        lines.extend(self.mail_line(link.owner()));
        self.emit(&lines);
    }

    fn link_expired(&self, link: &Link) {
        self.log.link_expired(link);
        if !self.config.expire_notification {
            return;
        }
        let mut lines = vec![format!(
            "{} Link '{}' expired on {}. Clicks: {}/{}.",
            "NOTIFICATION:".yellow().bold(),
            link.code(),
            link.expires_at().format(TIME_FORMAT),
            link.current_clicks(),
            link.max_clicks()
        )];
        lines.extend(self.mail_line(link.owner()));
        self.emit(&lines);
    }

    fn near_limit(&self, link: &Link, threshold_percent: u32) {
        self.log.near_limit(link, threshold_percent);
        if !self.config.limit_notification {
            return;
        }
        self.emit(&[format!(
            "{} Link '{}' is near its click limit: {}/{} ({:.1}%)",
            "INFO:".blue().bold(),
            link.code(),
            link.current_clicks(),
            link.max_clicks(),
            link.usage_percentage()
        )]);
    }

    fn links_cleaned_up(&self, links: &[Link]) {
        self.log.links_cleaned_up(links);
        let mut lines = vec![
            String::new(),
            format!("{} Removed {} expired links:", "Cleanup:".bold(), links.len()),
        ];
        lines.extend(links.iter().map(|link| {
            format!(
                "  - {} (expired: {})",
                link.code(),
                link.expires_at().format(TIME_FORMAT)
            )
        }));
        self.emit(&lines);
    }

    fn links_deactivated(&self, links: &[Link]) {
        self.log.links_deactivated(links);
        self.emit(&[
            String::new(),
            format!(
                "{} Deactivated {} expired links",
                "Cleanup:".bold(),
                links.len()
            ),
        ]);
    }
}
