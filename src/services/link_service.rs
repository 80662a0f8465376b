//! Link management service
//!
//! `LinkRegistry` is the only entry point front ends use to touch links. It
//! combines the store, the code generator and the user directory, enforces
//! ownership and turns lifecycle refusals into typed errors.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::errors::{QuotalinkError, Result};
use crate::services::code_generator::ShortCodeGenerator;
use crate::services::notification::LinkNotifier;
use crate::storage::link_store::Claim;
use crate::storage::{Link, LinkState, LinkStore, MAX_CLICK_QUOTA, UserDirectory};
use crate::utils::url_validator::validate_url;

// ============ Request/Response DTOs ============

/// Request to create a new link
#[derive(Debug, Clone)]
pub struct CreateLinkRequest {
    /// Target URL
    pub target: String,
    /// Click quota (None = configured default)
    pub max_clicks: Option<u32>,
    /// Free-form note shown in listings
    pub description: Option<String>,
}

impl CreateLinkRequest {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            max_clicks: None,
            description: None,
        }
    }

    pub fn with_max_clicks(mut self, max_clicks: u32) -> Self {
        self.max_clicks = Some(max_clicks);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Result of link creation
#[derive(Debug, Clone)]
pub struct LinkCreateResult {
    pub link: Link,
    /// The owner already had a live link for this URL and got it back
    pub reused: bool,
}

/// Read-only report on one link, as shown to its owner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkStatistics {
    pub code: String,
    pub target: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub max_clicks: u32,
    pub current_clicks: u32,
    pub is_active: bool,
    pub is_expired: bool,
    pub has_reached_limit: bool,
    pub can_be_accessed: bool,
    pub description: String,
    /// Whole hours left, never negative
    pub hours_left: i64,
    /// Share of the quota used, capped at 100
    pub usage_percentage: f64,
    pub state: LinkState,
}

impl From<&Link> for LinkStatistics {
    fn from(link: &Link) -> Self {
        let now = Utc::now();
        Self {
            code: link.code().to_string(),
            target: link.target().to_string(),
            created_at: link.created_at(),
            expires_at: link.expires_at(),
            max_clicks: link.max_clicks(),
            current_clicks: link.current_clicks(),
            is_active: link.is_active(),
            is_expired: link.is_expired_at(now),
            has_reached_limit: link.has_reached_limit(),
            can_be_accessed: link.can_be_accessed_at(now),
            description: link.description().to_string(),
            hours_left: link.hours_remaining().max(0),
            usage_percentage: link.usage_percentage(),
            state: link.state_at(now),
        }
    }
}

/// Registry knobs taken from [`AppConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrySettings {
    pub default_ttl_hours: u32,
    pub default_max_clicks: u32,
    /// When false every caller may manage every link
    pub owner_only_operations: bool,
    pub near_limit_threshold_percent: u32,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for RegistrySettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            default_ttl_hours: config.link.default_ttl_hours,
            default_max_clicks: config.link.default_max_clicks,
            owner_only_operations: config.security.owner_only_operations,
            near_limit_threshold_percent: config.notification.near_limit_threshold_percent,
        }
    }
}

// ============ LinkRegistry Implementation ============

pub struct LinkRegistry {
    store: Arc<LinkStore>,
    generator: Arc<ShortCodeGenerator>,
    users: Arc<UserDirectory>,
    notifier: Arc<dyn LinkNotifier>,
    settings: RegistrySettings,
}

impl LinkRegistry {
    pub fn new(
        store: Arc<LinkStore>,
        generator: Arc<ShortCodeGenerator>,
        users: Arc<UserDirectory>,
        notifier: Arc<dyn LinkNotifier>,
        settings: RegistrySettings,
    ) -> Self {
        Self {
            store,
            generator,
            users,
            notifier,
            settings,
        }
    }

    pub fn settings(&self) -> &RegistrySettings {
        &self.settings
    }

    fn not_found(code: &str) -> QuotalinkError {
        QuotalinkError::not_found(format!("Link '{}' not found", code))
    }

    fn check_owner(&self, link: &Link, owner: Uuid) -> Result<()> {
        if self.settings.owner_only_operations && !link.is_owned_by(owner) {
            return Err(QuotalinkError::access_denied(format!(
                "Link '{}' belongs to another user",
                link.code()
            )));
        }
        Ok(())
    }

    /// Why an inaccessible link was refused. Expiry wins over the limit,
    /// which wins over a cleared flag.
    fn refusal(link: &Link) -> QuotalinkError {
        match link.state() {
            LinkState::Expired => {
                QuotalinkError::expired(format!("Link '{}' has expired", link.code()))
            }
            LinkState::LimitReached => QuotalinkError::limit_reached(format!(
                "Link '{}' reached its click limit",
                link.code()
            )),
            LinkState::Deactivated | LinkState::Active => {
                QuotalinkError::inactive(format!("Link '{}' is not active", link.code()))
            }
        }
    }

    // ============ CRUD Operations ============

    /// Create a short link for `owner`.
    ///
    /// Input is validated before a code is drawn, so rejected requests never
    /// consume codes. Calling again with the same owner and URL returns the
    /// existing link while it is still accessible; once it has expired, run
    /// out or been deactivated, a fresh record replaces it under the same code.
    pub fn create_link(&self, owner: Uuid, req: CreateLinkRequest) -> Result<LinkCreateResult> {
        let target = validate_url(&req.target)
            .map_err(|e| QuotalinkError::invalid_url(e.to_string()))?
            .to_string();

        let max_clicks = req.max_clicks.unwrap_or(self.settings.default_max_clicks);
        if max_clicks == 0 || max_clicks > MAX_CLICK_QUOTA {
            return Err(QuotalinkError::invalid_quota(format!(
                "Max clicks must be within 1..={}, got {}",
                MAX_CLICK_QUOTA, max_clicks
            )));
        }

        let ttl_hours = self.settings.default_ttl_hours;
        let expires_at = Utc::now()
            .checked_add_signed(Duration::hours(i64::from(ttl_hours)))
            .ok_or_else(|| {
                QuotalinkError::invalid_input(format!(
                    "Link TTL of {} hours is out of range",
                    ttl_hours
                ))
            })?;

        let code = self.generator.generate(&target, owner)?;
        let link = Link::new(
            owner,
            &target,
            code,
            expires_at,
            max_clicks,
            req.description.unwrap_or_default(),
        )?;

        self.users.get_or_create(Some(owner));

        match self.store.claim_code(link, |held| held.can_be_accessed()) {
            Claim::Kept(existing) => {
                self.users.touch(owner);
                debug!(
                    "LinkRegistry: reusing live link '{}' for owner {}",
                    existing.code(),
                    owner
                );
                Ok(LinkCreateResult {
                    link: existing,
                    reused: true,
                })
            }
            Claim::Inserted { link, replaced } => {
                if let Some(old) = replaced {
                    self.users.detach_link(old.owner(), old.id());
                    debug!(
                        "LinkRegistry: replaced spent link '{}' ({})",
                        old.code(),
                        old.id()
                    );
                }
                self.users.attach_link(owner, link.id());
                info!(
                    "LinkRegistry: created link '{}' -> '{}' for {}",
                    link.code(),
                    link.target(),
                    owner
                );
                self.notifier.link_created(&link, ttl_hours);
                Ok(LinkCreateResult {
                    link,
                    reused: false,
                })
            }
        }
    }

    /// Dereference `code` and count the click.
    ///
    /// Refused resolutions leave the record untouched. The check and the
    /// increment run under the store's write lock, so concurrent resolves
    /// never lose a click or overshoot the quota.
    pub fn resolve(&self, code: &str) -> Result<String> {
        let threshold = self.settings.near_limit_threshold_percent;

        let (outcome, snapshot, crossed_threshold) = self
            .store
            .update_by_code(code, |link| {
                if !link.can_be_accessed() {
                    return (Err(Self::refusal(link)), link.clone(), false);
                }
                let was_near = link.is_near_limit(threshold);
                let outcome = link.record_click();
                let crossed = outcome.is_ok() && !was_near && link.is_near_limit(threshold);
                (outcome, link.clone(), crossed)
            })
            .ok_or_else(|| Self::not_found(code))?;

        match outcome {
            Ok(()) => {
                if snapshot.has_reached_limit() {
                    self.notifier.limit_reached(&snapshot);
                } else if crossed_threshold {
                    self.notifier.near_limit(&snapshot, threshold);
                }
                debug!(
                    "LinkRegistry: resolved '{}' ({}/{})",
                    code,
                    snapshot.current_clicks(),
                    snapshot.max_clicks()
                );
                Ok(snapshot.target().to_string())
            }
            Err(e) => {
                if matches!(e, QuotalinkError::Expired(_)) {
                    self.notifier.link_expired(&snapshot);
                }
                debug!("LinkRegistry: refused '{}': {}", code, e);
                Err(e)
            }
        }
    }

    /// Fetch a link on behalf of `owner`. Missing codes are reported before
    /// ownership is checked.
    pub fn get_owned(&self, code: &str, owner: Uuid) -> Result<Link> {
        let link = self
            .store
            .find_by_code(code)
            .ok_or_else(|| Self::not_found(code))?;
        self.check_owner(&link, owner)?;
        self.users.touch(owner);
        Ok(link)
    }

    /// Change the click quota of an owned link.
    pub fn update_quota(&self, code: &str, owner: Uuid, new_max_clicks: u32) -> Result<Link> {
        let updated = self
            .store
            .update_by_code(code, |link| -> Result<Link> {
                self.check_owner(link, owner)?;
                let was_accessible = link.can_be_accessed();
                link.set_max_clicks(new_max_clicks)?;
                if !was_accessible && link.can_be_accessed() {
                    info!("LinkRegistry: link '{}' reactivated by new quota", code);
                }
                Ok(link.clone())
            })
            .ok_or_else(|| Self::not_found(code))??;

        self.users.touch(owner);
        info!(
            "LinkRegistry: quota of '{}' set to {}",
            code,
            updated.max_clicks()
        );
        Ok(updated)
    }

    /// Clear the active flag of an owned link. Idempotent.
    pub fn deactivate(&self, code: &str, owner: Uuid) -> Result<Link> {
        let updated = self
            .store
            .update_by_code(code, |link| -> Result<Link> {
                self.check_owner(link, owner)?;
                link.deactivate();
                Ok(link.clone())
            })
            .ok_or_else(|| Self::not_found(code))??;

        self.users.touch(owner);
        info!("LinkRegistry: deactivated '{}'", code);
        Ok(updated)
    }

    /// Remove an owned link from every index.
    ///
    /// The code stays reserved in the generator ledger and is never handed
    /// to another owner.
    pub fn delete(&self, code: &str, owner: Uuid) -> Result<Link> {
        let link = self.get_owned(code, owner)?;
        let removed = self
            .store
            .remove(link.id())
            .ok_or_else(|| Self::not_found(code))?;

        self.users.detach_link(removed.owner(), removed.id());
        info!("LinkRegistry: deleted '{}'", code);
        Ok(removed)
    }

    /// Every link of `owner`, newest first.
    pub fn list_owned(&self, owner: Uuid) -> Vec<Link> {
        let mut links = self.store.find_by_owner(owner);
        links.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        self.users.touch(owner);
        links
    }

    pub fn statistics(&self, code: &str, owner: Uuid) -> Result<LinkStatistics> {
        let link = self.get_owned(code, owner)?;
        Ok(LinkStatistics::from(&link))
    }

    pub fn find_expired(&self) -> Vec<Link> {
        let now = Utc::now();
        self.store
            .all()
            .into_iter()
            .filter(|l| l.is_expired_at(now))
            .collect()
    }

    /// Accessible links whose usage is at or above `threshold_percent`.
    pub fn find_near_limit(&self, threshold_percent: u32) -> Vec<Link> {
        let now = Utc::now();
        self.store
            .all()
            .into_iter()
            .filter(|l| l.can_be_accessed_at(now) && l.is_near_limit(threshold_percent))
            .collect()
    }

    /// Live links that expire within `threshold_hours`.
    pub fn find_expiring_soon(&self, threshold_hours: i64) -> Vec<Link> {
        self.store
            .all()
            .into_iter()
            .filter(|l| l.is_expiring_soon(threshold_hours))
            .collect()
    }

    pub fn count(&self) -> usize {
        self.store.count()
    }

    /// Resolve a user id for a session, registering it when unknown.
    pub fn login(&self, id: Option<Uuid>) -> Uuid {
        let user = self.users.get_or_create(id);
        self.users.touch(user.id());
        user.id()
    }

    pub fn users(&self) -> &UserDirectory {
        &self.users
    }

    /// Links of `owner` that the user record no longer lists, re-attached.
    /// Returns how many were repaired.
    pub fn reconcile_user_links(&self, owner: Uuid) -> usize {
        let Some(user) = self.users.find(owner) else {
            return 0;
        };
        let mut repaired = 0;
        for link in self.store.find_by_owner(owner) {
            if !user.owns_link(link.id()) {
                self.users.attach_link(owner, link.id());
                repaired += 1;
            }
        }
        if repaired > 0 {
            warn!(
                "LinkRegistry: re-attached {} links to user {}",
                repaired, owner
            );
        }
        repaired
    }
}
