//! Link and user records
//!
//! A link's lifecycle state is derived on demand from its timestamps, its
//! click counters and a single persisted `active` flag. Nothing here caches
//! `is_expired` or `has_reached_limit`.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use strum::AsRefStr;
use uuid::Uuid;

use crate::errors::{QuotalinkError, Result};
use crate::utils::email_validator::is_valid_email;
use crate::utils::url_validator::validate_url;

/// 点击配额上限
pub const MAX_CLICK_QUOTA: u32 = 1_000_000;

/// Derived lifecycle state of a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LinkState {
    Active,
    Expired,
    LimitReached,
    Deactivated,
}

fn check_quota(max_clicks: u32) -> Result<()> {
    if max_clicks == 0 {
        return Err(QuotalinkError::invalid_quota("Max clicks must be positive"));
    }
    if max_clicks > MAX_CLICK_QUOTA {
        return Err(QuotalinkError::invalid_quota(format!(
            "Max clicks cannot exceed {}",
            MAX_CLICK_QUOTA
        )));
    }
    Ok(())
}

fn checked_target(target: &str) -> Result<String> {
    validate_url(target)
        .map(str::to_string)
        .map_err(|e| QuotalinkError::invalid_url(e.to_string()))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    id: Uuid,
    owner: Uuid,
    target: String,
    code: String,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    max_clicks: u32,
    current_clicks: u32,
    active: bool,
    description: String,
}

impl Link {
    /// Create a fresh, active link with zero clicks.
    ///
    /// Fails with a validation error when the target URL is malformed, the
    /// quota is outside `[1, 1_000_000]`, or `expires_at` lies in the past.
    pub fn new(
        owner: Uuid,
        target: &str,
        code: impl Into<String>,
        expires_at: DateTime<Utc>,
        max_clicks: u32,
        description: impl Into<String>,
    ) -> Result<Self> {
        let created_at = Utc::now();
        if expires_at < created_at {
            return Err(QuotalinkError::invalid_input(
                "Expiration date cannot be before creation date",
            ));
        }

        LinkBuilder::new(owner, target, code)
            .created_at(created_at)
            .expires_at(expires_at)
            .max_clicks(max_clicks)
            .description(description)
            .build()
    }

    /// Construction path for fixtures and restored records.
    ///
    /// The builder accepts arbitrary timestamps, click counts and active
    /// flags. See [`LinkBuilder`].
    pub fn builder(owner: Uuid, target: &str, code: impl Into<String>) -> LinkBuilder {
        LinkBuilder::new(owner, target, code)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn owner(&self) -> Uuid {
        self.owner
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn max_clicks(&self) -> u32 {
        self.max_clicks
    }

    pub fn current_clicks(&self) -> u32 {
        self.current_clicks
    }

    /// The persisted active flag. Use [`Link::can_be_accessed`] to decide
    /// whether the link may be dereferenced.
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_owned_by(&self, owner: Uuid) -> bool {
        self.owner == owner
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn has_reached_limit(&self) -> bool {
        self.current_clicks >= self.max_clicks
    }

    pub fn can_be_accessed(&self) -> bool {
        self.can_be_accessed_at(Utc::now())
    }

    pub fn can_be_accessed_at(&self, now: DateTime<Utc>) -> bool {
        self.active && !self.is_expired_at(now) && !self.has_reached_limit()
    }

    /// Current lifecycle state. Expiry wins over the click limit, which wins
    /// over a cleared flag.
    pub fn state(&self) -> LinkState {
        self.state_at(Utc::now())
    }

    pub fn state_at(&self, now: DateTime<Utc>) -> LinkState {
        if self.is_expired_at(now) {
            LinkState::Expired
        } else if self.has_reached_limit() {
            LinkState::LimitReached
        } else if !self.active {
            LinkState::Deactivated
        } else {
            LinkState::Active
        }
    }

    pub fn status_description(&self) -> &'static str {
        match self.state() {
            LinkState::Expired => "EXPIRED",
            LinkState::LimitReached => "LIMIT REACHED",
            LinkState::Deactivated => "INACTIVE (manually deactivated)",
            LinkState::Active => "ACTIVE",
        }
    }

    /// Count one successful resolution.
    ///
    /// An expired or already-exhausted link has its flag cleared *before*
    /// the error is returned. A click that lands exactly on the quota
    /// succeeds and then clears the flag.
    pub fn record_click(&mut self) -> Result<()> {
        self.record_click_at(Utc::now())
    }

    pub fn record_click_at(&mut self, now: DateTime<Utc>) -> Result<()> {
        if !self.active {
            return Err(QuotalinkError::inactive(format!(
                "Link '{}' is not active",
                self.code
            )));
        }

        if self.is_expired_at(now) {
            self.active = false;
            return Err(QuotalinkError::expired(format!(
                "Link '{}' has expired",
                self.code
            )));
        }

        // 已经达到上限
        if self.has_reached_limit() {
            self.active = false;
            return Err(QuotalinkError::limit_reached(format!(
                "Link '{}' reached its click limit",
                self.code
            )));
        }

        self.current_clicks += 1;

        // 本次点击后达到上限
        if self.has_reached_limit() {
            self.active = false;
        }

        Ok(())
    }

    /// Change the click quota.
    ///
    /// A link that went inactive because it used up its old quota becomes
    /// active again if it is not expired. Expiration is never touched.
    pub fn set_max_clicks(&mut self, new_max_clicks: u32) -> Result<()> {
        self.set_max_clicks_at(new_max_clicks, Utc::now())
    }

    pub fn set_max_clicks_at(&mut self, new_max_clicks: u32, now: DateTime<Utc>) -> Result<()> {
        check_quota(new_max_clicks)?;

        if new_max_clicks < self.current_clicks {
            return Err(QuotalinkError::invalid_quota(format!(
                "New max clicks ({}) cannot be less than current clicks ({})",
                new_max_clicks, self.current_clicks
            )));
        }

        let exhausted_before = self.has_reached_limit();
        self.max_clicks = new_max_clicks;

        if !self.active && exhausted_before && !self.is_expired_at(now) && !self.has_reached_limit()
        {
            self.active = true;
        }

        Ok(())
    }

    /// Clear the active flag. Idempotent.
    pub fn deactivate(&mut self) {
        self.active = false;
    }

    /// Share of the quota already used, capped at 100.
    pub fn usage_percentage(&self) -> f64 {
        if self.max_clicks == 0 {
            return 0.0;
        }
        (f64::from(self.current_clicks) * 100.0 / f64::from(self.max_clicks)).min(100.0)
    }

    /// Whole hours until expiry; negative once expired.
    pub fn hours_remaining(&self) -> i64 {
        (self.expires_at - Utc::now()).num_hours()
    }

    pub fn is_expiring_soon(&self, threshold_hours: i64) -> bool {
        let remaining = self.expires_at - Utc::now();
        let hours = remaining.num_hours();

        // 不足一小时时按分钟判断
        if hours == 0 {
            let minutes = remaining.num_minutes();
            return minutes > 0 && minutes <= threshold_hours * 60;
        }

        hours > 0 && hours <= threshold_hours
    }

    pub fn is_near_limit(&self, threshold_percent: u32) -> bool {
        self.usage_percentage() >= f64::from(threshold_percent)
    }
}

/// Builder for [`Link`] records with caller-chosen timestamps and counters.
///
/// Unlike [`Link::new`] it does not require `expires_at >= created_at`, so it
/// can produce already-expired links. URL and quota range are still
/// validated.
///
/// ```
/// use chrono::{Duration, Utc};
/// use quotalink::storage::Link;
/// use uuid::Uuid;
///
/// let link = Link::builder(Uuid::new_v4(), "https://example.com", "abc1234")
///     .created_at(Utc::now() - Duration::hours(48))
///     .expires_at(Utc::now() - Duration::hours(24))
///     .build()
///     .unwrap();
/// assert!(link.is_expired());
/// ```
#[derive(Debug, Clone)]
pub struct LinkBuilder {
    id: Uuid,
    owner: Uuid,
    target: String,
    code: String,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    max_clicks: u32,
    current_clicks: u32,
    active: bool,
    description: String,
}

impl LinkBuilder {
    pub fn new(owner: Uuid, target: &str, code: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner,
            target: target.to_string(),
            code: code.into(),
            created_at: now,
            expires_at: now + Duration::hours(24),
            max_clicks: 100,
            current_clicks: 0,
            active: true,
            description: String::new(),
        }
    }

    pub fn id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = expires_at;
        self
    }

    pub fn max_clicks(mut self, max_clicks: u32) -> Self {
        self.max_clicks = max_clicks;
        self
    }

    pub fn current_clicks(mut self, current_clicks: u32) -> Self {
        self.current_clicks = current_clicks;
        self
    }

    pub fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn build(self) -> Result<Link> {
        let target = checked_target(&self.target)?;
        check_quota(self.max_clicks)?;
        if self.code.is_empty() {
            return Err(QuotalinkError::invalid_input("Short code cannot be empty"));
        }

        Ok(Link {
            id: self.id,
            owner: self.owner,
            target,
            code: self.code,
            created_at: self.created_at,
            expires_at: self.expires_at,
            max_clicks: self.max_clicks,
            current_clicks: self.current_clicks,
            active: self.active,
            description: self.description,
        })
    }
}

/// A user session record.
///
/// `link_ids` is a convenience cache; link ownership is decided by
/// [`Link::owner`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    id: Uuid,
    created_at: DateTime<Utc>,
    last_activity: DateTime<Utc>,
    notification_email: Option<String>,
    link_ids: HashSet<Uuid>,
}

impl User {
    pub fn new(id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id,
            created_at: now,
            last_activity: now,
            notification_email: None,
            link_ids: HashSet::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    pub fn notification_email(&self) -> Option<&str> {
        self.notification_email.as_deref()
    }

    pub fn link_ids(&self) -> &HashSet<Uuid> {
        &self.link_ids
    }

    pub fn owns_link(&self, link_id: Uuid) -> bool {
        self.link_ids.contains(&link_id)
    }

    pub fn add_link(&mut self, link_id: Uuid) {
        self.link_ids.insert(link_id);
        self.touch();
    }

    pub fn remove_link(&mut self, link_id: Uuid) {
        self.link_ids.remove(&link_id);
        self.touch();
    }

    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }

    /// Set or clear (empty string) the notification address.
    pub fn set_notification_email(&mut self, email: &str) -> Result<()> {
        let email = email.trim();
        if email.is_empty() {
            self.notification_email = None;
            return Ok(());
        }
        if !is_valid_email(email) {
            return Err(QuotalinkError::invalid_email(format!(
                "Invalid email format: '{}'",
                email
            )));
        }
        self.notification_email = Some(email.to_string());
        Ok(())
    }

    pub(crate) fn set_last_activity(&mut self, at: DateTime<Utc>) {
        self.last_activity = at;
    }
}
