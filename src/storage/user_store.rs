//! User directory
//!
//! A concurrent id → user map. Every mutation runs under the entry's shard
//! lock, so concurrent touches and email updates never overwrite each other.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::{QuotalinkError, Result};
use crate::storage::models::User;

pub struct UserDirectory {
    users: DashMap<Uuid, User>,
    session_ttl: Duration,
}

impl UserDirectory {
    pub fn new(session_ttl_hours: u32) -> Self {
        Self {
            users: DashMap::new(),
            session_ttl: Duration::hours(i64::from(session_ttl_hours)),
        }
    }

    /// Register a user. `None` generates a fresh id; an explicit id that is
    /// already registered fails with `AlreadyExists`.
    pub fn create_user(&self, id: Option<Uuid>) -> Result<User> {
        let id = id.unwrap_or_else(Uuid::new_v4);
        match self.users.entry(id) {
            Entry::Occupied(_) => Err(QuotalinkError::already_exists(format!(
                "User with id {} already exists",
                id
            ))),
            Entry::Vacant(slot) => {
                let user = User::new(id);
                slot.insert(user.clone());
                debug!("UserDirectory: created user {}", id);
                Ok(user)
            }
        }
    }

    /// Look up `id`, creating it if missing. `None` always creates.
    pub fn get_or_create(&self, id: Option<Uuid>) -> User {
        match id {
            Some(id) => self
                .users
                .entry(id)
                .or_insert_with(|| User::new(id))
                .clone(),
            None => {
                let user = User::new(Uuid::new_v4());
                self.users.insert(user.id(), user.clone());
                user
            }
        }
    }

    pub fn find(&self, id: Uuid) -> Option<User> {
        self.users.get(&id).map(|u| u.clone())
    }

    pub fn exists(&self, id: Uuid) -> bool {
        self.users.contains_key(&id)
    }

    /// Refresh the last-activity timestamp. Unknown users are ignored.
    pub fn touch(&self, id: Uuid) {
        if let Some(mut user) = self.users.get_mut(&id) {
            user.touch();
        }
    }

    /// Set (or clear with an empty string) the notification address.
    pub fn set_email(&self, id: Uuid, email: &str) -> Result<User> {
        let mut user = self
            .users
            .get_mut(&id)
            .ok_or_else(|| QuotalinkError::not_found(format!("User {} not found", id)))?;
        user.set_notification_email(email)?;
        user.touch();
        Ok(user.clone())
    }

    pub fn attach_link(&self, id: Uuid, link_id: Uuid) {
        if let Some(mut user) = self.users.get_mut(&id) {
            user.add_link(link_id);
        }
    }

    pub fn detach_link(&self, id: Uuid, link_id: Uuid) {
        if let Some(mut user) = self.users.get_mut(&id) {
            user.remove_link(link_id);
        }
    }

    /// Drop users idle for longer than the session TTL. Returns how many
    /// were removed.
    pub fn cleanup_inactive(&self, now: DateTime<Utc>) -> usize {
        // TTL 超出时间范围时没有人算作空闲
        let Some(cutoff) = now.checked_sub_signed(self.session_ttl) else {
            return 0;
        };
        let before = self.users.len();
        self.users.retain(|_, user| user.last_activity() >= cutoff);
        let removed = before.saturating_sub(self.users.len());
        if removed > 0 {
            info!("UserDirectory: removed {} inactive users", removed);
        }
        removed
    }

    pub fn count(&self) -> usize {
        self.users.len()
    }

    /// Override the last-activity timestamp (fixtures, restored sessions).
    pub fn set_last_activity(&self, id: Uuid, at: DateTime<Utc>) {
        if let Some(mut user) = self.users.get_mut(&id) {
            user.set_last_activity(at);
        }
    }
}
