//! In-memory link store
//!
//! 三个索引（id / code / owner）放在同一把读写锁之下，
//! 读者永远不会看到只出现在部分索引中的链接。

use std::collections::{HashMap, HashSet};

use parking_lot::RwLock;
use tracing::trace;
use uuid::Uuid;

use crate::errors::{QuotalinkError, Result};
use crate::storage::models::Link;

#[derive(Default)]
struct Indexes {
    by_id: HashMap<Uuid, Link>,
    by_code: HashMap<String, Uuid>,
    by_owner: HashMap<Uuid, HashSet<Uuid>>,
}

impl Indexes {
    fn unlink(&mut self, link: &Link) {
        self.by_code.remove(link.code());
        if let Some(ids) = self.by_owner.get_mut(&link.owner()) {
            ids.remove(&link.id());
            if ids.is_empty() {
                self.by_owner.remove(&link.owner());
            }
        }
    }
}

/// Outcome of [`LinkStore::claim_code`].
#[derive(Debug, Clone)]
pub enum Claim {
    /// The current holder of the code was kept.
    Kept(Link),
    /// The new link was stored, displacing `replaced` if present.
    Inserted { link: Link, replaced: Option<Link> },
}

/// Volatile link storage indexed by id, short code and owner.
#[derive(Default)]
pub struct LinkStore {
    inner: RwLock<Indexes>,
}

impl LinkStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a link or replace the record with the same id.
    ///
    /// Fails with `AlreadyExists` if the short code is held by a different
    /// link; the store is left untouched in that case.
    pub fn put(&self, link: Link) -> Result<()> {
        let mut guard = self.inner.write();

        if let Some(holder) = guard.by_code.get(link.code())
            && *holder != link.id()
        {
            return Err(QuotalinkError::already_exists(format!(
                "Short code '{}' is already in use",
                link.code()
            )));
        }

        if let Some(previous) = guard.by_id.remove(&link.id()) {
            guard.unlink(&previous);
        }

        guard.by_code.insert(link.code().to_string(), link.id());
        guard
            .by_owner
            .entry(link.owner())
            .or_default()
            .insert(link.id());
        trace!("LinkStore: stored '{}' ({})", link.code(), link.id());
        guard.by_id.insert(link.id(), link);
        Ok(())
    }

    /// Store `link` under its short code unless the current holder of that
    /// code should be kept.
    ///
    /// If another link holds the code and `keep_existing` returns true for
    /// it, nothing changes and the holder is returned as [`Claim::Kept`].
    /// Otherwise the holder (if any) is dropped from every index and `link`
    /// takes its place. The decision and the swap happen under one lock.
    pub fn claim_code<F>(&self, link: Link, keep_existing: F) -> Claim
    where
        F: FnOnce(&Link) -> bool,
    {
        let mut guard = self.inner.write();

        let holder_id = guard.by_code.get(link.code()).copied();
        let replaced = match holder_id.and_then(|id| guard.by_id.get(&id)) {
            Some(holder) if keep_existing(holder) => return Claim::Kept(holder.clone()),
            Some(_) => holder_id.and_then(|id| guard.by_id.remove(&id)),
            None => None,
        };
        if let Some(old) = &replaced {
            guard.unlink(old);
        }

        guard.by_code.insert(link.code().to_string(), link.id());
        guard
            .by_owner
            .entry(link.owner())
            .or_default()
            .insert(link.id());
        guard.by_id.insert(link.id(), link.clone());
        Claim::Inserted { link, replaced }
    }

    pub fn get(&self, id: Uuid) -> Option<Link> {
        self.inner.read().by_id.get(&id).cloned()
    }

    pub fn find_by_code(&self, code: &str) -> Option<Link> {
        let guard = self.inner.read();
        guard
            .by_code
            .get(code)
            .and_then(|id| guard.by_id.get(id))
            .cloned()
    }

    /// All links of `owner`, in no particular order.
    pub fn find_by_owner(&self, owner: Uuid) -> Vec<Link> {
        let guard = self.inner.read();
        guard
            .by_owner
            .get(&owner)
            .map(|ids| ids.iter().filter_map(|id| guard.by_id.get(id)).cloned().collect())
            .unwrap_or_default()
    }

    /// Remove a link from every index. Unknown ids are ignored.
    pub fn remove(&self, id: Uuid) -> Option<Link> {
        let mut guard = self.inner.write();
        let removed = guard.by_id.remove(&id)?;
        guard.unlink(&removed);
        trace!("LinkStore: removed '{}' ({})", removed.code(), id);
        Some(removed)
    }

    /// Apply `f` to the stored record under the write lock.
    ///
    /// The read-modify-write is atomic with respect to every other store
    /// operation. Returns `None` if the id is unknown.
    pub fn update<F, R>(&self, id: Uuid, f: F) -> Option<R>
    where
        F: FnOnce(&mut Link) -> R,
    {
        let mut guard = self.inner.write();
        guard.by_id.get_mut(&id).map(f)
    }

    /// Same as [`LinkStore::update`], addressed by short code.
    pub fn update_by_code<F, R>(&self, code: &str, f: F) -> Option<R>
    where
        F: FnOnce(&mut Link) -> R,
    {
        let mut guard = self.inner.write();
        let id = *guard.by_code.get(code)?;
        guard.by_id.get_mut(&id).map(f)
    }

    /// Snapshot of every stored link.
    pub fn all(&self) -> Vec<Link> {
        self.inner.read().by_id.values().cloned().collect()
    }

    pub fn count(&self) -> usize {
        self.inner.read().by_id.len()
    }

    pub fn contains_code(&self, code: &str) -> bool {
        self.inner.read().by_code.contains_key(code)
    }
}
