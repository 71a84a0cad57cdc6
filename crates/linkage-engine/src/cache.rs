//! Per-view link cache with optimistic apply, rollback, and invalidation.
//!
//! Entries are keyed by intake and whether soft-deleted rows are included.
//! Every write bumps a cache-wide generation so a rollback can tell whether
//! its snapshot is still the latest thing written to that key.

use std::collections::HashMap;

use linkage_core::entities::EntityLink;

use crate::error::EngineError;
use crate::projector::{PendingOp, ProjectionContext, project};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub intake_id: String,
    pub include_deleted: bool,
}

impl CacheKey {
    pub fn active(intake_id: impl Into<String>) -> Self {
        Self {
            intake_id: intake_id.into(),
            include_deleted: false,
        }
    }

    pub fn with_deleted(intake_id: impl Into<String>) -> Self {
        Self {
            intake_id: intake_id.into(),
            include_deleted: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub links: Vec<EntityLink>,
    pub generation: u64,
    /// Set by invalidation; the next read should refetch.
    pub stale: bool,
    /// Whether `links` holds an optimistic projection rather than store data.
    pub optimistic: bool,
}

/// State of a key before an optimistic apply.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "a snapshot is needed to roll back a failed mutation"]
pub struct Snapshot {
    key: CacheKey,
    previous: Option<CacheEntry>,
    applied_generation: u64,
}

impl Snapshot {
    #[must_use]
    pub const fn key(&self) -> &CacheKey {
        &self.key
    }

    /// Links visible before the apply, if the key was populated.
    #[must_use]
    pub fn previous_links(&self) -> Option<&[EntityLink]> {
        self.previous.as_ref().map(|e| e.links.as_slice())
    }
}

#[derive(Debug, Default)]
pub struct LinkCache {
    entries: HashMap<CacheKey, CacheEntry>,
    generation: u64,
}

impl LinkCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, key: &CacheKey) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    /// Links for `key` when present and not stale.
    #[must_use]
    pub fn fresh(&self, key: &CacheKey) -> Option<&[EntityLink]> {
        self.entries
            .get(key)
            .filter(|e| !e.stale)
            .map(|e| e.links.as_slice())
    }

    const fn bump(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Store authoritative links. Returns the new generation.
    pub fn put(&mut self, key: CacheKey, links: Vec<EntityLink>) -> u64 {
        let generation = self.bump();
        self.entries.insert(
            key,
            CacheEntry {
                links,
                generation,
                stale: false,
                optimistic: false,
            },
        );
        generation
    }

    /// Replace the entry for `key` with the projection of `op`.
    ///
    /// An absent key projects onto an empty list.
    ///
    /// # Errors
    ///
    /// Propagates projection errors; the cache is unchanged on error.
    pub fn apply(
        &mut self,
        key: &CacheKey,
        op: &PendingOp,
        ctx: &ProjectionContext,
    ) -> Result<Snapshot, EngineError> {
        let previous = self.entries.get(key).cloned();
        let base = previous.as_ref().map_or(&[][..], |e| e.links.as_slice());
        let links = project(base, op, ctx)?;

        let generation = self.bump();
        self.entries.insert(
            key.clone(),
            CacheEntry {
                links,
                generation,
                stale: false,
                optimistic: true,
            },
        );
        Ok(Snapshot {
            key: key.clone(),
            previous,
            applied_generation: generation,
        })
    }

    /// Restore the state captured by `snapshot`.
    ///
    /// Returns `false` and leaves the entry alone if something wrote to the
    /// key after the snapshot was taken.
    pub fn rollback(&mut self, snapshot: Snapshot) -> bool {
        let current = self.entries.get(&snapshot.key).map(|e| e.generation);
        if current != Some(snapshot.applied_generation) {
            return false;
        }
        match snapshot.previous {
            Some(entry) => {
                self.entries.insert(snapshot.key, entry);
            }
            None => {
                self.entries.remove(&snapshot.key);
            }
        }
        true
    }

    /// Mark one key stale. Returns whether the key existed.
    pub fn invalidate(&mut self, key: &CacheKey) -> bool {
        self.entries.get_mut(key).is_some_and(|entry| {
            entry.stale = true;
            true
        })
    }

    /// Mark every key of an intake stale. Returns how many were marked.
    pub fn invalidate_intake(&mut self, intake_id: &str) -> usize {
        let mut marked = 0;
        for (key, entry) in &mut self.entries {
            if key.intake_id == intake_id {
                entry.stale = true;
                marked += 1;
            }
        }
        marked
    }
}
