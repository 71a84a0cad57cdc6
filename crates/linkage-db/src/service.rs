//! Service layer orchestrating link mutations with audit and trail.
//!
//! `LinkService` wraps `LinkDb`, a `TrailWriter`, the acting identity and
//! the link rules. All repository methods are `impl LinkService` blocks.

use std::path::{Path, PathBuf};

use linkage_config::LinkageConfig;
use linkage_core::identity::AuthIdentity;
use linkage_engine::LinkRules;
use tokio::sync::{Mutex, MutexGuard};

use crate::LinkDb;
use crate::error::DatabaseError;
use crate::trail::writer::TrailWriter;

/// Every mutation follows the same protocol:
/// 1. Take the write lock
/// 2. Check the active-link invariants against current rows
/// 3. Execute SQL (multi-row changes inside a transaction)
/// 4. Append audit entries
/// 5. Append the JSONL trail operation
pub struct LinkService {
    db: LinkDb,
    trail: TrailWriter,
    identity: AuthIdentity,
    rules: LinkRules,
    /// One writer at a time on the shared connection, so a transaction
    /// never picks up statements from an unrelated mutation.
    write_lock: Mutex<()>,
}

impl LinkService {
    /// Open a local store.
    ///
    /// `trail_dir` of `None` disables trail writing.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or the trail
    /// directory cannot be created.
    pub async fn new_local(
        db_path: &str,
        trail_dir: Option<PathBuf>,
        identity: AuthIdentity,
        rules: LinkRules,
    ) -> Result<Self, DatabaseError> {
        let db = LinkDb::open_local(db_path).await?;
        let trail = match trail_dir {
            Some(dir) => TrailWriter::new(dir)?,
            None => TrailWriter::disabled(),
        };
        Ok(Self::from_db(db, trail, identity, rules))
    }

    /// Open the store described by `config.store`, with `config.links` rules.
    /// Relative paths resolve under `project_root`.
    ///
    /// # Errors
    ///
    /// See [`Self::new_local`].
    pub async fn from_config(
        config: &LinkageConfig,
        project_root: &Path,
        identity: AuthIdentity,
    ) -> Result<Self, DatabaseError> {
        let store = &config.store;
        let db_path = if store.is_in_memory() {
            store.db_path.clone()
        } else {
            let path = project_root.join(&store.db_path);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| DatabaseError::Other(e.into()))?;
            }
            path.to_string_lossy().into_owned()
        };
        let trail_dir = store
            .trail_enabled
            .then(|| project_root.join(&store.trail_dir));
        Self::new_local(&db_path, trail_dir, identity, LinkRules::from(&config.links)).await
    }

    #[must_use]
    pub fn from_db(
        db: LinkDb,
        trail: TrailWriter,
        identity: AuthIdentity,
        rules: LinkRules,
    ) -> Self {
        Self {
            db,
            trail,
            identity,
            rules,
            write_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub const fn db(&self) -> &LinkDb {
        &self.db
    }

    #[must_use]
    pub const fn trail(&self) -> &TrailWriter {
        &self.trail
    }

    #[must_use]
    pub const fn identity(&self) -> &AuthIdentity {
        &self.identity
    }

    #[must_use]
    pub const fn rules(&self) -> &LinkRules {
        &self.rules
    }

    /// User id recorded as `created_by`, `deleted_by` and audit actor.
    #[must_use]
    pub fn actor(&self) -> &str {
        &self.identity.user_id
    }

    pub(crate) async fn write_guard(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().await
    }
}
