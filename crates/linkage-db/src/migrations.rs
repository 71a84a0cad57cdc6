//! Embedded schema migrations, executed on every open.

use crate::LinkDb;
use crate::error::DatabaseError;

/// Link table, audit table, and the partial unique indexes guarding the
/// active-link invariants.
const MIGRATION_001: &str = include_str!("../migrations/001_initial.sql");

impl LinkDb {
    pub(crate) async fn run_migrations(&self) -> Result<(), DatabaseError> {
        self.conn
            .execute_batch(MIGRATION_001)
            .await
            .map_err(|e| DatabaseError::Migration(format!("001_initial: {e}")))?;
        Ok(())
    }
}
