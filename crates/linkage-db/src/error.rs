//! Database error types for linkage-db.

use linkage_engine::EngineError;
use thiserror::Error;

/// Codes reported in `FailureDetail::code` and by the CLI.
pub mod codes {
    pub const DUPLICATE_PRIMARY_LINK: &str = "DUPLICATE_PRIMARY_LINK";
    pub const DUPLICATE_LINK: &str = "DUPLICATE_LINK";
    pub const DUPLICATE_ASSIGNED_LINK: &str = "DUPLICATE_ASSIGNED_LINK";
    pub const VERSION_CONFLICT: &str = "VERSION_CONFLICT";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const INVALID_STATE: &str = "INVALID_STATE";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    /// Expected a result row but none was returned.
    #[error("No result returned")]
    NoResult,

    /// The operation does not apply to the row in its current state.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Rejected before touching the database.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The write would break an active-link invariant.
    #[error("Conflict ({code}): {message}")]
    Conflict { code: &'static str, message: String },

    /// The caller's `_version` is not the stored one.
    #[error("Version conflict on link {link_id}: expected {expected}, found {actual}")]
    VersionConflict {
        link_id: String,
        expected: u32,
        actual: u32,
    },

    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DatabaseError {
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Conflict { code, .. } => *code,
            Self::VersionConflict { .. } => codes::VERSION_CONFLICT,
            Self::Validation(_) => codes::VALIDATION_ERROR,
            Self::NotFound { .. } => codes::NOT_FOUND,
            Self::InvalidState(_) => codes::INVALID_STATE,
            Self::Query(_)
            | Self::Migration(_)
            | Self::NoResult
            | Self::LibSql(_)
            | Self::Other(_) => codes::INTERNAL_ERROR,
        }
    }

    /// Errors scoped to one item of a batch, reported as a failed link
    /// instead of aborting the batch.
    #[must_use]
    pub const fn is_item_failure(&self) -> bool {
        matches!(self, Self::Conflict { .. } | Self::Validation(_))
    }

    pub(crate) fn conflict(code: &'static str, message: impl Into<String>) -> Self {
        Self::Conflict {
            code,
            message: message.into(),
        }
    }
}

impl From<EngineError> for DatabaseError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::NotFound(id) => Self::NotFound { entity: "link", id },
            EngineError::InvalidEntityType(_) | EngineError::Validation(_) => {
                Self::Validation(err.to_string())
            }
        }
    }
}

/// Map a UNIQUE index violation that slipped past the pre-checks (a
/// concurrent writer) onto a conflict. Other errors pass through.
pub(crate) fn map_unique(err: libsql::Error) -> DatabaseError {
    let text = err.to_string();
    if !text.contains("UNIQUE constraint failed") {
        return DatabaseError::LibSql(err);
    }
    // Target index violations name entity_id; the singular-type indexes only
    // name intake_id and the primary index is the one reached in practice.
    let code = if text.contains("entity_id") {
        codes::DUPLICATE_LINK
    } else {
        codes::DUPLICATE_PRIMARY_LINK
    };
    DatabaseError::conflict(code, text)
}
