//! Cross-cutting error types for linkage.
//!
//! This module defines errors that can originate from any crate in the system.
//! Domain-specific errors (e.g., `DatabaseError`, `EngineError`) are defined in
//! their respective crates and wrap or convert from `CoreError`.

use thiserror::Error;

/// Errors that can be raised by any linkage crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Entity lookup returned no result.
    #[error("Entity not found: {entity_type} {id}")]
    NotFound { entity_type: String, id: String },

    /// An entity type outside the fixed enumeration was supplied.
    #[error("Invalid entity type: '{0}'")]
    InvalidEntityType(String),

    /// A link type outside the fixed enumeration was supplied.
    #[error("Invalid link type: '{0}'")]
    InvalidLinkType(String),

    /// Data failed validation (format, constraints).
    #[error("Validation error: {0}")]
    Validation(String),

    /// A remote payload did not match any accepted shape.
    #[error("Invalid response shape: {0}")]
    InvalidResponseShape(String),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
