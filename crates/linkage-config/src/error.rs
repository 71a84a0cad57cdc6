//! Configuration error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// Figment extraction or merge error.
    #[error("failed to load linkage config: {0}")]
    Figment(#[from] figment::Error),

    /// A value that parsed but breaks a link rule.
    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}
