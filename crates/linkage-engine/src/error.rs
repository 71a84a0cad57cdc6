use linkage_core::errors::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid entity type: '{0}'")]
    InvalidEntityType(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// A link id named by an operation is not in the list it operates on.
    #[error("Link not found: {0}")]
    NotFound(String),
}

impl From<CoreError> for EngineError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidEntityType(value) => Self::InvalidEntityType(value),
            CoreError::NotFound { id, .. } => Self::NotFound(id),
            other => Self::Validation(other.to_string()),
        }
    }
}
