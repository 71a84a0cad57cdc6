use linkage_core::errors::CoreError;
use linkage_core::suggestions::Fallback;
use linkage_engine::EngineError;
use thiserror::Error;

use crate::store::StoreError;
use crate::suggestions::SuggestionError;

/// Errors surfaced by linking operations.
///
/// A batch where some items fail is not an error; it is reported through
/// `BatchOutcome::PartialSuccess`.
#[derive(Debug, Error)]
pub enum FlowError {
    /// Rejected before any store call.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid entity type: '{0}'")]
    InvalidEntityType(String),

    /// The store refused the write because of a concurrent change. Refetch
    /// and reconcile again.
    #[error("Conflict ({code}): {message}")]
    Conflict { code: String, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    /// A primary replacement failed after `demoted` lost primary status, and
    /// making it primary again failed as well. The intake has no primary.
    #[error("Primary replacement failed and {demoted} could not be restored: {cause}")]
    PrimaryNotRestored {
        demoted: String,
        #[source]
        cause: Box<FlowError>,
    },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Not authenticated: {0}")]
    Unauthenticated(String),

    /// Suggestions cannot be produced right now. Offer `fallback` instead of
    /// retrying in a loop.
    #[error("Suggestion service unavailable: {message}")]
    ServiceUnavailable {
        message: String,
        retry_after: Option<u64>,
        fallback: Fallback,
    },

    #[error("Retry not allowed: {0}")]
    RetryBlocked(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Invalid response shape: {0}")]
    InvalidResponseShape(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Suggestion request failed: {0}")]
    Suggestion(String),
}

impl FlowError {
    /// Whether the caller should refetch and possibly retry.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

impl From<EngineError> for FlowError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::InvalidEntityType(value) => Self::InvalidEntityType(value),
            EngineError::Validation(msg) => Self::Validation(msg),
            EngineError::NotFound(id) => Self::NotFound(id),
        }
    }
}

impl From<CoreError> for FlowError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidResponseShape(msg) => Self::InvalidResponseShape(msg),
            CoreError::InvalidEntityType(value) => Self::InvalidEntityType(value),
            CoreError::NotFound { id, .. } => Self::NotFound(id),
            other => Self::Validation(other.to_string()),
        }
    }
}

impl From<StoreError> for FlowError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { code, message } => Self::Conflict { code, message },
            StoreError::Validation(msg) => Self::Validation(msg),
            StoreError::NotFound(id) => Self::NotFound(id),
            StoreError::InvalidState(msg) => Self::InvalidState(msg),
            StoreError::Internal(msg) => Self::Store(msg),
        }
    }
}

impl From<SuggestionError> for FlowError {
    fn from(err: SuggestionError) -> Self {
        match err {
            SuggestionError::Unavailable {
                message,
                retry_after,
                fallback,
                ..
            } => Self::ServiceUnavailable {
                message,
                retry_after,
                fallback,
            },
            SuggestionError::InvalidResponseShape(msg) => Self::InvalidResponseShape(msg),
            SuggestionError::Cancelled => Self::Cancelled,
            SuggestionError::Unauthenticated(msg) => Self::Unauthenticated(msg),
            other => Self::Suggestion(other.to_string()),
        }
    }
}
