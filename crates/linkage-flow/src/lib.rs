//! # linkage-flow
//!
//! Caller-side orchestration of intake entity linking.
//!
//! - [`Linker`](linker::Linker): session gate, per-intake serialization,
//!   reconcile, optimistic projection with rollback, demotion-before-create
//! - [`LinkStore`](store::LinkStore): the store contract, implemented by
//!   `linkage_db::service::LinkService`
//! - [`SuggestionClient`](suggestions::SuggestionClient): AI suggestions
//!   over HTTP, abortable via [`SuggestionTask`](suggestions::SuggestionTask)
//! - [`RetryGate`](retry::RetryGate): capped, time-gated retries

pub mod error;
pub mod linker;
pub mod queue;
pub mod retry;
pub mod session;
pub mod store;
pub mod suggestions;

#[cfg(test)]
mod test_support;

pub use error::FlowError;
pub use linker::{LinkOutcome, Linker};
pub use session::Session;
pub use store::{LinkStore, StoreError};
