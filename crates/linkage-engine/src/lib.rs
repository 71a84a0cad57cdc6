//! # linkage-engine
//!
//! Pure algorithms behind intake entity linking. Nothing here performs I/O.
//!
//! - [`reconcile`](reconcile::reconcile): turn a selection into demotion,
//!   promotion, and create operations that keep at most one active primary.
//! - [`project`](projector::project) and [`LinkCache`](cache::LinkCache):
//!   optimistic views with snapshot rollback and invalidation.
//! - [`reorder`](reorder::reorder): drag-and-drop moves with dense renumbering.
//! - [`LinkRules`](rules::LinkRules): link-type restrictions and payload limits.

pub mod cache;
pub mod error;
pub mod projector;
pub mod reconcile;
pub mod reorder;
pub mod rules;

#[cfg(test)]
mod test_support;

pub use cache::{CacheEntry, CacheKey, LinkCache, Snapshot};
pub use error::EngineError;
pub use projector::{PendingOp, ProjectionContext, project};
pub use reconcile::{CandidateInput, LinkTypeChange, ReconcilePlan, reconcile};
pub use reorder::{ReorderOutcome, renumber, reorder};
pub use rules::LinkRules;
