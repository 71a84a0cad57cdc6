//! Entity structs for intake linking.
//!
//! `EntityLink` and `AuditEntry` map to tables in the libSQL store; `LinkSuggestion`
//! is the validated shape of an AI suggestion. All structs derive `Serialize`,
//! `Deserialize`, and `JsonSchema` for JSON roundtrip and schema validation.

mod audit;
mod link;
mod suggestion;

pub use audit::AuditEntry;
pub use link::{EntityLink, TargetKey};
pub use suggestion::LinkSuggestion;
