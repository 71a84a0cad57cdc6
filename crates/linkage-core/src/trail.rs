//! JSONL trail operation envelope.
//!
//! Every store mutation is recorded as a `TrailOperation` in per-intake
//! `{trail_dir}/{intake_id}.jsonl` files, giving an ordered, replayable log of
//! what happened to one intake's links.
//!
//! The `v` field supports schema versioning: trail lines without a `v` field
//! deserialize with `v == 1` via `#[serde(default)]`.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::TrailOp;

/// Default trail version for lines written before versioning.
const fn default_trail_version() -> u32 {
    1
}

/// A single operation recorded in the JSONL trail.
///
/// The `data` field contains the full link for `Create`, the applied patch
/// for `Update`, and the link orders for `Reorder`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct TrailOperation {
    /// Schema version. Defaults to 1 when absent.
    #[serde(default = "default_trail_version")]
    pub v: u32,

    /// RFC 3339 timestamp of the operation.
    pub ts: String,

    /// User id that performed the operation.
    pub actor: String,

    /// What kind of mutation this represents.
    pub op: TrailOp,

    /// Intake whose link list changed.
    pub intake: String,

    /// Id of the affected link (empty for whole-list operations).
    pub id: String,

    /// Operation payload. Schema depends on `op`.
    pub data: serde_json::Value,
}
