use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::AuditAction;

/// An append-only audit trail entry recording a link mutation.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct AuditEntry {
    pub id: String,
    pub intake_id: String,
    pub link_id: String,
    pub action: AuditAction,
    pub actor: String,
    pub detail: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}
