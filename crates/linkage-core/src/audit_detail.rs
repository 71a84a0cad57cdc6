//! Typed audit detail payloads.
//!
//! Each audit action can carry a structured `detail` JSON blob. These types
//! provide schema validation for the most common detail shapes.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Detail for `AuditAction::Created` and `AuditAction::Deleted`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct LinkedDetail {
    pub entity_type: String,
    pub entity_id: String,
    pub link_type: String,
}

/// Detail for `AuditAction::Promoted` and `AuditAction::Demoted`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct LinkTypeChangedDetail {
    pub from: String,
    pub to: String,
}

/// Detail for `AuditAction::Reordered` and `AuditAction::Restored`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ReorderedDetail {
    pub from: u32,
    pub to: u32,
}
