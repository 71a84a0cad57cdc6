use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{EntityType, LinkType};

/// A ranked AI link suggestion, validated at the response boundary.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct LinkSuggestion {
    pub suggestion_id: String,
    pub entity_id: String,
    pub entity_type: EntityType,
    pub entity_name: Option<String>,
    pub suggested_link_type: LinkType,
    /// In `0.0..=1.0`.
    pub confidence_score: f64,
    pub reasoning: String,
    /// 1-based position in the ranked list.
    pub rank: u32,
}
