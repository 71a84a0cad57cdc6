use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{EntityType, LinkSource, LinkType};

/// A directed, typed association from one intake to one target entity.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct EntityLink {
    pub id: String,
    pub intake_id: String,
    pub entity_type: EntityType,
    pub entity_id: String,
    pub link_type: LinkType,
    #[serde(default)]
    pub source: LinkSource,
    pub confidence: Option<f64>,
    pub notes: Option<String>,
    pub link_order: u32,
    pub suggested_by: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by: Option<String>,
    #[serde(rename = "_version")]
    pub version: u32,
}

impl EntityLink {
    /// Active links are the ones without a soft-delete marker.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }

    #[must_use]
    pub fn is_primary(&self) -> bool {
        self.link_type == LinkType::Primary
    }

    #[must_use]
    pub fn target(&self) -> TargetKey {
        TargetKey::new(self.entity_type, &self.entity_id)
    }
}

/// `(entity_type, entity_id)`: what a link points at.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct TargetKey {
    pub entity_type: EntityType,
    pub entity_id: String,
}

impl TargetKey {
    #[must_use]
    pub fn new(entity_type: EntityType, entity_id: &str) -> Self {
        Self {
            entity_type,
            entity_id: entity_id.to_string(),
        }
    }
}

impl std::fmt::Display for TargetKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.entity_type, self.entity_id)
    }
}
