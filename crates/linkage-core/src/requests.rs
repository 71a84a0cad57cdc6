//! Request/response contracts of the link store API.
//!
//! These are the shapes exchanged between the caller-side flow and the Link
//! Store. Every payload is `snake_case` JSON; the optimistic-concurrency
//! counter keeps its `_version` wire name.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::entities::EntityLink;
use crate::enums::{EntityType, LinkSource, LinkType};

/// Create one link for an intake.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct CreateLinkRequest {
    pub entity_type: EntityType,
    pub entity_id: String,
    pub link_type: LinkType,
    pub notes: Option<String>,
    #[serde(default)]
    pub source: LinkSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_by: Option<String>,
    /// Explicit position; the store appends after the current maximum when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_order: Option<u32>,
}

impl CreateLinkRequest {
    /// A human-sourced request with no notes and store-assigned ordering.
    #[must_use]
    pub fn new(entity_type: EntityType, entity_id: &str, link_type: LinkType) -> Self {
        Self {
            entity_type,
            entity_id: entity_id.to_string(),
            link_type,
            notes: None,
            source: LinkSource::Human,
            confidence: None,
            suggested_by: None,
            link_order: None,
        }
    }
}

/// Create several links in one call. Partial success is a normal outcome.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct BatchCreateRequest {
    pub links: Vec<CreateLinkRequest>,
}

/// Why a single item of a batch was not created.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct FailureDetail {
    /// Position of the item in the request's `links` array.
    pub index: usize,
    pub entity_type: EntityType,
    pub entity_id: String,
    /// Machine-readable reason, e.g. `DUPLICATE_PRIMARY_LINK`.
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct BatchCreateResponse {
    pub created_links: Vec<EntityLink>,
    pub failed_links: Vec<FailureDetail>,
}

/// Partial update of one link, guarded by the caller's view of `_version`.
///
/// Only `Some` fields are applied. `notes: Some(None)` clears the notes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LinkPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_type: Option<LinkType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<Option<String>>,
    #[serde(rename = "_version")]
    pub expected_version: u32,
}

impl LinkPatch {
    /// Patch changing only the link type.
    #[must_use]
    pub fn link_type(link_type: LinkType, expected_version: u32) -> Self {
        Self {
            link_type: Some(link_type),
            notes: None,
            expected_version,
        }
    }

    /// Patch changing only the notes.
    #[must_use]
    pub fn notes(notes: Option<String>, expected_version: u32) -> Self {
        Self {
            link_type: None,
            notes: Some(notes),
            expected_version,
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.link_type.is_none() && self.notes.is_none()
    }
}

/// One persist instruction of a reorder.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
pub struct LinkOrder {
    pub link_id: String,
    pub link_order: u32,
}

/// Full renumbering of an intake's active links.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ReorderRequest {
    pub link_orders: Vec<LinkOrder>,
}

/// Ask the suggestion service for ranked link candidates.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct SuggestionRequest {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entity_types: Vec<EntityType>,
    pub max_suggestions: u32,
}

/// Accept one suggestion; maps onto the regular creation path.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct AcceptSuggestionRequest {
    pub suggestion_id: String,
    pub entity_id: String,
    pub entity_type: EntityType,
    pub link_type: LinkType,
}
