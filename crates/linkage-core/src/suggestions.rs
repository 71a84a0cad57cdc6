//! Boundary parsing for AI suggestion responses.
//!
//! The suggestion service answers with one of two JSON shapes, distinguished
//! by the boolean `success` field:
//!
//! ```text
//! { "success": true,  "suggestions": [...], "metadata": {...}? }
//! { "success": false, "error": { "code", "message", "retry_after"?, "fallback"? } }
//! ```
//!
//! Anything else is rejected with `CoreError::InvalidResponseShape` so that a
//! malformed payload never travels further than this module.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::entities::LinkSuggestion;
use crate::enums::{EntityType, LinkType};
use crate::errors::CoreError;

/// What the caller should offer the user when suggestions are unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Fallback {
    ManualSearch,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SuggestionMetadata {
    pub generated_at: Option<String>,
    pub ai_service: Option<String>,
    #[serde(default)]
    pub cache_hit: bool,
    pub total_suggestions: Option<u32>,
}

/// A validated suggestion response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SuggestionPayload {
    /// Ranked suggestions, sorted by `rank` ascending.
    Suggestions {
        suggestions: Vec<LinkSuggestion>,
        metadata: Option<SuggestionMetadata>,
    },
    /// The service declined to answer (rate limited, AI backend down, ...).
    Unavailable {
        code: String,
        message: String,
        retry_after: Option<u64>,
        fallback: Option<Fallback>,
    },
}

#[derive(Deserialize)]
struct RawSuccess {
    suggestions: Vec<RawSuggestion>,
    #[serde(default)]
    metadata: Option<SuggestionMetadata>,
}

#[derive(Deserialize)]
struct RawFailure {
    error: RawError,
}

#[derive(Deserialize)]
struct RawError {
    code: String,
    message: String,
    #[serde(default)]
    retry_after: Option<u64>,
    #[serde(default)]
    fallback: Option<Fallback>,
}

#[derive(Deserialize)]
struct RawSuggestion {
    suggestion_id: String,
    entity_id: String,
    entity_type: String,
    #[serde(default)]
    entity_name: Option<String>,
    suggested_link_type: String,
    confidence_score: f64,
    #[serde(default)]
    reasoning: String,
    rank: u32,
}

fn shape_error(msg: impl Into<String>) -> CoreError {
    CoreError::InvalidResponseShape(msg.into())
}

impl RawSuggestion {
    fn validate(self, position: usize) -> Result<LinkSuggestion, CoreError> {
        if self.suggestion_id.trim().is_empty() || self.entity_id.trim().is_empty() {
            return Err(shape_error(format!(
                "suggestion #{position}: empty suggestion_id or entity_id"
            )));
        }
        let entity_type = EntityType::parse(&self.entity_type).map_err(|_| {
            shape_error(format!(
                "suggestion #{position}: unknown entity_type '{}'",
                self.entity_type
            ))
        })?;
        let suggested_link_type = LinkType::parse(&self.suggested_link_type).map_err(|_| {
            shape_error(format!(
                "suggestion #{position}: unknown suggested_link_type '{}'",
                self.suggested_link_type
            ))
        })?;
        if !(0.0..=1.0).contains(&self.confidence_score) {
            return Err(shape_error(format!(
                "suggestion #{position}: confidence_score {} outside 0..=1",
                self.confidence_score
            )));
        }
        if self.rank == 0 {
            return Err(shape_error(format!("suggestion #{position}: rank must be >= 1")));
        }
        Ok(LinkSuggestion {
            suggestion_id: self.suggestion_id,
            entity_id: self.entity_id,
            entity_type,
            entity_name: self.entity_name,
            suggested_link_type,
            confidence_score: self.confidence_score,
            reasoning: self.reasoning,
            rank: self.rank,
        })
    }
}

/// Validate a suggestion service response body.
///
/// # Errors
///
/// Returns `CoreError::InvalidResponseShape` when `success` is missing or not a
/// boolean, when the body for the given `success` value does not deserialize,
/// or when a suggestion carries unknown types, an out-of-range confidence,
/// a zero rank, or a rank already used by another suggestion.
pub fn parse_suggestion_payload(body: &serde_json::Value) -> Result<SuggestionPayload, CoreError> {
    let success = body
        .get("success")
        .and_then(serde_json::Value::as_bool)
        .ok_or_else(|| shape_error("missing boolean 'success' field"))?;

    if !success {
        let raw: RawFailure = serde_json::from_value(body.clone())
            .map_err(|e| shape_error(format!("error payload: {e}")))?;
        return Ok(SuggestionPayload::Unavailable {
            code: raw.error.code,
            message: raw.error.message,
            retry_after: raw.error.retry_after,
            fallback: raw.error.fallback,
        });
    }

    let raw: RawSuccess = serde_json::from_value(body.clone())
        .map_err(|e| shape_error(format!("suggestions payload: {e}")))?;

    let mut suggestions = raw
        .suggestions
        .into_iter()
        .enumerate()
        .map(|(i, s)| s.validate(i))
        .collect::<Result<Vec<_>, _>>()?;
    suggestions.sort_by_key(|s| s.rank);

    if let Some(pair) = suggestions.windows(2).find(|w| w[0].rank == w[1].rank) {
        return Err(shape_error(format!("duplicate rank {}", pair[0].rank)));
    }

    Ok(SuggestionPayload::Suggestions {
        suggestions,
        metadata: raw.metadata,
    })
}
