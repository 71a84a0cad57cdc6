//! Result types returned by link operations.
//!
//! `BatchOutcome` turns the raw batch response into a discriminated state so
//! callers cannot mistake a partial success for a full success or failure.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::entities::EntityLink;
use crate::enums::{LinkSource, LinkType};
use crate::requests::{BatchCreateResponse, FailureDetail};

/// Outcome of a (possibly batched) link creation.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchOutcome {
    /// Nothing needed creating (every candidate was already linked).
    Unchanged,
    /// Every requested link was created.
    Created { links: Vec<EntityLink> },
    /// Some links were created and some failed.
    PartialSuccess {
        created: Vec<EntityLink>,
        failed: Vec<FailureDetail>,
    },
    /// No requested link was created.
    Failed { failed: Vec<FailureDetail> },
}

impl BatchOutcome {
    #[must_use]
    pub fn created_count(&self) -> usize {
        match self {
            Self::Unchanged | Self::Failed { .. } => 0,
            Self::Created { links } => links.len(),
            Self::PartialSuccess { created, .. } => created.len(),
        }
    }

    #[must_use]
    pub fn failed_count(&self) -> usize {
        match self {
            Self::Unchanged | Self::Created { .. } => 0,
            Self::PartialSuccess { failed, .. } | Self::Failed { failed } => failed.len(),
        }
    }

    /// Links that now exist in the store as a result of this operation.
    #[must_use]
    pub fn created(&self) -> &[EntityLink] {
        match self {
            Self::Created { links } => links,
            Self::PartialSuccess { created, .. } => created,
            Self::Unchanged | Self::Failed { .. } => &[],
        }
    }

    #[must_use]
    pub fn failures(&self) -> &[FailureDetail] {
        match self {
            Self::PartialSuccess { failed, .. } | Self::Failed { failed } => failed,
            Self::Unchanged | Self::Created { .. } => &[],
        }
    }

    /// One-line human summary with both counts.
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Self::Unchanged => "no new links".to_string(),
            Self::Created { links } => format!("{} linked", links.len()),
            Self::PartialSuccess { created, failed } => {
                format!("{} linked, {} failed", created.len(), failed.len())
            }
            Self::Failed { failed } => format!("0 linked, {} failed", failed.len()),
        }
    }
}

impl From<BatchCreateResponse> for BatchOutcome {
    fn from(resp: BatchCreateResponse) -> Self {
        match (resp.created_links.is_empty(), resp.failed_links.is_empty()) {
            (true, true) => Self::Unchanged,
            (false, true) => Self::Created {
                links: resp.created_links,
            },
            (false, false) => Self::PartialSuccess {
                created: resp.created_links,
                failed: resp.failed_links,
            },
            (true, false) => Self::Failed {
                failed: resp.failed_links,
            },
        }
    }
}

/// One intake found by a reverse lookup from an entity.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct LinkedIntake {
    pub intake_id: String,
    pub link_id: String,
    pub link_type: LinkType,
    pub source: LinkSource,
    pub confidence: Option<f64>,
    pub notes: Option<String>,
    pub link_order: u32,
    pub linked_by: String,
    pub linked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
    pub total_count: u64,
    pub total_pages: u64,
}

/// Page of a reverse lookup.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct LinkedIntakePage {
    pub intakes: Vec<LinkedIntake>,
    pub pagination: Pagination,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::EntityType;

    fn failure(index: usize) -> FailureDetail {
        FailureDetail {
            index,
            entity_type: EntityType::Topic,
            entity_id: format!("t{index}"),
            code: "DUPLICATE_LINK".into(),
            message: "already linked".into(),
        }
    }

    #[test]
    fn empty_response_is_unchanged() {
        let outcome = BatchOutcome::from(BatchCreateResponse::default());
        assert_eq!(outcome, BatchOutcome::Unchanged);
        assert_eq!(outcome.summary(), "no new links");
    }

    #[test]
    fn all_failed_is_failed_not_partial() {
        let outcome = BatchOutcome::from(BatchCreateResponse {
            created_links: vec![],
            failed_links: vec![failure(0), failure(1)],
        });
        assert!(matches!(outcome, BatchOutcome::Failed { .. }));
        assert_eq!(outcome.failed_count(), 2);
        assert_eq!(outcome.created_count(), 0);
        assert_eq!(outcome.summary(), "0 linked, 2 failed");
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let json = serde_json::to_value(BatchOutcome::Failed {
            failed: vec![failure(0)],
        })
        .unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["failed"][0]["code"], "DUPLICATE_LINK");
    }
}
