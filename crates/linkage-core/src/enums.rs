//! Entity types, link types, sources, and actions for intake links.
//!
//! All enums use `snake_case` serialization via `#[serde(rename_all = "snake_case")]`.
//! The string forms double as the SQL storage representation.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::CoreError;

// ---------------------------------------------------------------------------
// EntityType
// ---------------------------------------------------------------------------

/// Kind of entity an intake can be linked to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Dossier,
    Position,
    Mou,
    Engagement,
    Assignment,
    Commitment,
    IntelligenceSignal,
    Organization,
    Country,
    Forum,
    WorkingGroup,
    Topic,
}

impl EntityType {
    /// Every linkable entity type, in declaration order.
    pub const ALL: [Self; 12] = [
        Self::Dossier,
        Self::Position,
        Self::Mou,
        Self::Engagement,
        Self::Assignment,
        Self::Commitment,
        Self::IntelligenceSignal,
        Self::Organization,
        Self::Country,
        Self::Forum,
        Self::WorkingGroup,
        Self::Topic,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dossier => "dossier",
            Self::Position => "position",
            Self::Mou => "mou",
            Self::Engagement => "engagement",
            Self::Assignment => "assignment",
            Self::Commitment => "commitment",
            Self::IntelligenceSignal => "intelligence_signal",
            Self::Organization => "organization",
            Self::Country => "country",
            Self::Forum => "forum",
            Self::WorkingGroup => "working_group",
            Self::Topic => "topic",
        }
    }

    /// Parse the wire/storage form. Unknown values are rejected, never defaulted.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidEntityType` if `s` is not one of the twelve
    /// known entity types.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| CoreError::InvalidEntityType(s.to_string()))
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EntityType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// ---------------------------------------------------------------------------
// LinkType
// ---------------------------------------------------------------------------

/// Role an entity plays relative to an intake.
///
/// At most one active `Primary` and one active `AssignedTo` link may exist
/// per intake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum LinkType {
    Primary,
    Related,
    Requested,
    Mentioned,
    AssignedTo,
}

impl LinkType {
    pub const ALL: [Self; 5] = [
        Self::Primary,
        Self::Related,
        Self::Requested,
        Self::Mentioned,
        Self::AssignedTo,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Related => "related",
            Self::Requested => "requested",
            Self::Mentioned => "mentioned",
            Self::AssignedTo => "assigned_to",
        }
    }

    /// Parse the wire/storage form.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidLinkType` for unknown values.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| CoreError::InvalidLinkType(s.to_string()))
    }

    /// Entity types this link type may target. `None` means any type.
    ///
    /// `Primary` is not restricted here; auto-promotion eligibility is a
    /// separate, configurable rule.
    #[must_use]
    pub const fn allowed_entity_types(self) -> Option<&'static [EntityType]> {
        match self {
            Self::Requested => Some(&[
                EntityType::Position,
                EntityType::Mou,
                EntityType::Engagement,
            ]),
            Self::AssignedTo => Some(&[EntityType::Assignment]),
            Self::Primary | Self::Related | Self::Mentioned => None,
        }
    }

    /// Whether this link type may target `entity_type`.
    #[must_use]
    pub fn allows(self, entity_type: EntityType) -> bool {
        self.allowed_entity_types()
            .is_none_or(|allowed| allowed.contains(&entity_type))
    }

    /// Link types limited to a single active link per intake.
    #[must_use]
    pub const fn is_singular(self) -> bool {
        matches!(self, Self::Primary | Self::AssignedTo)
    }
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LinkType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// ---------------------------------------------------------------------------
// LinkSource
// ---------------------------------------------------------------------------

/// Who proposed a link.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum LinkSource {
    #[default]
    Human,
    Ai,
}

impl LinkSource {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Human => "human",
            Self::Ai => "ai",
        }
    }
}

impl fmt::Display for LinkSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// RestorePlacement
// ---------------------------------------------------------------------------

/// Where a restored link re-enters the active ordering.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum RestorePlacement {
    /// After the last active link.
    #[default]
    Append,
    /// Back at the `link_order` it had when deleted (clamped to the end),
    /// shifting later links down by one.
    ReclaimSlot,
}

impl RestorePlacement {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Append => "append",
            Self::ReclaimSlot => "reclaim_slot",
        }
    }

    /// 1-based position a restored link takes in an active list of
    /// `active_len` links, given the order it held when it was deleted.
    #[must_use]
    pub fn position(self, previous_order: u32, active_len: usize) -> u32 {
        let append_at = u32::try_from(active_len).unwrap_or(u32::MAX - 1) + 1;
        match self {
            Self::Append => append_at,
            Self::ReclaimSlot => previous_order.clamp(1, append_at),
        }
    }
}

impl fmt::Display for RestorePlacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// AuditAction
// ---------------------------------------------------------------------------

/// Type of action recorded in the link audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Created,
    Updated,
    Deleted,
    Restored,
    Reordered,
    Promoted,
    Demoted,
}

impl AuditAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
            Self::Restored => "restored",
            Self::Reordered => "reordered",
            Self::Promoted => "promoted",
            Self::Demoted => "demoted",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// TrailOp
// ---------------------------------------------------------------------------

/// Operation type recorded in JSONL trail files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TrailOp {
    Create,
    Update,
    Delete,
    Restore,
    Reorder,
}

impl TrailOp {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Restore => "restore",
            Self::Reorder => "reorder",
        }
    }
}

impl fmt::Display for TrailOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! test_serde_roundtrip {
        ($name:ident, $ty:ty, $variant:expr, $expected_str:expr) => {
            #[test]
            fn $name() {
                let val = $variant;
                let json = serde_json::to_string(&val).unwrap();
                assert_eq!(json, format!("\"{}\"", $expected_str));
                let recovered: $ty = serde_json::from_str(&json).unwrap();
                assert_eq!(recovered, val);
            }
        };
    }

    test_serde_roundtrip!(
        entity_type_intelligence_signal,
        EntityType,
        EntityType::IntelligenceSignal,
        "intelligence_signal"
    );
    test_serde_roundtrip!(
        entity_type_working_group,
        EntityType,
        EntityType::WorkingGroup,
        "working_group"
    );
    test_serde_roundtrip!(entity_type_mou, EntityType, EntityType::Mou, "mou");
    test_serde_roundtrip!(
        link_type_assigned_to,
        LinkType,
        LinkType::AssignedTo,
        "assigned_to"
    );
    test_serde_roundtrip!(link_type_primary, LinkType, LinkType::Primary, "primary");
    test_serde_roundtrip!(link_source_ai, LinkSource, LinkSource::Ai, "ai");
    test_serde_roundtrip!(
        audit_demoted,
        AuditAction,
        AuditAction::Demoted,
        "demoted"
    );
    test_serde_roundtrip!(trail_reorder, TrailOp, TrailOp::Reorder, "reorder");

    #[test]
    fn as_str_matches_serde_for_every_entity_type() {
        for t in EntityType::ALL {
            let json = serde_json::to_string(&t).unwrap();
            assert_eq!(json, format!("\"{}\"", t.as_str()));
            assert_eq!(EntityType::parse(t.as_str()).unwrap(), t);
        }
    }

    #[test]
    fn as_str_matches_serde_for_every_link_type() {
        for t in LinkType::ALL {
            let json = serde_json::to_string(&t).unwrap();
            assert_eq!(json, format!("\"{}\"", t.as_str()));
            assert_eq!(t.to_string(), t.as_str());
        }
    }

    #[test]
    fn unknown_entity_type_is_rejected() {
        let err = EntityType::parse("spaceship").unwrap_err();
        assert!(matches!(err, CoreError::InvalidEntityType(ref s) if s == "spaceship"));
        assert!("Dossier".parse::<EntityType>().is_err());
    }

    #[test]
    fn unknown_link_type_is_rejected() {
        assert!(matches!(
            LinkType::parse("owner"),
            Err(CoreError::InvalidLinkType(_))
        ));
    }

    #[test]
    fn requested_only_targets_deliverables() {
        assert!(LinkType::Requested.allows(EntityType::Position));
        assert!(LinkType::Requested.allows(EntityType::Mou));
        assert!(LinkType::Requested.allows(EntityType::Engagement));
        assert!(!LinkType::Requested.allows(EntityType::Dossier));
    }

    #[test]
    fn assigned_to_only_targets_assignments() {
        assert!(LinkType::AssignedTo.allows(EntityType::Assignment));
        assert!(!LinkType::AssignedTo.allows(EntityType::Topic));
    }

    #[test]
    fn unrestricted_link_types_allow_everything() {
        for t in EntityType::ALL {
            assert!(LinkType::Related.allows(t));
            assert!(LinkType::Mentioned.allows(t));
            assert!(LinkType::Primary.allows(t));
        }
    }

    #[test]
    fn restore_append_goes_after_last_active() {
        assert_eq!(RestorePlacement::Append.position(1, 4), 5);
        assert_eq!(RestorePlacement::Append.position(9, 0), 1);
    }

    #[test]
    fn restore_reclaim_keeps_slot_within_bounds() {
        assert_eq!(RestorePlacement::ReclaimSlot.position(2, 4), 2);
        assert_eq!(RestorePlacement::ReclaimSlot.position(7, 3), 4);
        assert_eq!(RestorePlacement::ReclaimSlot.position(0, 3), 1);
    }

    #[test]
    fn singular_link_types() {
        assert!(LinkType::Primary.is_singular());
        assert!(LinkType::AssignedTo.is_singular());
        assert!(!LinkType::Related.is_singular());
    }
}
