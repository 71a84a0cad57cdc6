//! Resolve a user's entity selection into invariant-respecting link operations.
//!
//! [`reconcile`] is pure: it reads the selection, the confirmation flag and the
//! intake's current links, and returns a [`ReconcilePlan`]. The caller must
//! apply the plan in field order: `demotion`, then `promotion`, then `creates`.
//! Applying a creation before its demotion would put two active primaries in
//! front of the store.

use std::collections::{HashMap, HashSet};

use linkage_core::entities::{EntityLink, TargetKey};
use linkage_core::enums::{EntityType, LinkSource, LinkType};
use linkage_core::requests::{CreateLinkRequest, LinkPatch};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::rules::LinkRules;

/// One selected entity, as it arrives from search results or an accepted
/// suggestion. `entity_type` is still an unchecked string here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateInput {
    pub entity_type: String,
    pub entity_id: String,
    #[serde(rename = "_shouldBePrimary", default)]
    pub should_be_primary: bool,
    #[serde(default)]
    pub link_type_hint: Option<LinkType>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub source: LinkSource,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub suggested_by: Option<String>,
}

impl CandidateInput {
    pub fn new(entity_type: impl Into<String>, entity_id: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            entity_id: entity_id.into(),
            should_be_primary: false,
            link_type_hint: None,
            notes: None,
            source: LinkSource::Human,
            confidence: None,
            suggested_by: None,
        }
    }

    #[must_use]
    pub const fn primary(mut self) -> Self {
        self.should_be_primary = true;
        self
    }

    #[must_use]
    pub const fn hint(mut self, link_type: LinkType) -> Self {
        self.link_type_hint = Some(link_type);
        self
    }

    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// A `link_type` change against an existing link, guarded by its version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkTypeChange {
    pub link_id: String,
    pub expected_version: u32,
    pub from: LinkType,
    pub to: LinkType,
}

impl LinkTypeChange {
    fn new(link: &EntityLink, to: LinkType) -> Self {
        Self {
            link_id: link.id.clone(),
            expected_version: link.version,
            from: link.link_type,
            to,
        }
    }

    #[must_use]
    pub fn to_patch(&self) -> LinkPatch {
        LinkPatch::link_type(self.to, self.expected_version)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReconcilePlan {
    /// Existing primary to turn into `related`. Always applied first.
    pub demotion: Option<LinkTypeChange>,
    /// An already linked candidate that becomes the primary.
    pub promotion: Option<LinkTypeChange>,
    /// New links in selection order, `link_order` already assigned.
    pub creates: Vec<CreateLinkRequest>,
    /// Candidates that are already actively linked and need nothing.
    pub skipped: Vec<TargetKey>,
    /// A primary was requested while another exists and the caller has not
    /// confirmed the replacement. The candidate is created as non-primary.
    pub deferred_primary: Option<TargetKey>,
}

impl ReconcilePlan {
    /// Whether applying the plan would change nothing.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.demotion.is_none() && self.promotion.is_none() && self.creates.is_empty()
    }

    /// Target that will hold the primary link once the plan is applied, if
    /// the plan changes it.
    #[must_use]
    pub fn new_primary(&self) -> Option<TargetKey> {
        self.creates
            .iter()
            .find(|r| r.link_type == LinkType::Primary)
            .map(|r| TargetKey::new(r.entity_type, &r.entity_id))
    }
}

struct Candidate {
    target: TargetKey,
    should_be_primary: bool,
    hint: Option<LinkType>,
    notes: Option<String>,
    source: LinkSource,
    confidence: Option<f64>,
    suggested_by: Option<String>,
}

fn validate(input: &CandidateInput, rules: &LinkRules) -> Result<Candidate, EngineError> {
    let entity_type = EntityType::parse(&input.entity_type)?;
    let entity_id = input.entity_id.trim();
    if entity_id.is_empty() {
        return Err(EngineError::Validation(format!(
            "empty entity_id for {entity_type} candidate"
        )));
    }
    rules.check_notes(input.notes.as_deref())?;
    if let Some(score) = input.confidence
        && !(0.0..=1.0).contains(&score)
    {
        return Err(EngineError::Validation(format!(
            "confidence {score} outside 0..=1"
        )));
    }
    Ok(Candidate {
        target: TargetKey::new(entity_type, entity_id),
        should_be_primary: input.should_be_primary,
        hint: input.link_type_hint,
        notes: input.notes.clone(),
        source: input.source,
        confidence: input.confidence,
        suggested_by: input.suggested_by.clone(),
    })
}

/// Validate the selection and collapse duplicates into their first
/// occurrence. A primary flag on any occurrence carries over.
fn prepare(inputs: &[CandidateInput], rules: &LinkRules) -> Result<Vec<Candidate>, EngineError> {
    let mut out: Vec<Candidate> = Vec::with_capacity(inputs.len());
    let mut seen: HashMap<TargetKey, usize> = HashMap::new();
    for input in inputs {
        let candidate = validate(input, rules)?;
        if let Some(&first) = seen.get(&candidate.target) {
            out[first].should_be_primary |= candidate.should_be_primary;
            continue;
        }
        seen.insert(candidate.target.clone(), out.len());
        out.push(candidate);
    }
    rules.check_batch_len(out.len())?;

    let flagged = out.iter().filter(|c| c.should_be_primary).count();
    if flagged > 1 {
        return Err(EngineError::Validation(format!(
            "{flagged} candidates are marked as primary; at most one may be"
        )));
    }
    Ok(out)
}

fn resolve_non_primary(candidate: &Candidate) -> LinkType {
    match candidate.hint {
        Some(hint) if hint != LinkType::Primary && hint.allows(candidate.target.entity_type) => {
            hint
        }
        _ => LinkType::Related,
    }
}

/// Compute the operations that attach `candidates` to an intake.
///
/// `existing` may include soft-deleted rows; only active ones are considered.
/// An empty selection yields an empty plan.
///
/// # Errors
///
/// - `InvalidEntityType` for an entity type outside the enumeration.
/// - `Validation` for an empty id, over-long notes, an out-of-range
///   confidence, an oversized selection, or more than one primary flag.
pub fn reconcile(
    candidates: &[CandidateInput],
    force_primary: bool,
    existing: &[EntityLink],
    rules: &LinkRules,
) -> Result<ReconcilePlan, EngineError> {
    if candidates.is_empty() {
        return Ok(ReconcilePlan::default());
    }
    let candidates = prepare(candidates, rules)?;

    let active: Vec<&EntityLink> = existing.iter().filter(|l| l.is_active()).collect();
    let current_primary = active.iter().copied().find(|l| l.is_primary());
    let linked: HashMap<TargetKey, &EntityLink> =
        active.iter().map(|l| (l.target(), *l)).collect();
    let max_order = active.iter().map(|l| l.link_order).max().unwrap_or(0);

    let mut plan = ReconcilePlan::default();
    let flagged = candidates.iter().find(|c| c.should_be_primary);

    let primary_target: Option<TargetKey> = match (flagged, current_primary) {
        (Some(c), Some(current)) if current.target() == c.target => None,
        (Some(c), Some(current)) if force_primary => {
            plan.demotion = Some(LinkTypeChange::new(current, LinkType::Related));
            Some(c.target.clone())
        }
        (Some(c), Some(_)) => {
            plan.deferred_primary = Some(c.target.clone());
            None
        }
        (Some(c), None) => Some(c.target.clone()),
        // Auto-promotion only ever targets the first eligible candidate of the
        // whole selection. If that one is already linked nothing is promoted.
        (None, None) => {
            let mut seen_types: HashSet<EntityType> = HashSet::new();
            candidates
                .iter()
                .find(|c| {
                    let first_of_type = seen_types.insert(c.target.entity_type);
                    first_of_type && rules.is_primary_eligible(c.target.entity_type)
                })
                .filter(|c| !linked.contains_key(&c.target))
                .map(|c| c.target.clone())
        }
        (None, Some(_)) => None,
    };

    let mut next_order = max_order;
    for candidate in candidates {
        let is_new_primary = primary_target.as_ref() == Some(&candidate.target);

        if let Some(link) = linked.get(&candidate.target) {
            if is_new_primary {
                plan.promotion = Some(LinkTypeChange::new(link, LinkType::Primary));
            } else {
                plan.skipped.push(candidate.target);
            }
            continue;
        }

        let link_type = if is_new_primary {
            LinkType::Primary
        } else {
            resolve_non_primary(&candidate)
        };
        next_order += 1;
        plan.creates.push(CreateLinkRequest {
            entity_type: candidate.target.entity_type,
            entity_id: candidate.target.entity_id,
            link_type,
            notes: candidate.notes,
            source: candidate.source,
            confidence: candidate.confidence,
            suggested_by: candidate.suggested_by,
            link_order: Some(next_order),
        });
    }

    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::link;
    use pretty_assertions::assert_eq;

    fn types(plan: &ReconcilePlan) -> Vec<(String, LinkType)> {
        plan.creates
            .iter()
            .map(|r| (r.entity_id.clone(), r.link_type))
            .collect()
    }

    #[test]
    fn empty_selection_is_a_noop() {
        let plan = reconcile(&[], true, &[], &LinkRules::default()).unwrap();
        assert!(plan.is_noop());
        assert_eq!(plan, ReconcilePlan::default());
    }

    #[test]
    fn first_eligible_type_is_promoted() {
        let plan = reconcile(
            &[
                CandidateInput::new("country", "c1"),
                CandidateInput::new("dossier", "d1"),
                CandidateInput::new("position", "p1"),
            ],
            false,
            &[],
            &LinkRules::default(),
        )
        .unwrap();
        assert_eq!(
            types(&plan),
            vec![
                ("c1".into(), LinkType::Related),
                ("d1".into(), LinkType::Primary),
                ("p1".into(), LinkType::Related),
            ]
        );
        assert_eq!(plan.new_primary(), Some(TargetKey::new(EntityType::Dossier, "d1")));
    }

    #[test]
    fn no_eligible_type_means_no_primary() {
        let plan = reconcile(
            &[CandidateInput::new("country", "c1"), CandidateInput::new("forum", "f1")],
            false,
            &[],
            &LinkRules::default(),
        )
        .unwrap();
        assert!(plan.creates.iter().all(|r| r.link_type == LinkType::Related));
    }

    #[test]
    fn existing_primary_keeps_everything_related() {
        let existing = vec![link("L1", EntityType::Dossier, "d0", LinkType::Primary, 1)];
        let plan = reconcile(
            &[CandidateInput::new("dossier", "d1")],
            false,
            &existing,
            &LinkRules::default(),
        )
        .unwrap();
        assert_eq!(types(&plan), vec![("d1".into(), LinkType::Related)]);
        assert!(plan.demotion.is_none());
        assert!(plan.deferred_primary.is_none());
    }

    #[test]
    fn forced_replacement_demotes_then_creates() {
        let existing = vec![link("L1", EntityType::Dossier, "d0", LinkType::Primary, 1)];
        let plan = reconcile(
            &[CandidateInput::new("position", "p1").primary()],
            true,
            &existing,
            &LinkRules::default(),
        )
        .unwrap();
        assert_eq!(
            plan.demotion,
            Some(LinkTypeChange {
                link_id: "L1".into(),
                expected_version: 1,
                from: LinkType::Primary,
                to: LinkType::Related,
            })
        );
        assert_eq!(types(&plan), vec![("p1".into(), LinkType::Primary)]);
        assert_eq!(plan.creates[0].link_order, Some(2));
    }

    #[test]
    fn unforced_primary_request_is_deferred() {
        let existing = vec![link("L1", EntityType::Dossier, "d0", LinkType::Primary, 1)];
        let plan = reconcile(
            &[CandidateInput::new("position", "p1").primary()],
            false,
            &existing,
            &LinkRules::default(),
        )
        .unwrap();
        assert!(plan.demotion.is_none());
        assert_eq!(
            plan.deferred_primary,
            Some(TargetKey::new(EntityType::Position, "p1"))
        );
        assert_eq!(types(&plan), vec![("p1".into(), LinkType::Related)]);
    }

    #[test]
    fn flag_ignores_eligibility_list() {
        let plan = reconcile(
            &[
                CandidateInput::new("dossier", "d1"),
                CandidateInput::new("country", "c1").primary(),
            ],
            false,
            &[],
            &LinkRules::default(),
        )
        .unwrap();
        assert_eq!(
            types(&plan),
            vec![("d1".into(), LinkType::Related), ("c1".into(), LinkType::Primary)]
        );
    }

    #[test]
    fn already_linked_candidates_are_skipped() {
        let existing = vec![link("L1", EntityType::Country, "c1", LinkType::Related, 1)];
        let plan = reconcile(
            &[CandidateInput::new("country", "c1"), CandidateInput::new("topic", "t1")],
            false,
            &existing,
            &LinkRules::default(),
        )
        .unwrap();
        assert_eq!(plan.skipped, vec![TargetKey::new(EntityType::Country, "c1")]);
        assert_eq!(types(&plan), vec![("t1".into(), LinkType::Related)]);
        assert_eq!(plan.creates[0].link_order, Some(2));
    }

    #[test]
    fn linked_first_of_type_blocks_auto_promotion() {
        let existing = vec![link("L1", EntityType::Dossier, "d1", LinkType::Related, 1)];
        let plan = reconcile(
            &[CandidateInput::new("dossier", "d1"), CandidateInput::new("dossier", "d2")],
            false,
            &existing,
            &LinkRules::default(),
        )
        .unwrap();
        assert_eq!(types(&plan), vec![("d2".into(), LinkType::Related)]);
        assert_eq!(plan.promotion, None);
        assert_eq!(plan.new_primary(), None);
    }

    #[test]
    fn linked_candidate_before_eligible_one_does_not_block_it() {
        let existing = vec![link("L1", EntityType::Country, "c1", LinkType::Related, 1)];
        let plan = reconcile(
            &[CandidateInput::new("country", "c1"), CandidateInput::new("position", "p1")],
            false,
            &existing,
            &LinkRules::default(),
        )
        .unwrap();
        assert_eq!(types(&plan), vec![("p1".into(), LinkType::Primary)]);
    }

    #[test]
    fn soft_deleted_links_do_not_count() {
        let mut gone = link("L1", EntityType::Dossier, "d1", LinkType::Primary, 4);
        gone.deleted_at = Some(gone.created_at);
        let plan = reconcile(
            &[CandidateInput::new("dossier", "d1")],
            false,
            &[gone],
            &LinkRules::default(),
        )
        .unwrap();
        assert_eq!(types(&plan), vec![("d1".into(), LinkType::Primary)]);
        assert_eq!(plan.creates[0].link_order, Some(1));
    }

    #[test]
    fn linked_flagged_candidate_is_promoted_after_demotion() {
        let existing = vec![
            link("L1", EntityType::Dossier, "d0", LinkType::Primary, 1),
            link("L2", EntityType::Position, "p1", LinkType::Related, 2),
        ];
        let plan = reconcile(
            &[CandidateInput::new("position", "p1").primary()],
            true,
            &existing,
            &LinkRules::default(),
        )
        .unwrap();
        assert_eq!(plan.demotion.as_ref().map(|d| d.link_id.as_str()), Some("L1"));
        let promotion = plan.promotion.unwrap();
        assert_eq!(promotion.link_id, "L2");
        assert_eq!(promotion.to, LinkType::Primary);
        assert!(plan.creates.is_empty());
    }

    #[test]
    fn flagging_the_current_primary_changes_nothing() {
        let existing = vec![link("L1", EntityType::Dossier, "d0", LinkType::Primary, 1)];
        let plan = reconcile(
            &[CandidateInput::new("dossier", "d0").primary()],
            true,
            &existing,
            &LinkRules::default(),
        )
        .unwrap();
        assert!(plan.is_noop());
        assert_eq!(plan.skipped.len(), 1);
    }

    #[test]
    fn duplicates_collapse_and_keep_primary_flag() {
        let plan = reconcile(
            &[
                CandidateInput::new("country", "c1"),
                CandidateInput::new("topic", "t1"),
                CandidateInput::new("country", "c1").primary(),
            ],
            false,
            &[],
            &LinkRules::default(),
        )
        .unwrap();
        assert_eq!(
            types(&plan),
            vec![("c1".into(), LinkType::Primary), ("t1".into(), LinkType::Related)]
        );
    }

    #[test]
    fn hints_are_honored_when_allowed() {
        let plan = reconcile(
            &[
                CandidateInput::new("mou", "m1").hint(LinkType::Requested),
                CandidateInput::new("topic", "t1").hint(LinkType::Requested),
                CandidateInput::new("assignment", "a1").hint(LinkType::AssignedTo),
                CandidateInput::new("forum", "f1").hint(LinkType::Primary),
            ],
            false,
            &[],
            &LinkRules::default(),
        )
        .unwrap();
        assert_eq!(
            types(&plan),
            vec![
                ("m1".into(), LinkType::Requested),
                ("t1".into(), LinkType::Related),
                ("a1".into(), LinkType::AssignedTo),
                ("f1".into(), LinkType::Related),
            ]
        );
    }

    #[test]
    fn unknown_entity_type_is_rejected() {
        let err = reconcile(
            &[CandidateInput::new("galaxy", "g1")],
            false,
            &[],
            &LinkRules::default(),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidEntityType(ref t) if t == "galaxy"));
    }

    #[test]
    fn blank_entity_id_is_rejected() {
        let err = reconcile(
            &[CandidateInput::new("dossier", "  ")],
            false,
            &[],
            &LinkRules::default(),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn two_primary_flags_are_rejected() {
        let err = reconcile(
            &[
                CandidateInput::new("dossier", "d1").primary(),
                CandidateInput::new("position", "p1").primary(),
            ],
            true,
            &[],
            &LinkRules::default(),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::Validation(ref m) if m.contains("marked as primary")));
    }

    #[test]
    fn oversized_selection_is_rejected() {
        let rules = LinkRules {
            max_batch_size: 2,
            ..LinkRules::default()
        };
        let candidates: Vec<_> = (0..3)
            .map(|i| CandidateInput::new("topic", format!("t{i}")))
            .collect();
        assert!(reconcile(&candidates, false, &[], &rules).is_err());
    }

    #[test]
    fn candidate_wire_format_uses_should_be_primary_key() {
        let input: CandidateInput = serde_json::from_value(serde_json::json!({
            "entity_type": "position",
            "entity_id": "p1",
            "_shouldBePrimary": true
        }))
        .unwrap();
        assert!(input.should_be_primary);
        assert_eq!(input.source, LinkSource::Human);
    }
}
