use linkage_core::enums::LinkType;
use linkage_engine::CandidateInput;
use linkage_flow::LinkOutcome;

use crate::cli::GlobalFlags;
use crate::commands::shared::parse::{parse_entity_ref, parse_enum};
use crate::context::AppContext;
use crate::output::{notice, output};

pub struct Selection<'a> {
    pub entities: &'a [String],
    pub primary: Option<&'a str>,
    pub link_type: Option<&'a str>,
    pub notes: Option<&'a str>,
}

pub async fn run(
    intake: &str,
    selection: &Selection<'_>,
    force: bool,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let candidates = build_candidates(selection)?;
    let outcome = ctx.linker.link_entities(intake, &candidates, force).await?;
    notice(&summary(&outcome), flags.quiet);
    output(&outcome, flags.format)
}

/// Turn `type:id` arguments into candidates in selection order. A `--primary`
/// entity missing from the list is appended.
fn build_candidates(selection: &Selection<'_>) -> anyhow::Result<Vec<CandidateInput>> {
    let hint = selection
        .link_type
        .map(|raw| parse_enum::<LinkType>(raw, "link-type"))
        .transpose()?;
    let primary = selection.primary.map(parse_entity_ref).transpose()?;

    let mut candidates = Vec::with_capacity(selection.entities.len() + 1);
    let mut primary_seen = false;
    for raw in selection.entities {
        let (entity_type, entity_id) = parse_entity_ref(raw)?;
        let is_primary = primary
            .as_ref()
            .is_some_and(|(t, id)| *t == entity_type && *id == entity_id);
        primary_seen |= is_primary;
        candidates.push(candidate(entity_type, entity_id, is_primary, hint, selection.notes));
    }
    if let Some((entity_type, entity_id)) = primary
        && !primary_seen
    {
        candidates.push(candidate(entity_type, entity_id, true, hint, selection.notes));
    }
    Ok(candidates)
}

fn candidate(
    entity_type: String,
    entity_id: String,
    primary: bool,
    hint: Option<LinkType>,
    notes: Option<&str>,
) -> CandidateInput {
    let mut candidate = CandidateInput::new(entity_type, entity_id);
    if primary {
        candidate = candidate.primary();
    }
    if let Some(hint) = hint {
        candidate = candidate.hint(hint);
    }
    if let Some(notes) = notes {
        candidate = candidate.notes(notes);
    }
    candidate
}

pub fn summary(outcome: &LinkOutcome) -> String {
    let mut parts = vec![outcome.outcome.summary()];
    if let Some(id) = &outcome.demoted {
        parts.push(format!("demoted {id}"));
    }
    if let Some(id) = &outcome.promoted {
        parts.push(format!("promoted {id}"));
    }
    if !outcome.skipped.is_empty() {
        parts.push(format!("{} already linked", outcome.skipped.len()));
    }
    if let Some(target) = &outcome.deferred_primary {
        parts.push(format!(
            "{target} linked as related: intake already has a primary (re-run with --force to replace it)"
        ));
    }
    parts.join("; ")
}
