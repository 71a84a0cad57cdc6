use linkage_core::enums::{EntityType, LinkType};
use linkage_core::requests::AcceptSuggestionRequest;

use crate::cli::GlobalFlags;
use crate::commands::link::summary;
use crate::commands::shared::parse::{parse_entity_ref, parse_enum};
use crate::context::AppContext;
use crate::output::{notice, output};

pub fn build_request(
    suggestion: &str,
    entity: &str,
    link_type: &str,
) -> anyhow::Result<AcceptSuggestionRequest> {
    let (entity_type, entity_id) = parse_entity_ref(entity)?;
    Ok(AcceptSuggestionRequest {
        suggestion_id: suggestion.to_string(),
        entity_id,
        entity_type: EntityType::parse(&entity_type)?,
        link_type: parse_enum::<LinkType>(link_type, "link-type")?,
    })
}

/// Link the suggested entity locally, then tell the service it was accepted.
/// A failed report does not undo the link.
pub async fn run(
    intake: &str,
    request: &AcceptSuggestionRequest,
    confidence: Option<f64>,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let outcome = ctx
        .linker
        .accept_suggestion(intake, request, confidence)
        .await?;

    if ctx.config.suggestions.is_configured() {
        let client = ctx.suggestion_client()?;
        if let Err(error) = client.accept(ctx.linker.session(), intake, request).await {
            tracing::warn!(%error, suggestion_id = %request.suggestion_id, "could not report accepted suggestion");
        }
    }

    notice(&summary(&outcome), flags.quiet);
    output(&outcome, flags.format)
}
