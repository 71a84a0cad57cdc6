#[path = "suggest/accept.rs"]
mod accept;
#[path = "suggest/generate.rs"]
mod generate;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::SuggestCommands;
use crate::context::AppContext;

/// Handle `lkg suggest`.
pub async fn handle(
    action: &SuggestCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        SuggestCommands::Generate {
            intake,
            types,
            wait,
        } => generate::run(intake, types, *wait, ctx, flags).await,
        SuggestCommands::Accept {
            intake,
            suggestion,
            entity,
            link_type,
            confidence,
        } => {
            let request = accept::build_request(suggestion, entity, link_type)?;
            accept::run(intake, &request, *confidence, ctx, flags).await
        }
    }
}
