#[path = "link/add.rs"]
mod add;
#[path = "link/intakes.rs"]
mod intakes;
#[path = "link/manage.rs"]
mod manage;

pub use add::summary;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::LinkCommands;
use crate::context::AppContext;

/// Handle `lkg link`.
pub async fn handle(action: &LinkCommands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    match action {
        LinkCommands::Add {
            intake,
            entities,
            primary,
            force,
            link_type,
            notes,
        } => {
            let selection = add::Selection {
                entities,
                primary: primary.as_deref(),
                link_type: link_type.as_deref(),
                notes: notes.as_deref(),
            };
            add::run(intake, &selection, *force, ctx, flags).await
        }
        LinkCommands::List { intake, deleted } => manage::list(intake, *deleted, ctx, flags).await,
        LinkCommands::Notes {
            intake,
            link,
            notes,
            clear,
        } => {
            let notes = if *clear { None } else { notes.clone() };
            manage::notes(intake, link, notes, ctx, flags).await
        }
        LinkCommands::Delete { intake, link } => manage::delete(intake, link, ctx, flags).await,
        LinkCommands::Restore { intake, link } => manage::restore(intake, link, ctx, flags).await,
        LinkCommands::Move {
            intake,
            link,
            target,
        } => manage::move_link(intake, link, target, ctx, flags).await,
        LinkCommands::Intakes {
            entity,
            link_type,
            page,
            page_size,
        } => {
            intakes::run(entity, link_type.as_deref(), *page, *page_size, ctx, flags).await
        }
    }
}
