use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::{notice, output};

pub async fn list(intake: &str, deleted: bool, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let links = ctx.linker.view(intake, deleted).await?;
    output(&links, flags.format)
}

pub async fn notes(
    intake: &str,
    link: &str,
    notes: Option<String>,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let updated = ctx.linker.update_notes(intake, link, notes).await?;
    output(&updated, flags.format)
}

pub async fn delete(intake: &str, link: &str, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let deleted = ctx.linker.delete_link(intake, link).await?;
    notice(&format!("deleted {link}; restore with `lkg link restore {intake} {link}`"), flags.quiet);
    output(&deleted, flags.format)
}

pub async fn restore(intake: &str, link: &str, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let restored = ctx.linker.restore_link(intake, link).await?;
    output(&restored, flags.format)
}

pub async fn move_link(
    intake: &str,
    link: &str,
    target: &str,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let links = ctx.linker.move_link(intake, link, target).await?;
    output(&links, flags.format)
}
