use linkage_core::entities::AuditEntry;
use linkage_core::enums::AuditAction;
use linkage_db::repos::audit::AuditFilter;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::AuditArgs;
use crate::commands::shared::limit::effective_limit;
use crate::commands::shared::parse::parse_enum;
use crate::context::AppContext;
use crate::output::output;

/// Handle `lkg audit`.
pub async fn handle(args: &AuditArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let filter = build_filter(args, flags, ctx.config.general.default_limit)?;
    let entries: Vec<AuditEntry> = ctx.service().query_audit(&filter).await?;
    output(&entries, flags.format)
}

fn build_filter(args: &AuditArgs, flags: &GlobalFlags, fallback: u32) -> anyhow::Result<AuditFilter> {
    Ok(AuditFilter {
        intake_id: args.intake.clone(),
        link_id: args.link.clone(),
        action: args
            .action
            .as_deref()
            .map(|value| parse_enum::<AuditAction>(value, "action"))
            .transpose()?,
        actor: args.actor.clone(),
        limit: Some(effective_limit(None, flags.limit, fallback)),
    })
}
