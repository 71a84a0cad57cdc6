use std::sync::Arc;
use std::time::{Duration, Instant};

use linkage_core::enums::EntityType;
use linkage_flow::FlowError;
use linkage_flow::retry::RetryGate;
use linkage_flow::suggestions::{SuggestionClient, SuggestionError, Suggestions};

use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::{notice, output};

pub async fn run(
    intake: &str,
    types: &[String],
    wait: bool,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let entity_types = parse_types(types)?;
    let client = ctx.suggestion_client()?;
    let mut gate = RetryGate::new(ctx.config.suggestions.max_retries);

    loop {
        gate.try_begin(Instant::now())?;
        match fetch_once(&client, ctx, intake, &entity_types).await {
            Ok(result) => {
                gate.record_success();
                if let Some(meta) = &result.metadata {
                    tracing::debug!(
                        service = ?meta.ai_service,
                        cache_hit = meta.cache_hit,
                        "suggestions received"
                    );
                }
                return output(&result.suggestions, flags.format);
            }
            Err(SuggestionError::Unavailable {
                code,
                message,
                retry_after,
                fallback,
            }) => {
                gate.record_unavailable(retry_after, Instant::now());
                if !wait || gate.remaining() == 0 {
                    notice(
                        "suggestions unavailable; link entities manually with `lkg link add`",
                        flags.quiet,
                    );
                    return Err(FlowError::from(SuggestionError::Unavailable {
                        code,
                        message,
                        retry_after,
                        fallback,
                    })
                    .into());
                }
                let delay = retry_after.unwrap_or(1);
                notice(
                    &format!("{message}; retrying in {delay}s ({} left)", gate.remaining()),
                    flags.quiet,
                );
                tokio::time::sleep(Duration::from_secs(delay)).await;
            }
            Err(err) => return Err(FlowError::from(err).into()),
        }
    }
}

/// One generation request, aborted on Ctrl-C.
async fn fetch_once(
    client: &Arc<SuggestionClient>,
    ctx: &AppContext,
    intake: &str,
    entity_types: &[EntityType],
) -> Result<Suggestions, SuggestionError> {
    let task = client.spawn_generate(
        ctx.linker.session().clone(),
        intake.to_string(),
        entity_types.to_vec(),
    );
    let abort = task.abort_handle();
    tokio::select! {
        result = task.join() => result,
        _ = tokio::signal::ctrl_c() => {
            abort.abort();
            Err(SuggestionError::Cancelled)
        }
    }
}

fn parse_types(types: &[String]) -> anyhow::Result<Vec<EntityType>> {
    let parsed = types
        .iter()
        .map(|raw| EntityType::parse(&raw.trim().replace('-', "_")))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(parsed)
}
