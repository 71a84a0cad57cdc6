use linkage_core::enums::{EntityType, LinkType};
use linkage_db::repos::lookup::{DEFAULT_PAGE_SIZE, IntakeQuery};

use crate::cli::GlobalFlags;
use crate::commands::shared::limit::effective_limit;
use crate::commands::shared::parse::{parse_entity_ref, parse_enum};
use crate::context::AppContext;
use crate::output::output;

pub async fn run(
    entity: &str,
    link_type: Option<&str>,
    page: u32,
    page_size: Option<u32>,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let query = build_query(entity, link_type, page, page_size, flags)?;
    let result = ctx.service().intakes_for_entity(&query).await?;
    output(&result, flags.format)
}

fn build_query(
    entity: &str,
    link_type: Option<&str>,
    page: u32,
    page_size: Option<u32>,
    flags: &GlobalFlags,
) -> anyhow::Result<IntakeQuery> {
    let (entity_type, entity_id) = parse_entity_ref(entity)?;
    let entity_type = EntityType::parse(&entity_type)?;
    let mut query = IntakeQuery::new(entity_type, entity_id);
    query.link_type = link_type
        .map(|raw| parse_enum::<LinkType>(raw, "link-type"))
        .transpose()?;
    query.page = page;
    query.page_size = effective_limit(page_size, flags.limit, DEFAULT_PAGE_SIZE);
    Ok(query)
}
