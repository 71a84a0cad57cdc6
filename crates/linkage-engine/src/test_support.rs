use chrono::{TimeZone, Utc};
use linkage_core::entities::EntityLink;
use linkage_core::enums::{EntityType, LinkSource, LinkType};

/// Active link on intake `int-1`, version 1.
pub fn link(
    id: &str,
    entity_type: EntityType,
    entity_id: &str,
    link_type: LinkType,
    link_order: u32,
) -> EntityLink {
    let at = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
    EntityLink {
        id: id.to_string(),
        intake_id: "int-1".to_string(),
        entity_type,
        entity_id: entity_id.to_string(),
        link_type,
        source: LinkSource::Human,
        confidence: None,
        notes: None,
        link_order,
        suggested_by: None,
        created_by: "u-analyst".to_string(),
        created_at: at,
        updated_at: at,
        deleted_at: None,
        deleted_by: None,
        version: 1,
    }
}

/// `n` related topic links `L1..=Ln` in order.
pub fn ordered(n: u32) -> Vec<EntityLink> {
    (1..=n)
        .map(|i| {
            link(
                &format!("L{i}"),
                EntityType::Topic,
                &format!("t{i}"),
                LinkType::Related,
                i,
            )
        })
        .collect()
}

pub fn ids(links: &[EntityLink]) -> Vec<&str> {
    links.iter().map(|l| l.id.as_str()).collect()
}
