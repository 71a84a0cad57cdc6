//! Shared helpers for linkage-db unit tests.

use linkage_core::identity::AuthIdentity;
use linkage_core::requests::CreateLinkRequest;
use linkage_core::entities::EntityLink;
use linkage_core::enums::{EntityType, LinkType};
use linkage_engine::LinkRules;

use crate::LinkDb;
use crate::service::LinkService;
use crate::trail::writer::TrailWriter;

pub fn analyst() -> AuthIdentity {
    AuthIdentity {
        user_id: "u-analyst".into(),
        org_id: Some("org-1".into()),
        clearance_level: 1,
    }
}

/// In-memory service with trail disabled and default rules.
pub async fn test_service() -> LinkService {
    test_service_with_rules(LinkRules::default()).await
}

pub async fn test_service_with_rules(rules: LinkRules) -> LinkService {
    let db = LinkDb::open_local(":memory:").await.unwrap();
    LinkService::from_db(db, TrailWriter::disabled(), analyst(), rules)
}

pub async fn test_service_with_trail(trail_dir: std::path::PathBuf) -> LinkService {
    let db = LinkDb::open_local(":memory:").await.unwrap();
    let trail = TrailWriter::new(trail_dir).unwrap();
    LinkService::from_db(db, trail, analyst(), LinkRules::default())
}

/// Create a link and return it, panicking on failure.
pub async fn seed(
    svc: &LinkService,
    intake_id: &str,
    entity_type: EntityType,
    entity_id: &str,
    link_type: LinkType,
) -> EntityLink {
    svc.create_link(
        intake_id,
        &CreateLinkRequest::new(entity_type, entity_id, link_type),
    )
    .await
    .unwrap()
}
