//! Shared helpers for linkage-flow unit tests.

use chrono::{Duration, Utc};
use linkage_core::identity::AuthIdentity;
use linkage_db::service::LinkService;
use linkage_engine::LinkRules;

use crate::linker::Linker;
use crate::session::Session;

fn identity() -> AuthIdentity {
    AuthIdentity {
        user_id: "u-analyst".into(),
        org_id: Some("org-1".into()),
        clearance_level: 1,
    }
}

pub fn session() -> Session {
    Session::new(identity(), "tok", Some(Utc::now() + Duration::hours(1)))
}

pub fn session_expired() -> Session {
    Session::new(identity(), "tok", Some(Utc::now() - Duration::minutes(1)))
}

/// Linker over an in-memory store with default rules.
pub async fn linker() -> Linker<LinkService> {
    let store = LinkService::new_local(":memory:", None, identity(), LinkRules::default())
        .await
        .unwrap();
    Linker::new(store, session(), LinkRules::default())
}
