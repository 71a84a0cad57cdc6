//! Linker integration tests against the libSQL store
//!
//! - Primary replacement sequencing (demote, then create) and deferral
//! - Failure handling: aborted creation, rollback to the pre-operation view
//! - Batch partial success surfacing
//! - Reorder, delete, restore through the flow
//! - Per-intake serialization of concurrent mutations

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;

use linkage_core::entities::{EntityLink, TargetKey};
use linkage_core::enums::{EntityType, LinkType};
use linkage_core::ids::is_temp_id;
use linkage_core::identity::AuthIdentity;
use linkage_core::requests::{
    BatchCreateRequest, BatchCreateResponse, CreateLinkRequest, LinkPatch, ReorderRequest,
};
use linkage_core::responses::BatchOutcome;
use linkage_db::service::LinkService;
use linkage_engine::{CacheKey, CandidateInput, LinkRules};
use linkage_flow::{FlowError, LinkStore, Linker, Session, StoreError};

/// Wraps the real store, records calls, and fails them on request.
struct FlakyStore {
    inner: LinkService,
    calls: Mutex<Vec<&'static str>>,
    /// Call name → successes left before every further call fails.
    failing: Mutex<HashMap<&'static str, usize>>,
    /// Link the last batch item behind the caller's back before the batch runs.
    race_batch: AtomicBool,
}

impl FlakyStore {
    async fn new() -> Self {
        Self {
            inner: LinkService::new_local(":memory:", None, identity(), LinkRules::default())
                .await
                .unwrap(),
            calls: Mutex::new(Vec::new()),
            failing: Mutex::new(HashMap::new()),
            race_batch: AtomicBool::new(false),
        }
    }

    fn fail_after(&self, call: &'static str, successes: usize) {
        self.failing.lock().unwrap().insert(call, successes);
    }

    fn take_calls(&self) -> Vec<&'static str> {
        std::mem::take(&mut *self.calls.lock().unwrap())
    }

    fn enter(&self, call: &'static str) -> Result<(), StoreError> {
        self.calls.lock().unwrap().push(call);
        let mut failing = self.failing.lock().unwrap();
        match failing.get_mut(call) {
            Some(0) => Err(StoreError::Conflict {
                code: "VERSION_CONFLICT".into(),
                message: format!("injected {call} failure"),
            }),
            Some(left) => {
                *left -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl LinkStore for FlakyStore {
    async fn list_links(
        &self,
        intake_id: &str,
        include_deleted: bool,
    ) -> Result<Vec<EntityLink>, StoreError> {
        self.enter("list")?;
        LinkStore::list_links(&self.inner, intake_id, include_deleted).await
    }

    async fn create_link(
        &self,
        intake_id: &str,
        request: &CreateLinkRequest,
    ) -> Result<EntityLink, StoreError> {
        self.enter("create")?;
        LinkStore::create_link(&self.inner, intake_id, request).await
    }

    async fn create_links_batch(
        &self,
        intake_id: &str,
        batch: &BatchCreateRequest,
    ) -> Result<BatchCreateResponse, StoreError> {
        self.enter("batch")?;
        if self.race_batch.load(Ordering::SeqCst)
            && let Some(last) = batch.links.last()
        {
            LinkStore::create_link(&self.inner, intake_id, last).await?;
        }
        LinkStore::create_links_batch(&self.inner, intake_id, batch).await
    }

    async fn update_link(
        &self,
        intake_id: &str,
        link_id: &str,
        patch: &LinkPatch,
    ) -> Result<EntityLink, StoreError> {
        self.enter("update")?;
        LinkStore::update_link(&self.inner, intake_id, link_id, patch).await
    }

    async fn delete_link(&self, intake_id: &str, link_id: &str) -> Result<EntityLink, StoreError> {
        self.enter("delete")?;
        LinkStore::delete_link(&self.inner, intake_id, link_id).await
    }

    async fn restore_link(&self, intake_id: &str, link_id: &str) -> Result<EntityLink, StoreError> {
        self.enter("restore")?;
        LinkStore::restore_link(&self.inner, intake_id, link_id).await
    }

    async fn reorder_links(
        &self,
        intake_id: &str,
        request: &ReorderRequest,
    ) -> Result<Vec<EntityLink>, StoreError> {
        self.enter("reorder")?;
        LinkStore::reorder_links(&self.inner, intake_id, request).await
    }
}

fn identity() -> AuthIdentity {
    AuthIdentity {
        user_id: "u-analyst".into(),
        org_id: None,
        clearance_level: 1,
    }
}

fn session() -> Session {
    Session::new(identity(), "tok", Some(Utc::now() + Duration::hours(1)))
}

async fn linker() -> Linker<FlakyStore> {
    Linker::new(FlakyStore::new().await, session(), LinkRules::default())
}

fn topics(ids: &[&str]) -> Vec<CandidateInput> {
    ids.iter().map(|id| CandidateInput::new("topic", *id)).collect()
}

fn primaries(links: &[EntityLink]) -> Vec<&str> {
    links
        .iter()
        .filter(|l| l.is_active() && l.is_primary())
        .map(|l| l.entity_id.as_str())
        .collect()
}

fn orders(links: &[EntityLink]) -> Vec<(&str, u32)> {
    links
        .iter()
        .map(|l| (l.entity_id.as_str(), l.link_order))
        .collect()
}

// ---------------------------------------------------------------------------
// Primary replacement
// ---------------------------------------------------------------------------

#[tokio::test]
async fn first_eligible_entity_becomes_primary() {
    let linker = linker().await;
    let outcome = linker
        .link_entities(
            "int-1",
            &[
                CandidateInput::new("country", "c1"),
                CandidateInput::new("dossier", "d1"),
            ],
            false,
        )
        .await
        .unwrap();
    assert_eq!(outcome.outcome.created_count(), 2);
    let view = linker.view("int-1", false).await.unwrap();
    assert_eq!(primaries(&view), vec!["d1"]);
    assert_eq!(orders(&view), vec![("c1", 1), ("d1", 2)]);
}

#[tokio::test]
async fn forced_replacement_demotes_before_creating() {
    let linker = linker().await;
    let first = linker
        .link_entities("int-1", &[CandidateInput::new("dossier", "d0")], false)
        .await
        .unwrap();
    let old_id = first.outcome.created()[0].id.clone();
    linker.store().take_calls();

    let outcome = linker
        .link_entities("int-1", &[CandidateInput::new("position", "p1").primary()], true)
        .await
        .unwrap();

    assert_eq!(outcome.demoted, Some(old_id));
    assert_eq!(outcome.outcome.created()[0].link_type, LinkType::Primary);
    assert_eq!(
        linker.store().take_calls(),
        vec!["list", "update", "create", "list"]
    );
    assert_eq!(primaries(&linker.view("int-1", false).await.unwrap()), vec!["p1"]);
}

#[tokio::test]
async fn unconfirmed_replacement_is_deferred() {
    let linker = linker().await;
    linker
        .link_entities("int-1", &[CandidateInput::new("dossier", "d0")], false)
        .await
        .unwrap();

    let outcome = linker
        .link_entities("int-1", &[CandidateInput::new("position", "p1").primary()], false)
        .await
        .unwrap();
    assert_eq!(
        outcome.deferred_primary,
        Some(TargetKey::new(EntityType::Position, "p1"))
    );
    assert_eq!(outcome.demoted, None);
    assert_eq!(outcome.outcome.created()[0].link_type, LinkType::Related);
    assert_eq!(primaries(&linker.view("int-1", false).await.unwrap()), vec!["d0"]);
}

#[tokio::test]
async fn failed_demotion_creates_nothing() {
    let linker = linker().await;
    linker
        .link_entities("int-1", &[CandidateInput::new("dossier", "d0")], false)
        .await
        .unwrap();
    let before = linker.view("int-1", false).await.unwrap();
    linker.store().take_calls();
    linker.store().fail_after("update", 0);

    let err = linker
        .link_entities("int-1", &[CandidateInput::new("position", "p1").primary()], true)
        .await
        .unwrap_err();
    assert!(err.is_conflict());
    assert_eq!(linker.store().take_calls(), vec!["list", "update", "list"]);
    assert_eq!(linker.view("int-1", false).await.unwrap(), before);
}

#[tokio::test]
async fn failed_replacement_restores_previous_primary() {
    let linker = linker().await;
    linker
        .link_entities("int-1", &[CandidateInput::new("dossier", "d0")], false)
        .await
        .unwrap();
    linker.store().take_calls();
    linker.store().fail_after("create", 0);

    let err = linker
        .link_entities("int-1", &[CandidateInput::new("position", "p1").primary()], true)
        .await
        .unwrap_err();
    assert!(err.is_conflict());
    assert_eq!(
        linker.store().take_calls(),
        vec!["list", "update", "create", "update", "list"]
    );
    let view = linker.view("int-1", false).await.unwrap();
    assert_eq!(primaries(&view), vec!["d0"]);
    assert_eq!(view.len(), 1);
}

#[tokio::test]
async fn unrestorable_demotion_names_the_demoted_link() {
    let linker = linker().await;
    let first = linker
        .link_entities("int-1", &[CandidateInput::new("dossier", "d0")], false)
        .await
        .unwrap();
    let old_id = first.outcome.created()[0].id.clone();
    linker.store().fail_after("create", 0);
    linker.store().fail_after("update", 1);

    let err = linker
        .link_entities("int-1", &[CandidateInput::new("position", "p1").primary()], true)
        .await
        .unwrap_err();
    let FlowError::PrimaryNotRestored { demoted, cause } = err else {
        panic!("expected PrimaryNotRestored");
    };
    assert_eq!(demoted, old_id);
    assert!(cause.is_conflict());
    assert!(primaries(&linker.view("int-1", false).await.unwrap()).is_empty());
}

// ---------------------------------------------------------------------------
// Rollback and partial success
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failed_create_rolls_back_to_snapshot() {
    let linker = linker().await;
    linker
        .link_entities("int-1", &topics(&["t0"]), false)
        .await
        .unwrap();
    let before = linker.view("int-1", false).await.unwrap();

    // the creation fails and so does the refetch, leaving the rolled-back view
    linker.store().fail_after("create", 0);
    linker.store().fail_after("list", 1);
    let err = linker
        .link_entities("int-1", &topics(&["t1"]), false)
        .await
        .unwrap_err();
    assert!(matches!(err, FlowError::Conflict { .. }));

    let entry = linker.cached(&CacheKey::active("int-1")).await.unwrap();
    assert_eq!(entry.links, before);
    assert!(entry.links.iter().all(|l| !is_temp_id(&l.id)));
    assert!(!entry.optimistic);
    assert!(entry.stale);
}

#[tokio::test]
async fn batch_partial_success_is_reported() {
    let linker = linker().await;
    linker.store().race_batch.store(true, Ordering::SeqCst);

    let outcome = linker
        .link_entities("int-1", &topics(&["t1", "t2", "t3"]), false)
        .await
        .unwrap();
    assert!(matches!(outcome.outcome, BatchOutcome::PartialSuccess { .. }));
    assert_eq!(outcome.outcome.created_count(), 2);
    assert_eq!(outcome.outcome.failed_count(), 1);
    assert_eq!(outcome.outcome.failures()[0].code, "DUPLICATE_LINK");
    assert_eq!(outcome.outcome.summary(), "2 linked, 1 failed");

    let view = linker.view("int-1", false).await.unwrap();
    let mut got: Vec<u32> = view.iter().map(|l| l.link_order).collect();
    got.sort_unstable();
    assert_eq!(got, vec![1, 2, 3]);
}

#[tokio::test]
async fn relinking_is_unchanged_and_creates_nothing() {
    let linker = linker().await;
    linker
        .link_entities("int-1", &topics(&["t1", "t2"]), false)
        .await
        .unwrap();
    linker.store().take_calls();

    let outcome = linker
        .link_entities("int-1", &topics(&["t2", "t1"]), false)
        .await
        .unwrap();
    assert_eq!(outcome.outcome, BatchOutcome::Unchanged);
    assert_eq!(outcome.skipped.len(), 2);
    assert_eq!(linker.store().take_calls(), vec!["list"]);
}

// ---------------------------------------------------------------------------
// Reorder, delete, restore
// ---------------------------------------------------------------------------

#[tokio::test]
async fn move_link_persists_full_renumbering() {
    let linker = linker().await;
    let created = linker
        .link_entities("int-1", &topics(&["t1", "t2", "t3"]), false)
        .await
        .unwrap();
    let ids: Vec<String> = created.outcome.created().iter().map(|l| l.id.clone()).collect();

    let moved = linker.move_link("int-1", &ids[2], &ids[0]).await.unwrap();
    assert_eq!(orders(&moved), vec![("t3", 1), ("t1", 2), ("t2", 3)]);
    assert_eq!(
        orders(&linker.view("int-1", false).await.unwrap()),
        vec![("t3", 1), ("t1", 2), ("t2", 3)]
    );
}

#[tokio::test]
async fn moving_onto_itself_calls_no_store_write() {
    let linker = linker().await;
    let created = linker
        .link_entities("int-1", &topics(&["t1", "t2"]), false)
        .await
        .unwrap();
    let id = created.outcome.created()[0].id.clone();
    linker.store().take_calls();

    linker.move_link("int-1", &id, &id).await.unwrap();
    assert_eq!(linker.store().take_calls(), vec!["list"]);
}

#[tokio::test]
async fn move_with_unknown_id_is_not_found() {
    let linker = linker().await;
    let created = linker
        .link_entities("int-1", &topics(&["t1"]), false)
        .await
        .unwrap();
    let id = created.outcome.created()[0].id.clone();
    let err = linker.move_link("int-1", &id, "lnk-missing").await.unwrap_err();
    assert!(matches!(err, FlowError::NotFound(_)));
}

#[tokio::test]
async fn delete_and_restore_keep_order_dense() {
    let linker = linker().await;
    let created = linker
        .link_entities("int-1", &topics(&["t1", "t2", "t3"]), false)
        .await
        .unwrap();
    let middle = created.outcome.created()[1].id.clone();

    linker.delete_link("int-1", &middle).await.unwrap();
    assert_eq!(
        orders(&linker.view("int-1", false).await.unwrap()),
        vec![("t1", 1), ("t3", 2)]
    );

    let restored = linker.restore_link("int-1", &middle).await.unwrap();
    assert!(restored.is_active());
    assert_eq!(
        orders(&linker.view("int-1", false).await.unwrap()),
        vec![("t1", 1), ("t3", 2), ("t2", 3)]
    );

    let err = linker.restore_link("int-1", &middle).await.unwrap_err();
    assert!(matches!(err, FlowError::InvalidState(_)));
}

#[tokio::test]
async fn notes_are_updated_with_current_version() {
    let linker = linker().await;
    let created = linker
        .link_entities("int-1", &topics(&["t1"]), false)
        .await
        .unwrap();
    let id = created.outcome.created()[0].id.clone();

    let first = linker
        .update_notes("int-1", &id, Some("context".into()))
        .await
        .unwrap();
    let second = linker.update_notes("int-1", &id, None).await.unwrap();
    assert_eq!(first.notes.as_deref(), Some("context"));
    assert_eq!(second.notes, None);
    assert_eq!(second.version, 3);

    let too_long = "x".repeat(1001);
    assert!(matches!(
        linker.update_notes("int-1", &id, Some(too_long)).await,
        Err(FlowError::Validation(_))
    ));
}

// ---------------------------------------------------------------------------
// Concurrency and session
// ---------------------------------------------------------------------------

#[tokio::test]
async fn concurrent_primary_requests_are_serialized() {
    let linker = Arc::new(linker().await);
    let mut tasks = Vec::new();
    for id in ["d1", "d2", "d3"] {
        let linker = Arc::clone(&linker);
        tasks.push(tokio::spawn(async move {
            linker
                .link_entities("int-1", &[CandidateInput::new("dossier", id).primary()], false)
                .await
        }));
    }
    let mut deferred = 0;
    for task in tasks {
        let outcome = task.await.unwrap().unwrap();
        deferred += usize::from(outcome.deferred_primary.is_some());
    }
    assert_eq!(deferred, 2);

    let view = linker.view("int-1", false).await.unwrap();
    assert_eq!(primaries(&view).len(), 1);
    let targets: HashSet<_> = view.iter().map(EntityLink::target).collect();
    assert_eq!(targets.len(), 3);
}

#[tokio::test]
async fn expired_session_blocks_every_operation() {
    let mut linker = linker().await;
    linker.set_session(Session::new(
        identity(),
        "tok",
        Some(Utc::now() - Duration::minutes(1)),
    ));
    assert!(matches!(
        linker.view("int-1", false).await,
        Err(FlowError::Unauthenticated(_))
    ));
    assert!(matches!(
        linker.delete_link("int-1", "lnk-1").await,
        Err(FlowError::Unauthenticated(_))
    ));
    assert!(linker.store().take_calls().is_empty());
}
