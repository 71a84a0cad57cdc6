//! Caller-side link operations over a [`LinkStore`].
//!
//! Every mutation runs the same sequence:
//! 1. Check the session (fails before any other work)
//! 2. Take the intake's turn in the [`IntakeQueue`]
//! 3. Fetch the authoritative active links
//! 4. Plan (reconcile, reorder) and project the result into the cache
//! 5. Call the store: demotion, then promotion, then creation
//! 6. Settle: on failure roll the cache back to the pre-operation snapshot,
//!    then invalidate the intake and refetch
//!
//! A demotion that persisted is undone when the replacement primary does not
//! land, so a failed replacement never leaves the intake without a primary.

use linkage_core::entities::{EntityLink, TargetKey};
use linkage_core::enums::{LinkSource, LinkType};
use linkage_core::requests::{AcceptSuggestionRequest, BatchCreateRequest, LinkPatch, ReorderRequest};
use linkage_core::responses::BatchOutcome;
use linkage_engine::{
    CacheEntry, CacheKey, CandidateInput, LinkCache, LinkRules, PendingOp, ProjectionContext,
    ReconcilePlan, Snapshot, reconcile, reorder,
};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::error::FlowError;
use crate::queue::IntakeQueue;
use crate::session::Session;
use crate::store::{LinkStore, StoreError};

/// Result of [`Linker::link_entities`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkOutcome {
    pub outcome: BatchOutcome,
    /// Link that lost primary status, if any.
    pub demoted: Option<String>,
    /// Existing link that became primary, if any.
    pub promoted: Option<String>,
    pub skipped: Vec<TargetKey>,
    /// Primary requested while another exists and not confirmed. Re-run with
    /// `force_primary` to replace it.
    pub deferred_primary: Option<TargetKey>,
}

impl LinkOutcome {
    fn unchanged(plan: ReconcilePlan) -> Self {
        Self {
            outcome: BatchOutcome::Unchanged,
            demoted: None,
            promoted: None,
            skipped: plan.skipped,
            deferred_primary: plan.deferred_primary,
        }
    }
}

pub struct Linker<S> {
    store: S,
    session: Session,
    rules: LinkRules,
    queue: IntakeQueue,
    cache: Mutex<LinkCache>,
}

impl<S: LinkStore> Linker<S> {
    pub fn new(store: S, session: Session, rules: LinkRules) -> Self {
        Self {
            store,
            session,
            rules,
            queue: IntakeQueue::new(),
            cache: Mutex::new(LinkCache::new()),
        }
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Swap in a refreshed session.
    pub fn set_session(&mut self, session: Session) {
        self.session = session;
    }

    /// Current cache entry for a view, for inspection.
    pub async fn cached(&self, key: &CacheKey) -> Option<CacheEntry> {
        self.cache.lock().await.get(key).cloned()
    }

    fn gate(&self) -> Result<(), FlowError> {
        self.session.bearer().map(|_| ())
    }

    fn context(&self, intake_id: &str) -> ProjectionContext {
        ProjectionContext {
            restore_placement: self.rules.restore_placement,
            ..ProjectionContext::new(intake_id, self.session.identity().user_id.as_str())
        }
    }

    async fn fetch(&self, key: &CacheKey) -> Result<Vec<EntityLink>, FlowError> {
        let links = self
            .store
            .list_links(&key.intake_id, key.include_deleted)
            .await?;
        self.cache.lock().await.put(key.clone(), links.clone());
        Ok(links)
    }

    async fn project(
        &self,
        intake_id: &str,
        ops: &[PendingOp],
        snapshots: &mut Vec<Snapshot>,
    ) -> Result<(), FlowError> {
        let key = CacheKey::active(intake_id);
        let ctx = self.context(intake_id);
        let mut cache = self.cache.lock().await;
        for op in ops {
            snapshots.push(cache.apply(&key, op, &ctx)?);
        }
        Ok(())
    }

    /// Project `ops`, settling right away when one of them cannot be
    /// projected so earlier projections do not linger in the cache.
    async fn project_or_settle(
        &self,
        intake_id: &str,
        ops: &[PendingOp],
    ) -> Result<Vec<Snapshot>, FlowError> {
        let mut snapshots = Vec::new();
        match self.project(intake_id, ops, &mut snapshots).await {
            Ok(()) => Ok(snapshots),
            Err(err) => self.settle(intake_id, snapshots, Err(err)).await,
        }
    }

    /// Resolve `result`, rolling the optimistic projection back when it is an
    /// error, then invalidate the intake's views and refetch the active list.
    async fn settle<T>(
        &self,
        intake_id: &str,
        snapshots: Vec<Snapshot>,
        result: Result<T, FlowError>,
    ) -> Result<T, FlowError> {
        {
            let mut cache = self.cache.lock().await;
            if result.is_err() {
                for snapshot in snapshots.into_iter().rev() {
                    if !cache.rollback(snapshot) {
                        tracing::debug!(intake_id, "snapshot superseded, rollback skipped");
                    }
                }
            }
            cache.invalidate_intake(intake_id);
        }
        if let Err(err) = self.fetch(&CacheKey::active(intake_id)).await {
            tracing::warn!(intake_id, %err, "refetch after settle failed, view left stale");
        }
        let pruned = self.queue.prune().await;
        if pruned > 0 {
            tracing::trace!(pruned, "idle intake locks dropped");
        }
        result
    }

    /// Read a view, from cache when fresh.
    ///
    /// # Errors
    ///
    /// `Unauthenticated` without a valid session; store errors otherwise.
    pub async fn view(
        &self,
        intake_id: &str,
        include_deleted: bool,
    ) -> Result<Vec<EntityLink>, FlowError> {
        self.gate()?;
        let key = CacheKey {
            intake_id: intake_id.to_string(),
            include_deleted,
        };
        if let Some(links) = self.cache.lock().await.fresh(&key) {
            return Ok(links.to_vec());
        }
        self.fetch(&key).await
    }

    /// Link the selected entities to an intake.
    ///
    /// A primary replacement demotes the old primary first; if that fails
    /// nothing is created. Batch partial success is reported through
    /// [`LinkOutcome::outcome`], not as an error.
    ///
    /// # Errors
    ///
    /// - `Unauthenticated` before any work.
    /// - `Validation` / `InvalidEntityType` for a bad selection, before any
    ///   store call.
    /// - `Conflict` when the store rejects a demotion, promotion or single
    ///   create. The view is rolled back and refetched, and a demotion that
    ///   already persisted is reverted.
    /// - `PrimaryNotRestored` when that revert fails too.
    pub async fn link_entities(
        &self,
        intake_id: &str,
        candidates: &[CandidateInput],
        force_primary: bool,
    ) -> Result<LinkOutcome, FlowError> {
        self.gate()?;
        if candidates.is_empty() {
            return Err(FlowError::Validation("no entities selected".into()));
        }
        let _turn = self.queue.acquire(intake_id).await;

        let existing = self.fetch(&CacheKey::active(intake_id)).await?;
        let plan = reconcile(candidates, force_primary, &existing, &self.rules)?;
        if plan.is_noop() {
            tracing::debug!(intake_id, skipped = plan.skipped.len(), "selection already linked");
            return Ok(LinkOutcome::unchanged(plan));
        }

        let mut ops = Vec::new();
        for change in plan.demotion.iter().chain(plan.promotion.iter()) {
            ops.push(PendingOp::retype(&change.link_id, change.to, change.expected_version));
        }
        if !plan.creates.is_empty() {
            ops.push(PendingOp::Create {
                requests: plan.creates.clone(),
            });
        }
        let mut snapshots = self.project_or_settle(intake_id, &ops).await?;

        let result = self.apply_plan(intake_id, &plan).await;
        let result = match result {
            Ok(outcome) if matches!(outcome.outcome, BatchOutcome::Failed { .. }) => {
                // nothing was created, show the pre-operation view again
                let mut cache = self.cache.lock().await;
                for snapshot in snapshots.drain(..).rev() {
                    cache.rollback(snapshot);
                }
                Ok(outcome)
            }
            other => other,
        };
        let outcome = self.settle(intake_id, snapshots, result).await?;
        tracing::info!(intake_id, summary = %outcome.outcome.summary(), "entities linked");
        Ok(outcome)
    }

    async fn apply_plan(
        &self,
        intake_id: &str,
        plan: &ReconcilePlan,
    ) -> Result<LinkOutcome, FlowError> {
        let Some(change) = &plan.demotion else {
            return self.apply_rest(intake_id, plan, None).await;
        };
        let demoted = self
            .store
            .update_link(intake_id, &change.link_id, &change.to_patch())
            .await
            .inspect_err(|err| {
                tracing::warn!(intake_id, link_id = %change.link_id, %err, "demotion failed, nothing created");
            })?;

        match self.apply_rest(intake_id, plan, Some(demoted.id.clone())).await {
            Ok(outcome) if outcome.promoted.is_some() || has_primary(&outcome.outcome) => Ok(outcome),
            Ok(outcome) => match self.revert_demotion(intake_id, &demoted).await {
                Ok(()) => Ok(LinkOutcome {
                    demoted: None,
                    ..outcome
                }),
                Err(err) => {
                    tracing::warn!(intake_id, link_id = %demoted.id, %err, "replacement primary not created, demotion stands");
                    Ok(outcome)
                }
            },
            Err(err) => match self.revert_demotion(intake_id, &demoted).await {
                Ok(()) => Err(err),
                Err(revert) => {
                    tracing::error!(intake_id, link_id = %demoted.id, %err, %revert, "intake left without a primary");
                    Err(FlowError::PrimaryNotRestored {
                        demoted: demoted.id,
                        cause: Box::new(err),
                    })
                }
            },
        }
    }

    /// Promotion and creation, the steps after a demotion.
    async fn apply_rest(
        &self,
        intake_id: &str,
        plan: &ReconcilePlan,
        demoted: Option<String>,
    ) -> Result<LinkOutcome, FlowError> {
        let mut promoted = None;
        if let Some(change) = &plan.promotion {
            let link = self
                .store
                .update_link(intake_id, &change.link_id, &change.to_patch())
                .await?;
            promoted = Some(link.id);
        }

        let outcome = match plan.creates.as_slice() {
            [] => BatchOutcome::Unchanged,
            [single] => {
                let link = self.store.create_link(intake_id, single).await?;
                BatchOutcome::Created { links: vec![link] }
            }
            many => {
                let batch = BatchCreateRequest {
                    links: many.to_vec(),
                };
                BatchOutcome::from(self.store.create_links_batch(intake_id, &batch).await?)
            }
        };

        Ok(LinkOutcome {
            outcome,
            demoted,
            promoted,
            skipped: plan.skipped.clone(),
            deferred_primary: plan.deferred_primary.clone(),
        })
    }

    /// Make the link demoted by this operation primary again. Guarded by the
    /// version the demotion returned.
    async fn revert_demotion(&self, intake_id: &str, demoted: &EntityLink) -> Result<(), FlowError> {
        let patch = LinkPatch::link_type(LinkType::Primary, demoted.version);
        self.store
            .update_link(intake_id, &demoted.id, &patch)
            .await?;
        tracing::info!(intake_id, link_id = %demoted.id, "replacement failed, previous primary restored");
        Ok(())
    }

    /// Accept an AI suggestion through the regular linking path.
    ///
    /// A suggested `primary` is requested, not forced: an existing primary
    /// stays and the suggestion comes back as `deferred_primary`.
    ///
    /// # Errors
    ///
    /// See [`Self::link_entities`].
    pub async fn accept_suggestion(
        &self,
        intake_id: &str,
        request: &AcceptSuggestionRequest,
        confidence: Option<f64>,
    ) -> Result<LinkOutcome, FlowError> {
        let mut candidate = CandidateInput::new(request.entity_type.as_str(), &request.entity_id);
        candidate = if request.link_type == LinkType::Primary {
            candidate.primary()
        } else {
            candidate.hint(request.link_type)
        };
        candidate.source = LinkSource::Ai;
        candidate.confidence = confidence;
        candidate.suggested_by = Some(request.suggestion_id.clone());
        self.link_entities(intake_id, &[candidate], false).await
    }

    async fn find_link(
        &self,
        intake_id: &str,
        link_id: &str,
        include_deleted: bool,
    ) -> Result<EntityLink, FlowError> {
        let key = CacheKey {
            intake_id: intake_id.to_string(),
            include_deleted,
        };
        self.fetch(&key)
            .await?
            .into_iter()
            .find(|l| l.id == link_id)
            .ok_or_else(|| FlowError::NotFound(format!("link {link_id}")))
    }

    async fn mutate<T, F>(
        &self,
        intake_id: &str,
        ops: &[PendingOp],
        call: F,
    ) -> Result<T, FlowError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        let snapshots = self.project_or_settle(intake_id, ops).await?;
        let result = call.await.map_err(FlowError::from);
        self.settle(intake_id, snapshots, result).await
    }

    /// Replace or clear the notes of a link.
    ///
    /// # Errors
    ///
    /// `Validation` for over-long notes, `NotFound` for an unknown link,
    /// `Conflict` when the link changed concurrently.
    pub async fn update_notes(
        &self,
        intake_id: &str,
        link_id: &str,
        notes: Option<String>,
    ) -> Result<EntityLink, FlowError> {
        self.gate()?;
        self.rules.check_notes(notes.as_deref())?;
        let _turn = self.queue.acquire(intake_id).await;

        let link = self.find_link(intake_id, link_id, false).await?;
        let patch = LinkPatch::notes(notes, link.version);
        let op = PendingOp::Patch {
            link_id: link_id.to_string(),
            patch: patch.clone(),
        };
        self.mutate(
            intake_id,
            &[op],
            self.store.update_link(intake_id, link_id, &patch),
        )
        .await
    }

    /// Soft-delete a link.
    ///
    /// # Errors
    ///
    /// `NotFound` when the link is not active on the intake.
    pub async fn delete_link(&self, intake_id: &str, link_id: &str) -> Result<EntityLink, FlowError> {
        self.gate()?;
        let _turn = self.queue.acquire(intake_id).await;

        self.find_link(intake_id, link_id, false).await?;
        let op = PendingOp::Delete {
            link_id: link_id.to_string(),
        };
        self.mutate(intake_id, &[op], self.store.delete_link(intake_id, link_id))
            .await
    }

    /// Bring back a soft-deleted link.
    ///
    /// # Errors
    ///
    /// `InvalidState` when the link is not deleted, `Conflict` when its
    /// target or role was taken meanwhile.
    pub async fn restore_link(
        &self,
        intake_id: &str,
        link_id: &str,
    ) -> Result<EntityLink, FlowError> {
        self.gate()?;
        let _turn = self.queue.acquire(intake_id).await;

        let link = self.find_link(intake_id, link_id, true).await?;
        if link.is_active() {
            return Err(FlowError::InvalidState(format!("link {link_id} is not deleted")));
        }
        self.fetch(&CacheKey::active(intake_id)).await?;
        let op = PendingOp::Restore { link };
        self.mutate(intake_id, &[op], self.store.restore_link(intake_id, link_id))
            .await
    }

    /// Drag-and-drop move of `moved_id` onto the slot of `target_id`.
    /// Moving a link onto itself changes nothing and calls no store.
    ///
    /// # Errors
    ///
    /// `NotFound` when either id is not an active link of the intake.
    pub async fn move_link(
        &self,
        intake_id: &str,
        moved_id: &str,
        target_id: &str,
    ) -> Result<Vec<EntityLink>, FlowError> {
        self.gate()?;
        let _turn = self.queue.acquire(intake_id).await;

        let current = self.fetch(&CacheKey::active(intake_id)).await?;
        let outcome = reorder(&current, moved_id, target_id)?;
        if outcome.is_noop() {
            return Ok(current);
        }
        let op = PendingOp::Reorder {
            moved_id: moved_id.to_string(),
            target_id: target_id.to_string(),
        };
        let request = ReorderRequest {
            link_orders: outcome.orders,
        };
        self.mutate(intake_id, &[op], self.store.reorder_links(intake_id, &request))
            .await
    }
}

fn has_primary(outcome: &BatchOutcome) -> bool {
    outcome.created().iter().any(EntityLink::is_primary)
}
