//! Optimistic projection of a pending mutation onto a cached link list.
//!
//! [`project`] never touches its input; it returns the list the user should see
//! until the store answers. Created rows get `temp-` ids and `_version` 1.

use chrono::{DateTime, Utc};
use linkage_core::entities::EntityLink;
use linkage_core::enums::{LinkType, RestorePlacement};
use linkage_core::ids::temp_id;
use linkage_core::requests::{CreateLinkRequest, LinkPatch};

use crate::error::EngineError;
use crate::reorder::reorder;

#[derive(Debug, Clone, PartialEq)]
pub enum PendingOp {
    Create { requests: Vec<CreateLinkRequest> },
    Delete { link_id: String },
    Reorder { moved_id: String, target_id: String },
    /// Re-admit a soft-deleted link.
    Restore { link: EntityLink },
    /// `link_type` / `notes` edits, including demotion and promotion.
    Patch { link_id: String, patch: LinkPatch },
}

impl PendingOp {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Delete { .. } => "delete",
            Self::Reorder { .. } => "reorder",
            Self::Restore { .. } => "restore",
            Self::Patch { .. } => "patch",
        }
    }

    /// Demotion or promotion expressed as a patch op.
    #[must_use]
    pub fn retype(link_id: &str, link_type: LinkType, expected_version: u32) -> Self {
        Self::Patch {
            link_id: link_id.to_string(),
            patch: LinkPatch::link_type(link_type, expected_version),
        }
    }
}

/// Values the projection stamps on rows it fabricates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectionContext {
    pub intake_id: String,
    pub actor: String,
    pub now: DateTime<Utc>,
    pub restore_placement: RestorePlacement,
}

impl ProjectionContext {
    pub fn new(intake_id: impl Into<String>, actor: impl Into<String>) -> Self {
        Self {
            intake_id: intake_id.into(),
            actor: actor.into(),
            now: Utc::now(),
            restore_placement: RestorePlacement::default(),
        }
    }
}

fn synthetic_link(
    request: &CreateLinkRequest,
    id: String,
    order: u32,
    ctx: &ProjectionContext,
) -> EntityLink {
    EntityLink {
        id,
        intake_id: ctx.intake_id.clone(),
        entity_type: request.entity_type,
        entity_id: request.entity_id.clone(),
        link_type: request.link_type,
        source: request.source,
        confidence: request.confidence,
        notes: request.notes.clone(),
        link_order: order,
        suggested_by: request.suggested_by.clone(),
        created_by: ctx.actor.clone(),
        created_at: ctx.now,
        updated_at: ctx.now,
        deleted_at: None,
        deleted_by: None,
        version: 1,
    }
}

fn project_create(
    current: &[EntityLink],
    requests: &[CreateLinkRequest],
    ctx: &ProjectionContext,
) -> Vec<EntityLink> {
    let millis = ctx.now.timestamp_millis();
    let mut max_order = current
        .iter()
        .filter(|l| l.is_active())
        .map(|l| l.link_order)
        .max()
        .unwrap_or(0);
    let multi = requests.len() > 1;

    let mut view = current.to_vec();
    for (i, request) in requests.iter().enumerate() {
        let order = request.link_order.unwrap_or(max_order + 1);
        max_order = max_order.max(order);
        let id = temp_id(millis, multi.then_some(i));
        view.push(synthetic_link(request, id, order, ctx));
    }
    view
}

fn project_restore(
    current: &[EntityLink],
    link: &EntityLink,
    ctx: &ProjectionContext,
) -> Vec<EntityLink> {
    let mut view: Vec<EntityLink> = current.iter().filter(|l| l.id != link.id).cloned().collect();
    let active_len = view.iter().filter(|l| l.is_active()).count();
    let slot = ctx.restore_placement.position(link.link_order, active_len);

    for other in view.iter_mut().filter(|l| l.is_active() && l.link_order >= slot) {
        other.link_order += 1;
    }

    let mut restored = link.clone();
    restored.deleted_at = None;
    restored.deleted_by = None;
    restored.link_order = slot;
    restored.updated_at = ctx.now;

    let at = view
        .iter()
        .position(|l| l.is_active() && l.link_order > slot)
        .unwrap_or(view.len());
    view.insert(at, restored);
    view
}

fn project_patch(
    current: &[EntityLink],
    link_id: &str,
    patch: &LinkPatch,
    ctx: &ProjectionContext,
) -> Result<Vec<EntityLink>, EngineError> {
    let mut view = current.to_vec();
    let link = view
        .iter_mut()
        .find(|l| l.id == link_id)
        .ok_or_else(|| EngineError::NotFound(link_id.to_string()))?;
    if let Some(link_type) = patch.link_type {
        link.link_type = link_type;
    }
    if let Some(notes) = &patch.notes {
        link.notes.clone_from(notes);
    }
    link.version += 1;
    link.updated_at = ctx.now;
    Ok(view)
}

/// Apply `op` to a copy of `current`.
///
/// # Errors
///
/// `NotFound` when a reorder or patch names a link missing from `current`.
pub fn project(
    current: &[EntityLink],
    op: &PendingOp,
    ctx: &ProjectionContext,
) -> Result<Vec<EntityLink>, EngineError> {
    match op {
        PendingOp::Create { requests } => Ok(project_create(current, requests, ctx)),
        PendingOp::Delete { link_id } => {
            Ok(current.iter().filter(|l| &l.id != link_id).cloned().collect())
        }
        PendingOp::Reorder {
            moved_id,
            target_id,
        } => reorder(current, moved_id, target_id).map(|outcome| outcome.links),
        PendingOp::Restore { link } => Ok(project_restore(current, link, ctx)),
        PendingOp::Patch { link_id, patch } => project_patch(current, link_id, patch, ctx),
    }
}
