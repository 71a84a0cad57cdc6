//! Intake entity link repository.
//!
//! Links are never hard-deleted. Delete sets `deleted_at` and closes the gap
//! in the active ordering; restore re-admits the row per the configured
//! placement. Every successful write bumps `_version` on each row it touches.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use linkage_core::audit_detail::{LinkTypeChangedDetail, LinkedDetail, ReorderedDetail};
use linkage_core::entities::{EntityLink, TargetKey};
use linkage_core::enums::{AuditAction, LinkType, TrailOp};
use linkage_core::ids::PREFIX_LINK;
use linkage_core::requests::{
    BatchCreateRequest, BatchCreateResponse, CreateLinkRequest, FailureDetail, LinkOrder,
    LinkPatch, ReorderRequest,
};
use linkage_core::trail::TrailOperation;
use linkage_engine::renumber;

use crate::error::{DatabaseError, codes, map_unique};
use crate::helpers::{
    get_opt_string, get_u32, parse_datetime, parse_enum, parse_optional_datetime, to_json,
};
use crate::service::LinkService;

pub(crate) const LINK_COLUMNS: &str = "id, intake_id, entity_type, entity_id, link_type, source, \
     confidence, notes, link_order, suggested_by, created_by, created_at, updated_at, \
     deleted_at, deleted_by, version";

pub(crate) fn row_to_link(row: &libsql::Row) -> Result<EntityLink, DatabaseError> {
    Ok(EntityLink {
        id: row.get::<String>(0)?,
        intake_id: row.get::<String>(1)?,
        entity_type: parse_enum(&row.get::<String>(2)?)?,
        entity_id: row.get::<String>(3)?,
        link_type: parse_enum(&row.get::<String>(4)?)?,
        source: parse_enum(&row.get::<String>(5)?)?,
        confidence: row.get::<Option<f64>>(6)?,
        notes: get_opt_string(row, 7)?,
        link_order: get_u32(row, 8)?,
        suggested_by: get_opt_string(row, 9)?,
        created_by: row.get::<String>(10)?,
        created_at: parse_datetime(&row.get::<String>(11)?)?,
        updated_at: parse_datetime(&row.get::<String>(12)?)?,
        deleted_at: parse_optional_datetime(get_opt_string(row, 13)?.as_deref())?,
        deleted_by: get_opt_string(row, 14)?,
        version: get_u32(row, 15)?,
    })
}

fn singular_conflict(link_type: LinkType) -> DatabaseError {
    match link_type {
        LinkType::AssignedTo => DatabaseError::conflict(
            codes::DUPLICATE_ASSIGNED_LINK,
            "intake already has an active assigned_to link",
        ),
        _ => DatabaseError::conflict(
            codes::DUPLICATE_PRIMARY_LINK,
            "intake already has an active primary link",
        ),
    }
}

/// Reject a second active primary or assignee. `excluding` is the link
/// being changed, which may already hold the type.
fn check_singular(
    active: &[EntityLink],
    link_type: LinkType,
    excluding: Option<&str>,
) -> Result<(), DatabaseError> {
    if !link_type.is_singular() {
        return Ok(());
    }
    let taken = active
        .iter()
        .any(|l| l.link_type == link_type && Some(l.id.as_str()) != excluding);
    if taken {
        return Err(singular_conflict(link_type));
    }
    Ok(())
}

fn check_target(active: &[EntityLink], target: &TargetKey) -> Result<(), DatabaseError> {
    if let Some(existing) = active.iter().find(|l| &l.target() == target) {
        return Err(DatabaseError::conflict(
            codes::DUPLICATE_LINK,
            format!("{target} is already linked as {}", existing.id),
        ));
    }
    Ok(())
}

fn next_order(active: &[EntityLink]) -> u32 {
    active.iter().map(|l| l.link_order).max().unwrap_or(0) + 1
}

fn linked_detail(link: &EntityLink) -> LinkedDetail {
    LinkedDetail {
        entity_type: link.entity_type.as_str().to_string(),
        entity_id: link.entity_id.clone(),
        link_type: link.link_type.as_str().to_string(),
    }
}

impl LinkService {
    fn trail_op(
        &self,
        op: TrailOp,
        intake_id: &str,
        link_id: &str,
        data: serde_json::Value,
        at: DateTime<Utc>,
    ) -> TrailOperation {
        TrailOperation {
            v: 1,
            ts: at.to_rfc3339(),
            actor: self.actor().to_string(),
            op,
            intake: intake_id.to_string(),
            id: link_id.to_string(),
            data,
        }
    }

    fn check_request(&self, request: &CreateLinkRequest) -> Result<(), DatabaseError> {
        if request.entity_id.trim().is_empty() {
            return Err(DatabaseError::Validation("entity_id must not be empty".into()));
        }
        self.rules()
            .check_link_type(request.link_type, request.entity_type)?;
        self.rules().check_notes(request.notes.as_deref())?;
        if let Some(score) = request.confidence
            && !(0.0..=1.0).contains(&score)
        {
            return Err(DatabaseError::Validation(format!(
                "confidence {score} outside 0..=1"
            )));
        }
        Ok(())
    }

    /// Links of one intake ordered by `link_order`. With `include_deleted`,
    /// soft-deleted rows follow the active ones.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_links(
        &self,
        intake_id: &str,
        include_deleted: bool,
    ) -> Result<Vec<EntityLink>, DatabaseError> {
        let sql = if include_deleted {
            format!(
                "SELECT {LINK_COLUMNS} FROM intake_entity_links WHERE intake_id = ?1
                 ORDER BY deleted_at IS NOT NULL, link_order, created_at, id"
            )
        } else {
            format!(
                "SELECT {LINK_COLUMNS} FROM intake_entity_links
                 WHERE intake_id = ?1 AND deleted_at IS NULL
                 ORDER BY link_order, created_at, id"
            )
        };
        let mut rows = self.db().conn().query(&sql, [intake_id]).await?;
        let mut links = Vec::new();
        while let Some(row) = rows.next().await? {
            links.push(row_to_link(&row)?);
        }
        Ok(links)
    }

    /// # Errors
    ///
    /// `NotFound` when no link with this id belongs to the intake.
    pub async fn get_link(&self, intake_id: &str, link_id: &str) -> Result<EntityLink, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {LINK_COLUMNS} FROM intake_entity_links WHERE id = ?1 AND intake_id = ?2"
                ),
                [link_id, intake_id],
            )
            .await?;
        let row = rows.next().await?.ok_or_else(|| DatabaseError::NotFound {
            entity: "link",
            id: link_id.to_string(),
        })?;
        row_to_link(&row)
    }

    async fn get_active_link(
        &self,
        intake_id: &str,
        link_id: &str,
    ) -> Result<EntityLink, DatabaseError> {
        let link = self.get_link(intake_id, link_id).await?;
        if !link.is_active() {
            return Err(DatabaseError::NotFound {
                entity: "active link",
                id: link_id.to_string(),
            });
        }
        Ok(link)
    }

    /// Create one link at the end of the intake's active ordering.
    ///
    /// The request's `link_order` is not used; the store always appends so
    /// the ordering stays dense.
    ///
    /// # Errors
    ///
    /// - `Validation` for an empty id, a link type the entity type does not
    ///   allow, over-long notes, or a confidence outside 0..=1.
    /// - `Conflict` when the target is already actively linked or a second
    ///   primary or assignee would appear.
    pub async fn create_link(
        &self,
        intake_id: &str,
        request: &CreateLinkRequest,
    ) -> Result<EntityLink, DatabaseError> {
        let _guard = self.write_guard().await;
        self.insert_link(intake_id, request).await
    }

    async fn insert_link(
        &self,
        intake_id: &str,
        request: &CreateLinkRequest,
    ) -> Result<EntityLink, DatabaseError> {
        self.check_request(request)?;
        let active = self.list_links(intake_id, false).await?;
        let entity_id = request.entity_id.trim();
        check_target(&active, &TargetKey::new(request.entity_type, entity_id))?;
        check_singular(&active, request.link_type, None)?;

        let now = Utc::now();
        let id = self.db().generate_id(PREFIX_LINK).await?;
        let link = EntityLink {
            id,
            intake_id: intake_id.to_string(),
            entity_type: request.entity_type,
            entity_id: entity_id.to_string(),
            link_type: request.link_type,
            source: request.source,
            confidence: request.confidence,
            notes: request.notes.clone(),
            link_order: next_order(&active),
            suggested_by: request.suggested_by.clone(),
            created_by: self.actor().to_string(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
            deleted_by: None,
            version: 1,
        };

        self.db()
            .conn()
            .execute(
                "INSERT INTO intake_entity_links (id, intake_id, entity_type, entity_id, link_type, source,
                     confidence, notes, link_order, suggested_by, created_by, created_at, updated_at, version)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12, 1)",
                libsql::params![
                    link.id.as_str(),
                    link.intake_id.as_str(),
                    link.entity_type.as_str(),
                    link.entity_id.as_str(),
                    link.link_type.as_str(),
                    link.source.as_str(),
                    link.confidence,
                    link.notes.as_deref(),
                    i64::from(link.link_order),
                    link.suggested_by.as_deref(),
                    link.created_by.as_str(),
                    now.to_rfc3339()
                ],
            )
            .await
            .map_err(map_unique)?;

        self.record_audit(
            intake_id,
            &link.id,
            AuditAction::Created,
            to_json(&linked_detail(&link))?,
            now,
        )
        .await?;
        self.trail().append(&self.trail_op(
            TrailOp::Create,
            intake_id,
            &link.id,
            to_json(&link)?,
            now,
        ))?;

        tracing::debug!(intake_id, link_id = %link.id, link_type = %link.link_type, "link created");
        Ok(link)
    }

    /// Create several links, collecting per-item failures.
    ///
    /// Items are applied in order; a conflict or validation failure on one
    /// item is reported in `failed_links` and the rest still run.
    ///
    /// # Errors
    ///
    /// `Validation` when the batch is empty or larger than the configured
    /// limit. Database failures abort the remaining items.
    pub async fn create_links_batch(
        &self,
        intake_id: &str,
        batch: &BatchCreateRequest,
    ) -> Result<BatchCreateResponse, DatabaseError> {
        self.rules().check_batch_len(batch.links.len())?;
        let _guard = self.write_guard().await;

        let mut response = BatchCreateResponse::default();
        for (index, request) in batch.links.iter().enumerate() {
            match self.insert_link(intake_id, request).await {
                Ok(link) => response.created_links.push(link),
                Err(err) if err.is_item_failure() => {
                    tracing::debug!(intake_id, index, %err, "batch item rejected");
                    response.failed_links.push(FailureDetail {
                        index,
                        entity_type: request.entity_type,
                        entity_id: request.entity_id.clone(),
                        code: err.code().to_string(),
                        message: err.to_string(),
                    });
                }
                Err(err) => return Err(err),
            }
        }
        Ok(response)
    }

    /// Apply a `link_type` / `notes` patch if `patch.expected_version`
    /// matches the stored `_version`.
    ///
    /// # Errors
    ///
    /// - `NotFound` for a missing or soft-deleted link.
    /// - `VersionConflict` when the version moved on.
    /// - `Conflict` when the new type would duplicate a primary or assignee.
    /// - `Validation` for a disallowed type or over-long notes.
    pub async fn update_link(
        &self,
        intake_id: &str,
        link_id: &str,
        patch: &LinkPatch,
    ) -> Result<EntityLink, DatabaseError> {
        let _guard = self.write_guard().await;
        let link = self.get_active_link(intake_id, link_id).await?;
        if link.version != patch.expected_version {
            return Err(DatabaseError::VersionConflict {
                link_id: link_id.to_string(),
                expected: patch.expected_version,
                actual: link.version,
            });
        }
        if patch.is_empty() {
            return Ok(link);
        }

        let mut sets = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();
        let mut idx = 1usize;

        if let Some(link_type) = patch.link_type {
            self.rules().check_link_type(link_type, link.entity_type)?;
            if link_type != link.link_type {
                let active = self.list_links(intake_id, false).await?;
                check_singular(&active, link_type, Some(link_id))?;
            }
            sets.push(format!("link_type = ?{idx}"));
            params.push(link_type.as_str().into());
            idx += 1;
        }
        if let Some(ref notes) = patch.notes {
            self.rules().check_notes(notes.as_deref())?;
            sets.push(format!("notes = ?{idx}"));
            params.push(notes.clone().map_or(libsql::Value::Null, Into::into));
            idx += 1;
        }

        let now = Utc::now();
        sets.push(format!("updated_at = ?{idx}"));
        params.push(now.to_rfc3339().into());
        idx += 1;
        sets.push("version = version + 1".to_string());

        params.push(link_id.into());
        params.push(intake_id.into());
        params.push(i64::from(patch.expected_version).into());
        let sql = format!(
            "UPDATE intake_entity_links SET {} WHERE id = ?{idx} AND intake_id = ?{} AND version = ?{} AND deleted_at IS NULL",
            sets.join(", "),
            idx + 1,
            idx + 2
        );
        let changed = self
            .db()
            .conn()
            .execute(&sql, libsql::params_from_iter(params))
            .await
            .map_err(map_unique)?;
        if changed == 0 {
            let current = self.get_link(intake_id, link_id).await?;
            return Err(DatabaseError::VersionConflict {
                link_id: link_id.to_string(),
                expected: patch.expected_version,
                actual: current.version,
            });
        }

        let updated = self.get_link(intake_id, link_id).await?;
        let (action, detail) = match (link.link_type, updated.link_type) {
            (from, to) if from != to && (from == LinkType::Primary || to == LinkType::Primary) => {
                let action = if to == LinkType::Primary {
                    AuditAction::Promoted
                } else {
                    AuditAction::Demoted
                };
                let detail = LinkTypeChangedDetail {
                    from: from.as_str().to_string(),
                    to: to.as_str().to_string(),
                };
                (action, to_json(&detail)?)
            }
            _ => (AuditAction::Updated, to_json(patch)?),
        };
        self.record_audit(intake_id, link_id, action, detail, now).await?;
        self.trail().append(&self.trail_op(
            TrailOp::Update,
            intake_id,
            link_id,
            to_json(patch)?,
            now,
        ))?;

        tracing::debug!(intake_id, link_id, action = %action, version = updated.version, "link updated");
        Ok(updated)
    }

    /// Rewrite `link_order` for the given ids inside an open transaction,
    /// bumping `_version` on each row. Returns the rows actually moved as
    /// `(link_id, from, to)`.
    async fn write_orders(
        tx: &libsql::Transaction,
        before: &HashMap<String, u32>,
        orders: &[LinkOrder],
        at: DateTime<Utc>,
    ) -> Result<Vec<(String, u32, u32)>, DatabaseError> {
        let mut moved = Vec::new();
        for order in orders {
            let Some(&from) = before.get(&order.link_id) else {
                continue;
            };
            if from == order.link_order {
                continue;
            }
            tx.execute(
                "UPDATE intake_entity_links
                 SET link_order = ?1, version = version + 1, updated_at = ?2
                 WHERE id = ?3 AND deleted_at IS NULL",
                libsql::params![
                    i64::from(order.link_order),
                    at.to_rfc3339(),
                    order.link_id.as_str()
                ],
            )
            .await?;
            moved.push((order.link_id.clone(), from, order.link_order));
        }
        Ok(moved)
    }

    /// Soft-delete a link and renumber the remaining active links densely.
    /// The deleted row keeps its last `link_order`.
    ///
    /// # Errors
    ///
    /// `NotFound` for a missing or already deleted link.
    pub async fn delete_link(
        &self,
        intake_id: &str,
        link_id: &str,
    ) -> Result<EntityLink, DatabaseError> {
        let _guard = self.write_guard().await;
        let link = self.get_active_link(intake_id, link_id).await?;
        let mut remaining: Vec<EntityLink> = self
            .list_links(intake_id, false)
            .await?
            .into_iter()
            .filter(|l| l.id != link_id)
            .collect();
        let before: HashMap<String, u32> = remaining
            .iter()
            .map(|l| (l.id.clone(), l.link_order))
            .collect();
        let orders = renumber(&mut remaining);

        let now = Utc::now();
        let tx = self.db().conn().transaction().await?;
        tx.execute(
            "UPDATE intake_entity_links
             SET deleted_at = ?1, deleted_by = ?2, updated_at = ?1, version = version + 1
             WHERE id = ?3 AND intake_id = ?4 AND deleted_at IS NULL",
            libsql::params![now.to_rfc3339(), self.actor(), link_id, intake_id],
        )
        .await?;
        let compacted = Self::write_orders(&tx, &before, &orders, now).await?;
        tx.commit().await?;

        self.record_audit(
            intake_id,
            link_id,
            AuditAction::Deleted,
            to_json(&linked_detail(&link))?,
            now,
        )
        .await?;
        let deleted = self.get_link(intake_id, link_id).await?;
        self.trail().append(&self.trail_op(
            TrailOp::Delete,
            intake_id,
            link_id,
            serde_json::json!({
                "deleted_at": now.to_rfc3339(),
                "_version": deleted.version,
                "compacted": compacted.len(),
            }),
            now,
        ))?;

        tracing::debug!(intake_id, link_id, compacted = compacted.len(), "link deleted");
        Ok(deleted)
    }

    /// Clear the soft-delete marker and re-admit the link into the ordering
    /// according to the configured restore placement.
    ///
    /// # Errors
    ///
    /// - `NotFound` for a missing link.
    /// - `InvalidState` when the link is not deleted.
    /// - `Conflict` when its target was linked again meanwhile, or it is a
    ///   primary / assignee and the intake already has an active one.
    pub async fn restore_link(
        &self,
        intake_id: &str,
        link_id: &str,
    ) -> Result<EntityLink, DatabaseError> {
        let _guard = self.write_guard().await;
        let link = self.get_link(intake_id, link_id).await?;
        if link.is_active() {
            return Err(DatabaseError::InvalidState(format!(
                "link {link_id} is not deleted"
            )));
        }
        let active = self.list_links(intake_id, false).await?;
        check_target(&active, &link.target())?;
        check_singular(&active, link.link_type, None)?;

        let slot = self
            .rules()
            .restore_placement
            .position(link.link_order, active.len());
        let now = Utc::now();
        let tx = self.db().conn().transaction().await?;
        tx.execute(
            "UPDATE intake_entity_links
             SET link_order = link_order + 1, version = version + 1, updated_at = ?1
             WHERE intake_id = ?2 AND deleted_at IS NULL AND link_order >= ?3",
            libsql::params![now.to_rfc3339(), intake_id, i64::from(slot)],
        )
        .await?;
        tx.execute(
            "UPDATE intake_entity_links
             SET deleted_at = NULL, deleted_by = NULL, link_order = ?1,
                 version = version + 1, updated_at = ?2
             WHERE id = ?3 AND intake_id = ?4 AND deleted_at IS NOT NULL",
            libsql::params![i64::from(slot), now.to_rfc3339(), link_id, intake_id],
        )
        .await
        .map_err(map_unique)?;
        tx.commit().await?;

        let detail = ReorderedDetail {
            from: link.link_order,
            to: slot,
        };
        self.record_audit(intake_id, link_id, AuditAction::Restored, to_json(&detail)?, now)
            .await?;
        self.trail().append(&self.trail_op(
            TrailOp::Restore,
            intake_id,
            link_id,
            serde_json::json!({ "link_order": slot }),
            now,
        ))?;

        tracing::debug!(intake_id, link_id, slot, placement = %self.rules().restore_placement, "link restored");
        self.get_link(intake_id, link_id).await
    }

    /// Persist a full reordering of the intake's active links.
    ///
    /// `request.link_orders` must name every active link exactly once and
    /// assign the orders `1..=N`.
    ///
    /// # Errors
    ///
    /// - `NotFound` for an id that is not an active link of the intake.
    /// - `Validation` for missing or repeated ids, or orders that are not
    ///   a permutation of `1..=N`.
    pub async fn reorder_links(
        &self,
        intake_id: &str,
        request: &ReorderRequest,
    ) -> Result<Vec<EntityLink>, DatabaseError> {
        let _guard = self.write_guard().await;
        let active = self.list_links(intake_id, false).await?;
        let before: HashMap<String, u32> = active
            .iter()
            .map(|l| (l.id.clone(), l.link_order))
            .collect();

        let mut seen = HashSet::new();
        for order in &request.link_orders {
            if !before.contains_key(&order.link_id) {
                return Err(DatabaseError::NotFound {
                    entity: "active link",
                    id: order.link_id.clone(),
                });
            }
            if !seen.insert(order.link_id.as_str()) {
                return Err(DatabaseError::Validation(format!(
                    "link {} listed more than once",
                    order.link_id
                )));
            }
        }
        if seen.len() != active.len() {
            return Err(DatabaseError::Validation(format!(
                "reorder must list all {} active links, got {}",
                active.len(),
                seen.len()
            )));
        }
        let mut orders: Vec<u32> = request.link_orders.iter().map(|o| o.link_order).collect();
        orders.sort_unstable();
        if !orders.iter().copied().eq(1..=u32::try_from(orders.len()).unwrap_or(u32::MAX)) {
            return Err(DatabaseError::Validation(
                "link orders must be exactly 1..N".into(),
            ));
        }

        let now = Utc::now();
        let tx = self.db().conn().transaction().await?;
        let moved = Self::write_orders(&tx, &before, &request.link_orders, now).await?;
        tx.commit().await?;

        for (link_id, from, to) in &moved {
            let detail = ReorderedDetail {
                from: *from,
                to: *to,
            };
            self.record_audit(intake_id, link_id, AuditAction::Reordered, to_json(&detail)?, now)
                .await?;
        }
        if !moved.is_empty() {
            self.trail().append(&self.trail_op(
                TrailOp::Reorder,
                intake_id,
                "",
                to_json(request)?,
                now,
            ))?;
        }

        tracing::debug!(intake_id, moved = moved.len(), "links reordered");
        self.list_links(intake_id, false).await
    }
}
