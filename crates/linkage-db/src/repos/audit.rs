//! Audit trail repository.
//!
//! Append-only rows recording every link mutation, queryable with filters.

use chrono::{DateTime, Utc};
use linkage_core::entities::AuditEntry;
use linkage_core::enums::AuditAction;
use linkage_core::ids::PREFIX_AUDIT;

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, parse_datetime, parse_enum, parse_optional_json};
use crate::service::LinkService;

/// Filter criteria for audit queries.
#[derive(Debug, Default, Clone)]
pub struct AuditFilter {
    pub intake_id: Option<String>,
    pub link_id: Option<String>,
    pub action: Option<AuditAction>,
    pub actor: Option<String>,
    pub limit: Option<u32>,
}

impl LinkService {
    /// # Errors
    ///
    /// Returns `DatabaseError` if the INSERT fails.
    pub async fn append_audit(&self, entry: &AuditEntry) -> Result<(), DatabaseError> {
        self.db()
            .conn()
            .execute(
                "INSERT INTO link_audit (id, intake_id, link_id, action, actor, detail, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                libsql::params![
                    entry.id.as_str(),
                    entry.intake_id.as_str(),
                    entry.link_id.as_str(),
                    entry.action.as_str(),
                    entry.actor.as_str(),
                    entry.detail.as_ref().map(std::string::ToString::to_string),
                    entry.created_at.to_rfc3339()
                ],
            )
            .await?;
        Ok(())
    }

    /// Build and append an entry for the current actor.
    pub(crate) async fn record_audit(
        &self,
        intake_id: &str,
        link_id: &str,
        action: AuditAction,
        detail: serde_json::Value,
        at: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        let id = self.db().generate_id(PREFIX_AUDIT).await?;
        self.append_audit(&AuditEntry {
            id,
            intake_id: intake_id.to_string(),
            link_id: link_id.to_string(),
            action,
            actor: self.actor().to_string(),
            detail: Some(detail),
            created_at: at,
        })
        .await
    }

    /// Newest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn query_audit(&self, filter: &AuditFilter) -> Result<Vec<AuditEntry>, DatabaseError> {
        let mut conditions = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();

        if let Some(ref intake_id) = filter.intake_id {
            params.push(libsql::Value::Text(intake_id.clone()));
            conditions.push(format!("intake_id = ?{}", params.len()));
        }
        if let Some(ref link_id) = filter.link_id {
            params.push(libsql::Value::Text(link_id.clone()));
            conditions.push(format!("link_id = ?{}", params.len()));
        }
        if let Some(action) = filter.action {
            params.push(libsql::Value::Text(action.as_str().to_string()));
            conditions.push(format!("action = ?{}", params.len()));
        }
        if let Some(ref actor) = filter.actor {
            params.push(libsql::Value::Text(actor.clone()));
            conditions.push(format!("actor = ?{}", params.len()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let limit = filter.limit.unwrap_or(100);
        let sql = format!(
            "SELECT id, intake_id, link_id, action, actor, detail, created_at
             FROM link_audit {where_clause}
             ORDER BY created_at DESC, rowid DESC LIMIT {limit}"
        );

        let mut rows = self
            .db()
            .conn()
            .query(&sql, libsql::params_from_iter(params))
            .await?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            entries.push(AuditEntry {
                id: row.get::<String>(0)?,
                intake_id: row.get::<String>(1)?,
                link_id: row.get::<String>(2)?,
                action: parse_enum(&row.get::<String>(3)?)?,
                actor: row.get::<String>(4)?,
                detail: parse_optional_json(get_opt_string(&row, 5)?.as_deref())?,
                created_at: parse_datetime(&row.get::<String>(6)?)?,
            });
        }
        Ok(entries)
    }
}
