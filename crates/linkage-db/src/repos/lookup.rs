//! Reverse lookup: which intakes link to a given entity.

use linkage_core::enums::{EntityType, LinkType};
use linkage_core::responses::{LinkedIntake, LinkedIntakePage, Pagination};

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, get_u32, parse_datetime, parse_enum};
use crate::service::LinkService;

pub const MAX_PAGE_SIZE: u32 = 100;
pub const DEFAULT_PAGE_SIZE: u32 = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntakeQuery {
    pub entity_type: EntityType,
    pub entity_id: String,
    pub link_type: Option<LinkType>,
    /// 1-based.
    pub page: u32,
    pub page_size: u32,
}

impl IntakeQuery {
    pub fn new(entity_type: EntityType, entity_id: impl Into<String>) -> Self {
        Self {
            entity_type,
            entity_id: entity_id.into(),
            link_type: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    const fn effective_page(&self) -> u32 {
        if self.page == 0 { 1 } else { self.page }
    }

    const fn effective_page_size(&self) -> u32 {
        if self.page_size == 0 {
            DEFAULT_PAGE_SIZE
        } else if self.page_size > MAX_PAGE_SIZE {
            MAX_PAGE_SIZE
        } else {
            self.page_size
        }
    }
}

impl LinkService {
    /// Intakes with an active link to the entity, newest link first.
    ///
    /// Page size is capped at [`MAX_PAGE_SIZE`]; page 0 is read as page 1.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn intakes_for_entity(
        &self,
        query: &IntakeQuery,
    ) -> Result<LinkedIntakePage, DatabaseError> {
        let page = query.effective_page();
        let page_size = query.effective_page_size();

        let mut conditions = vec![
            "entity_type = ?1".to_string(),
            "entity_id = ?2".to_string(),
            "deleted_at IS NULL".to_string(),
        ];
        let mut params: Vec<libsql::Value> = vec![
            query.entity_type.as_str().into(),
            query.entity_id.clone().into(),
        ];
        if let Some(link_type) = query.link_type {
            conditions.push("link_type = ?3".to_string());
            params.push(link_type.as_str().into());
        }
        let where_clause = conditions.join(" AND ");

        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT COUNT(*) FROM intake_entity_links WHERE {where_clause}"),
                libsql::params_from_iter(params.clone()),
            )
            .await?;
        let total_count = match rows.next().await? {
            Some(row) => u64::try_from(row.get::<i64>(0)?).unwrap_or(0),
            None => 0,
        };

        let idx = params.len() + 1;
        params.push(i64::from(page_size).into());
        params.push((i64::from(page - 1) * i64::from(page_size)).into());
        let sql = format!(
            "SELECT intake_id, id, link_type, source, confidence, notes, link_order, created_by, created_at
             FROM intake_entity_links WHERE {where_clause}
             ORDER BY created_at DESC, id LIMIT ?{idx} OFFSET ?{}",
            idx + 1
        );
        let mut rows = self
            .db()
            .conn()
            .query(&sql, libsql::params_from_iter(params))
            .await?;

        let mut intakes = Vec::new();
        while let Some(row) = rows.next().await? {
            intakes.push(LinkedIntake {
                intake_id: row.get::<String>(0)?,
                link_id: row.get::<String>(1)?,
                link_type: parse_enum(&row.get::<String>(2)?)?,
                source: parse_enum(&row.get::<String>(3)?)?,
                confidence: row.get::<Option<f64>>(4)?,
                notes: get_opt_string(&row, 5)?,
                link_order: get_u32(&row, 6)?,
                linked_by: row.get::<String>(7)?,
                linked_at: parse_datetime(&row.get::<String>(8)?)?,
            });
        }

        Ok(LinkedIntakePage {
            intakes,
            pagination: Pagination {
                page,
                page_size,
                total_count,
                total_pages: total_count.div_ceil(u64::from(page_size)),
            },
        })
    }
}
