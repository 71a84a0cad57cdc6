//! The request/response contract the flow needs from a link store.
//!
//! `LinkService` implements it over libSQL. Tests wrap it to inject failures.

use std::future::Future;

use linkage_core::entities::EntityLink;
use linkage_core::requests::{
    BatchCreateRequest, BatchCreateResponse, CreateLinkRequest, LinkPatch, ReorderRequest,
};
use linkage_db::error::{DatabaseError, codes};
use linkage_db::service::LinkService;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Invariant or `_version` conflict, with its machine-readable code.
    #[error("{code}: {message}")]
    Conflict { code: String, message: String },

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidState(String),

    #[error("{0}")]
    Internal(String),
}

impl From<DatabaseError> for StoreError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::Conflict { code, message } => Self::Conflict {
                code: code.to_string(),
                message,
            },
            err @ DatabaseError::VersionConflict { .. } => Self::Conflict {
                code: codes::VERSION_CONFLICT.to_string(),
                message: err.to_string(),
            },
            DatabaseError::Validation(msg) => Self::Validation(msg),
            err @ DatabaseError::NotFound { .. } => Self::NotFound(err.to_string()),
            DatabaseError::InvalidState(msg) => Self::InvalidState(msg),
            other => Self::Internal(other.to_string()),
        }
    }
}

pub trait LinkStore: Send + Sync {
    fn list_links(
        &self,
        intake_id: &str,
        include_deleted: bool,
    ) -> impl Future<Output = Result<Vec<EntityLink>, StoreError>> + Send;

    fn create_link(
        &self,
        intake_id: &str,
        request: &CreateLinkRequest,
    ) -> impl Future<Output = Result<EntityLink, StoreError>> + Send;

    fn create_links_batch(
        &self,
        intake_id: &str,
        batch: &BatchCreateRequest,
    ) -> impl Future<Output = Result<BatchCreateResponse, StoreError>> + Send;

    fn update_link(
        &self,
        intake_id: &str,
        link_id: &str,
        patch: &LinkPatch,
    ) -> impl Future<Output = Result<EntityLink, StoreError>> + Send;

    fn delete_link(
        &self,
        intake_id: &str,
        link_id: &str,
    ) -> impl Future<Output = Result<EntityLink, StoreError>> + Send;

    fn restore_link(
        &self,
        intake_id: &str,
        link_id: &str,
    ) -> impl Future<Output = Result<EntityLink, StoreError>> + Send;

    fn reorder_links(
        &self,
        intake_id: &str,
        request: &ReorderRequest,
    ) -> impl Future<Output = Result<Vec<EntityLink>, StoreError>> + Send;
}

impl LinkStore for LinkService {
    async fn list_links(
        &self,
        intake_id: &str,
        include_deleted: bool,
    ) -> Result<Vec<EntityLink>, StoreError> {
        Ok(Self::list_links(self, intake_id, include_deleted).await?)
    }

    async fn create_link(
        &self,
        intake_id: &str,
        request: &CreateLinkRequest,
    ) -> Result<EntityLink, StoreError> {
        Ok(Self::create_link(self, intake_id, request).await?)
    }

    async fn create_links_batch(
        &self,
        intake_id: &str,
        batch: &BatchCreateRequest,
    ) -> Result<BatchCreateResponse, StoreError> {
        Ok(Self::create_links_batch(self, intake_id, batch).await?)
    }

    async fn update_link(
        &self,
        intake_id: &str,
        link_id: &str,
        patch: &LinkPatch,
    ) -> Result<EntityLink, StoreError> {
        Ok(Self::update_link(self, intake_id, link_id, patch).await?)
    }

    async fn delete_link(&self, intake_id: &str, link_id: &str) -> Result<EntityLink, StoreError> {
        Ok(Self::delete_link(self, intake_id, link_id).await?)
    }

    async fn restore_link(&self, intake_id: &str, link_id: &str) -> Result<EntityLink, StoreError> {
        Ok(Self::restore_link(self, intake_id, link_id).await?)
    }

    async fn reorder_links(
        &self,
        intake_id: &str,
        request: &ReorderRequest,
    ) -> Result<Vec<EntityLink>, StoreError> {
        Ok(Self::reorder_links(self, intake_id, request).await?)
    }
}
