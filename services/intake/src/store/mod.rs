//! Incident persistence.
//!
//! # Purpose
//! Defines the [`IncidentStore`] contract used by the orchestrator and the
//! read API, plus its in-memory and Postgres implementations.
//!
//! # Key invariants
//! - `create` assigns `id` and `created_at`; callers never choose them.
//! - Records are never updated or deleted through this trait.
use crate::model::{IncidentDraft, IncidentRecord};
use async_trait::async_trait;
use thiserror::Error;

pub mod memory;
pub mod postgres;

pub const DEFAULT_LIST_LIMIT: usize = 50;
pub const MAX_LIST_LIMIT: usize = 500;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait IncidentStore: Send + Sync {
    async fn create(&self, draft: IncidentDraft) -> StoreResult<IncidentRecord>;
    async fn get(&self, id: i64) -> StoreResult<IncidentRecord>;
    /// Most recent incidents first, at most `limit` of them.
    async fn list(&self, limit: usize) -> StoreResult<Vec<IncidentRecord>>;

    async fn health_check(&self) -> StoreResult<()>;
    fn is_durable(&self) -> bool;
    fn backend_name(&self) -> &'static str;
}
