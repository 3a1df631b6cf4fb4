//! In-memory implementation of the incident store.
//!
//! # Purpose
//! Keeps incidents in a `BTreeMap` guarded by `tokio::sync::RwLock`. Used for
//! local development, tests, and deployments that do not need durability.
//!
//! # Durability and consistency
//! - **Not durable**: all incidents are lost on restart.
//! - Ids are assigned under the write lock, so they are unique and strictly
//!   increasing within one process.
use super::{IncidentStore, StoreError, StoreResult};
use crate::model::{IncidentDraft, IncidentRecord};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Incidents {
    next_id: i64,
    records: BTreeMap<i64, IncidentRecord>,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    incidents: Arc<RwLock<Incidents>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IncidentStore for InMemoryStore {
    async fn create(&self, draft: IncidentDraft) -> StoreResult<IncidentRecord> {
        let mut incidents = self.incidents.write().await;
        incidents.next_id += 1;
        let record = IncidentRecord {
            id: incidents.next_id,
            created_at: Utc::now(),
            status: None,
            incident: draft,
        };
        incidents.records.insert(record.id, record.clone());
        crate::observability::record_stored_incidents(incidents.records.len() as u64);
        Ok(record)
    }

    async fn get(&self, id: i64) -> StoreResult<IncidentRecord> {
        self.incidents
            .read()
            .await
            .records
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("incident {id}")))
    }

    async fn list(&self, limit: usize) -> StoreResult<Vec<IncidentRecord>> {
        Ok(self
            .incidents
            .read()
            .await
            .records
            .values()
            .rev()
            .take(limit)
            .cloned()
            .collect())
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    fn is_durable(&self) -> bool {
        false
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
