//! Postgres-backed implementation of the incident store.
//!
//! # What this module is
//! Implements [`IncidentStore`] on top of a `sqlx::PgPool`. Incidents live in
//! the `service_incidents` table; ids come from its `BIGSERIAL` column and
//! `created_at` from the database clock.
//!
//! # Key invariants
//! - Rows are only ever inserted; this service never updates or deletes them.
//! - Rows are re-validated through [`IncidentDraft::new`] when read, so a row
//!   edited out-of-band into an invalid state surfaces as an error rather than
//!   as an invalid record.
//!
//! # Operational notes
//! - Migrations run at startup via `sqlx::migrate!("./migrations")`, before
//!   the HTTP listener is bound.
//! - Pool size and acquire/connect timeouts are explicit so a slow or
//!   unreachable database fails requests instead of hanging them.
//! - Database URLs may contain credentials; they are never logged.
use super::{IncidentStore, StoreError, StoreResult};
use crate::config::PostgresConfig;
use crate::model::{DraftFields, IncidentDraft, IncidentRecord};
use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{FromRow, PgPool};
use std::str::FromStr;
use std::time::Duration;

/// Durable incident store backed by Postgres.
///
/// # Example
/// ```rust,no_run
/// use incident_intake::config::PostgresConfig;
/// use incident_intake::store::postgres::PostgresStore;
///
/// async fn open(pg: PostgresConfig) {
///     let _ = PostgresStore::connect(&pg).await;
/// }
/// ```
pub struct PostgresStore {
    pool: PgPool,
}

/// Row shape for `service_incidents`.
#[derive(Debug, Clone, FromRow)]
struct DbIncident {
    id: i64,
    affected_products: Vec<String>,
    severity: String,
    suspected_owning_team: Vec<String>,
    start_time: NaiveDateTime,
    end_time: NaiveDateTime,
    p1_customer_affected: bool,
    suspected_affected_components: Vec<String>,
    description: String,
    message_for_sp: Option<String>,
    statuspage_notification: bool,
    separate_channel_creation: bool,
    status: Option<String>,
    created_at: DateTime<Utc>,
}

const INCIDENT_COLUMNS: &str = "id, affected_products, severity, suspected_owning_team, \
     start_time, end_time, p1_customer_affected, suspected_affected_components, description, \
     message_for_sp, statuspage_notification, separate_channel_creation, status, created_at";

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Unexpected(err.into())
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        StoreError::Unexpected(err.into())
    }
}

impl PostgresStore {
    /// Connect, run migrations, and return a ready store.
    ///
    /// # Errors
    /// - Connection, timeout, or migration failures as [`StoreError::Unexpected`].
    pub async fn connect(pg: &PostgresConfig) -> StoreResult<Self> {
        Self::connect_internal(pg, true).await
    }

    /// Connect without running migrations (tests that manage schemas).
    #[cfg(any(test, feature = "pg-tests"))]
    pub async fn connect_without_migrations(pg: &PostgresConfig) -> StoreResult<Self> {
        Self::connect_internal(pg, false).await
    }

    async fn connect_internal(pg: &PostgresConfig, run_migrations: bool) -> StoreResult<Self> {
        let connect_options = PgConnectOptions::from_str(&pg.url)?;
        let connect = PgPoolOptions::new()
            .max_connections(pg.max_connections)
            .acquire_timeout(Duration::from_millis(pg.acquire_timeout_ms))
            .connect_with(connect_options);
        let pool = tokio::time::timeout(Duration::from_millis(pg.connect_timeout_ms), connect)
            .await
            .map_err(|_| StoreError::Unexpected(anyhow!("postgres connect timed out")))??;

        if run_migrations {
            sqlx::migrate!("./migrations").run(&pool).await?;
        }
        Ok(Self { pool })
    }

    #[cfg(any(test, feature = "pg-tests"))]
    pub(crate) fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn refresh_gauge(&self) {
        if let Ok(total) = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM service_incidents")
            .fetch_one(&self.pool)
            .await
        {
            crate::observability::record_stored_incidents(total.max(0) as u64);
        }
    }
}

#[async_trait]
impl IncidentStore for PostgresStore {
    async fn create(&self, draft: IncidentDraft) -> StoreResult<IncidentRecord> {
        let query = format!(
            "INSERT INTO service_incidents (affected_products, severity, suspected_owning_team, \
             start_time, end_time, p1_customer_affected, suspected_affected_components, \
             description, message_for_sp, statuspage_notification, separate_channel_creation) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {INCIDENT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, DbIncident>(&query)
            .bind(draft.affected_products().iter().cloned().collect::<Vec<_>>())
            .bind(draft.severity().as_str())
            .bind(draft.suspected_owning_team().to_vec())
            .bind(draft.start_time())
            .bind(draft.end_time())
            .bind(draft.p1_customer_affected())
            .bind(
                draft
                    .suspected_affected_components()
                    .iter()
                    .cloned()
                    .collect::<Vec<_>>(),
            )
            .bind(draft.description())
            .bind(draft.message_for_support())
            .bind(draft.statuspage_notification())
            .bind(draft.separate_channel_creation())
            .fetch_one(&self.pool)
            .await?;
        self.refresh_gauge().await;
        incident_from_db(row)
    }

    async fn get(&self, id: i64) -> StoreResult<IncidentRecord> {
        let query = format!("SELECT {INCIDENT_COLUMNS} FROM service_incidents WHERE id = $1");
        let row = sqlx::query_as::<_, DbIncident>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("incident {id}")))?;
        incident_from_db(row)
    }

    async fn list(&self, limit: usize) -> StoreResult<Vec<IncidentRecord>> {
        let query = format!(
            "SELECT {INCIDENT_COLUMNS} FROM service_incidents ORDER BY id DESC LIMIT $1"
        );
        let rows = sqlx::query_as::<_, DbIncident>(&query)
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(incident_from_db).collect()
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn is_durable(&self) -> bool {
        true
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

fn incident_from_db(row: DbIncident) -> StoreResult<IncidentRecord> {
    let id = row.id;
    let incident = IncidentDraft::new(DraftFields {
        affected_products: row.affected_products,
        severity: row.severity,
        suspected_owning_team: row.suspected_owning_team,
        start_time: row.start_time,
        end_time: row.end_time,
        p1_customer_affected: row.p1_customer_affected,
        suspected_affected_components: row.suspected_affected_components,
        description: row.description,
        message_for_support: row.message_for_sp,
        statuspage_notification: row.statuspage_notification,
        separate_channel_creation: row.separate_channel_creation,
    })
    .map_err(|err| StoreError::Unexpected(anyhow!("stored incident {id} is invalid: {err}")))?;
    Ok(IncidentRecord {
        id,
        created_at: row.created_at,
        status: row.status,
        incident,
    })
}
