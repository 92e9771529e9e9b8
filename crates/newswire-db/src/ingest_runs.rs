//! Database operations for the `ingest_runs` ledger.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `ingest_runs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct IngestRunRow {
    pub id: i64,
    pub public_id: Uuid,
    pub trigger_source: String,
    pub status: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub fetched: i32,
    pub failed_sources: i32,
    pub pruned: i32,
    pub enriched: i32,
    pub persisted: i32,
    pub duplicates: i32,
    pub error_message: Option<String>,
}

/// Stage counts recorded when a run finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestRunCounts {
    pub fetched: i32,
    pub failed_sources: i32,
    pub pruned: i32,
    pub enriched: i32,
    pub persisted: i32,
    pub duplicates: i32,
}

const RUN_COLUMNS: &str = "id, public_id, trigger_source, status, started_at, completed_at, \
                           fetched, failed_sources, pruned, enriched, persisted, duplicates, \
                           error_message";

/// Creates a new run in `running` status with `started_at = NOW()`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn start_ingest_run(
    pool: &PgPool,
    trigger_source: &str,
) -> Result<IngestRunRow, DbError> {
    let public_id = Uuid::new_v4();

    let row = sqlx::query_as::<_, IngestRunRow>(&format!(
        "INSERT INTO ingest_runs (public_id, trigger_source, status, started_at) \
         VALUES ($1, $2, 'running', NOW()) \
         RETURNING {RUN_COLUMNS}"
    ))
    .bind(public_id)
    .bind(trigger_source)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Marks a run as `succeeded` and records its counts.
///
/// # Errors
///
/// Returns [`DbError::InvalidIngestRunTransition`] if the run is not
/// `running`, or [`DbError::Sqlx`] if the update fails.
pub async fn complete_ingest_run(
    pool: &PgPool,
    id: i64,
    counts: IngestRunCounts,
) -> Result<(), DbError> {
    finish_ingest_run(pool, id, "succeeded", counts, None).await
}

/// Marks a run as `failed`, recording the counts reached and `error_message`.
///
/// # Errors
///
/// Returns [`DbError::InvalidIngestRunTransition`] if the run is not
/// `running`, or [`DbError::Sqlx`] if the update fails.
pub async fn fail_ingest_run(
    pool: &PgPool,
    id: i64,
    counts: IngestRunCounts,
    error_message: &str,
) -> Result<(), DbError> {
    finish_ingest_run(pool, id, "failed", counts, Some(error_message)).await
}

async fn finish_ingest_run(
    pool: &PgPool,
    id: i64,
    status: &str,
    counts: IngestRunCounts,
    error_message: Option<&str>,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE ingest_runs \
         SET status = $1, completed_at = NOW(), \
             fetched = $2, failed_sources = $3, pruned = $4, enriched = $5, \
             persisted = $6, duplicates = $7, error_message = $8 \
         WHERE id = $9 AND status = 'running'",
    )
    .bind(status)
    .bind(counts.fetched)
    .bind(counts.failed_sources)
    .bind(counts.pruned)
    .bind(counts.enriched)
    .bind(counts.persisted)
    .bind(counts.duplicates)
    .bind(error_message)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidIngestRunTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// Fetches a single run by its internal `id`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists with the given `id`, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_ingest_run(pool: &PgPool, id: i64) -> Result<IngestRunRow, DbError> {
    sqlx::query_as::<_, IngestRunRow>(&format!(
        "SELECT {RUN_COLUMNS} FROM ingest_runs WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Returns the most recent `limit` runs, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_ingest_runs(pool: &PgPool, limit: i64) -> Result<Vec<IngestRunRow>, DbError> {
    let rows = sqlx::query_as::<_, IngestRunRow>(&format!(
        "SELECT {RUN_COLUMNS} FROM ingest_runs ORDER BY started_at DESC, id DESC LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
