//! Offline unit tests for newswire-db pool configuration and row types.
//! These tests do not require a live database connection.

use newswire_core::{AppConfig, Environment};
use newswire_db::{IngestRunCounts, IngestRunRow, InsertOutcome, PoolConfig};
use std::path::PathBuf;

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let app_config = AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        log_level: "info".to_string(),
        feeds_path: PathBuf::from("./config/feeds.yaml"),
        schedule_cron: "0 0 * * * *".to_string(),
        classifier_url: "http://localhost:8080".to_string(),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        fetch_timeout_secs: 30,
        classifier_timeout_secs: 120,
        image_timeout_secs: 10,
        user_agent: "ua".to_string(),
        max_concurrent_feeds: 4,
        max_concurrent_images: 8,
        fetch_max_retries: 2,
        fetch_retry_backoff_ms: 500,
    };

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

/// Compile-time smoke test: confirm that [`IngestRunRow`] has all expected
/// fields with the correct types. No database required.
#[test]
fn ingest_run_row_has_expected_fields() {
    use chrono::Utc;
    use uuid::Uuid;

    let row = IngestRunRow {
        id: 1_i64,
        public_id: Uuid::new_v4(),
        trigger_source: "scheduler".to_string(),
        status: "running".to_string(),
        started_at: Utc::now(),
        completed_at: None,
        fetched: 0,
        failed_sources: 0,
        pruned: 0,
        enriched: 0,
        persisted: 0,
        duplicates: 0,
        error_message: None,
    };

    assert_eq!(row.id, 1);
    assert_eq!(row.trigger_source, "scheduler");
    assert_eq!(row.status, "running");
    assert!(row.completed_at.is_none());
    assert!(row.error_message.is_none());
}

#[test]
fn ingest_run_counts_default_to_zero() {
    assert_eq!(
        IngestRunCounts::default(),
        IngestRunCounts {
            fetched: 0,
            failed_sources: 0,
            pruned: 0,
            enriched: 0,
            persisted: 0,
            duplicates: 0,
        }
    );
}

#[test]
fn insert_outcome_distinguishes_duplicates() {
    assert_ne!(InsertOutcome::Inserted(1), InsertOutcome::Duplicate);
    assert_eq!(InsertOutcome::Inserted(3), InsertOutcome::Inserted(3));
}
