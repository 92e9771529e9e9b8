//! Live integration tests for newswire-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. Run with `DATABASE_URL` set and `--ignored`.

use chrono::{TimeZone, Utc};
use newswire_core::{Article, EnrichedArticle};
use newswire_db::{
    complete_ingest_run, count_articles, fail_ingest_run, get_ingest_run, insert_article,
    list_article_links, list_ingest_runs, list_recent_articles, start_ingest_run, DbError,
    IngestRunCounts, InsertOutcome,
};

fn enriched(link: &str, sentiment: f64) -> EnrichedArticle {
    EnrichedArticle {
        article: Article::new(
            "Headline",
            "Summary",
            link,
            "BBC",
            "World",
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        )
        .expect("valid article"),
        sentiment,
        image_url: String::new(),
    }
}

// ---------------------------------------------------------------------------
// Section 1: Articles
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a live Postgres via DATABASE_URL"]
async fn insert_then_duplicate_is_noop(pool: sqlx::PgPool) {
    let first = insert_article(&pool, &enriched("https://news.test/a", 0.8))
        .await
        .expect("first insert");
    assert!(matches!(first, InsertOutcome::Inserted(_)));

    let second = insert_article(&pool, &enriched("https://news.test/a", -0.3))
        .await
        .expect("duplicate insert must not error");
    assert_eq!(second, InsertOutcome::Duplicate);

    assert_eq!(count_articles(&pool).await.unwrap(), 1);
    let rows = list_recent_articles(&pool, None, 10).await.unwrap();
    assert!((rows[0].sentiment - 0.8).abs() < f64::EPSILON);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a live Postgres via DATABASE_URL"]
async fn list_article_links_returns_identity_set(pool: sqlx::PgPool) {
    assert!(list_article_links(&pool).await.unwrap().is_empty());

    insert_article(&pool, &enriched("https://news.test/a", 0.1)).await.unwrap();
    insert_article(&pool, &enriched("https://news.test/b", 0.2)).await.unwrap();

    let links = list_article_links(&pool).await.unwrap();
    assert_eq!(links.len(), 2);
    assert!(links.contains("https://news.test/a"));
    assert!(links.contains("https://news.test/b"));
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a live Postgres via DATABASE_URL"]
async fn list_recent_articles_filters_by_publisher(pool: sqlx::PgPool) {
    insert_article(&pool, &enriched("https://news.test/a", 0.1)).await.unwrap();
    let mut other = enriched("https://news.test/b", 0.2);
    other.article.publisher = "Sky News".to_string();
    insert_article(&pool, &other).await.unwrap();

    let sky = list_recent_articles(&pool, Some("Sky News"), 10)
        .await
        .unwrap();
    assert_eq!(sky.len(), 1);
    assert_eq!(sky[0].link, "https://news.test/b");
}

// ---------------------------------------------------------------------------
// Section 2: Ingest run lifecycle
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a live Postgres via DATABASE_URL"]
async fn ingest_run_lifecycle_running_to_succeeded(pool: sqlx::PgPool) {
    let run = start_ingest_run(&pool, "cli").await.expect("start run");
    assert_eq!(run.status, "running");

    let counts = IngestRunCounts {
        fetched: 10,
        failed_sources: 2,
        pruned: 4,
        enriched: 6,
        persisted: 5,
        duplicates: 1,
    };
    complete_ingest_run(&pool, run.id, counts)
        .await
        .expect("complete run");

    let stored = get_ingest_run(&pool, run.id).await.unwrap();
    assert_eq!(stored.status, "succeeded");
    assert_eq!(stored.persisted, 5);
    assert_eq!(stored.failed_sources, 2);
    assert!(stored.completed_at.is_some());

    let again = complete_ingest_run(&pool, run.id, counts).await;
    assert!(matches!(
        again,
        Err(DbError::InvalidIngestRunTransition { .. })
    ));
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a live Postgres via DATABASE_URL"]
async fn ingest_run_failure_records_message(pool: sqlx::PgPool) {
    let run = start_ingest_run(&pool, "scheduler").await.unwrap();
    fail_ingest_run(&pool, run.id, IngestRunCounts::default(), "classifier down")
        .await
        .unwrap();

    let runs = list_ingest_runs(&pool, 5).await.unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].status, "failed");
    assert_eq!(runs[0].error_message.as_deref(), Some("classifier down"));
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a live Postgres via DATABASE_URL"]
async fn get_ingest_run_missing_is_not_found(pool: sqlx::PgPool) {
    let result = get_ingest_run(&pool, 9_999).await;
    assert!(matches!(result, Err(DbError::NotFound)));
}
