//! Database operations for the `articles` table.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use newswire_core::EnrichedArticle;
use sqlx::PgPool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `articles` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ArticleRow {
    pub id: i64,
    pub title: String,
    pub summary: String,
    pub link: String,
    pub publisher: String,
    pub category: String,
    pub published_date: DateTime<Utc>,
    pub sentiment: f64,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
}

/// Result of a single insert attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new row was written with this id.
    Inserted(i64),
    /// A row with the same `link` already exists; nothing was written.
    Duplicate,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Return the identity (`link`) of every stored article.
///
/// Selects only the `link` column so the dedup prefilter costs one round
/// trip regardless of how wide the rows are.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_article_links(pool: &PgPool) -> Result<HashSet<String>, DbError> {
    let links: Vec<String> = sqlx::query_scalar("SELECT link FROM articles")
        .fetch_all(pool)
        .await?;

    Ok(links.into_iter().collect())
}

/// Insert an enriched article.
///
/// The `UNIQUE (link)` constraint is the authoritative dedup mechanism:
/// a conflicting link writes nothing and yields [`InsertOutcome::Duplicate`].
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] for any failure other than a link conflict.
pub async fn insert_article(
    pool: &PgPool,
    enriched: &EnrichedArticle,
) -> Result<InsertOutcome, DbError> {
    let article = &enriched.article;
    let id: Option<i64> = sqlx::query_scalar(
        "INSERT INTO articles \
             (title, summary, link, publisher, category, published_date, sentiment, image_url) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         ON CONFLICT (link) DO NOTHING \
         RETURNING id",
    )
    .bind(&article.title)
    .bind(&article.summary)
    .bind(&article.link)
    .bind(&article.publisher)
    .bind(&article.category)
    .bind(article.published_date)
    .bind(enriched.sentiment)
    .bind(&enriched.image_url)
    .fetch_optional(pool)
    .await?;

    Ok(id.map_or(InsertOutcome::Duplicate, InsertOutcome::Inserted))
}

/// Total number of stored articles.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_articles(pool: &PgPool) -> Result<i64, DbError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM articles")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// List the most recently published articles, optionally filtered by publisher.
///
/// Results are ordered by `published_date DESC` then `id DESC`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_recent_articles(
    pool: &PgPool,
    publisher: Option<&str>,
    limit: i64,
) -> Result<Vec<ArticleRow>, DbError> {
    let rows = match publisher {
        Some(name) => {
            sqlx::query_as::<_, ArticleRow>(
                "SELECT id, title, summary, link, publisher, category, published_date, \
                        sentiment, image_url, created_at \
                 FROM articles \
                 WHERE publisher = $1 \
                 ORDER BY published_date DESC, id DESC \
                 LIMIT $2",
            )
            .bind(name)
            .bind(limit)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, ArticleRow>(
                "SELECT id, title, summary, link, publisher, category, published_date, \
                        sentiment, image_url, created_at \
                 FROM articles \
                 ORDER BY published_date DESC, id DESC \
                 LIMIT $1",
            )
            .bind(limit)
            .fetch_all(pool)
            .await?
        }
    };

    Ok(rows)
}
