//! Article persistence seam used by the pipeline.

use std::collections::HashSet;
use std::future::Future;

use newswire_core::EnrichedArticle;
use newswire_db::InsertOutcome;
use sqlx::PgPool;

use crate::error::IngestError;
use crate::types::RunReport;

/// Storage for enriched articles, keyed by link.
pub trait ArticleStore: Send + Sync {
    /// Links of every stored article.
    fn find_identities(&self) -> impl Future<Output = Result<HashSet<String>, IngestError>> + Send;

    /// Insert one article. A link conflict is [`InsertOutcome::Duplicate`],
    /// not an error.
    fn insert(
        &self,
        article: &EnrichedArticle,
    ) -> impl Future<Output = Result<InsertOutcome, IngestError>> + Send;

    /// Record the start of a cycle. Returns a run id if the store keeps a
    /// ledger.
    fn begin_run(
        &self,
        _trigger: &str,
    ) -> impl Future<Output = Result<Option<i64>, IngestError>> + Send {
        async { Ok(None) }
    }

    /// Record the outcome of a cycle started with [`ArticleStore::begin_run`].
    fn finish_run(
        &self,
        _run_id: i64,
        _report: &RunReport,
        _error: Option<&str>,
    ) -> impl Future<Output = Result<(), IngestError>> + Send {
        async { Ok(()) }
    }
}

/// Postgres-backed store.
#[derive(Debug, Clone)]
pub struct PgArticleStore {
    pool: PgPool,
}

impl PgArticleStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl ArticleStore for PgArticleStore {
    async fn find_identities(&self) -> Result<HashSet<String>, IngestError> {
        Ok(newswire_db::list_article_links(&self.pool).await?)
    }

    async fn insert(&self, article: &EnrichedArticle) -> Result<InsertOutcome, IngestError> {
        Ok(newswire_db::insert_article(&self.pool, article).await?)
    }

    async fn begin_run(&self, trigger: &str) -> Result<Option<i64>, IngestError> {
        let run = newswire_db::start_ingest_run(&self.pool, trigger).await?;
        Ok(Some(run.id))
    }

    async fn finish_run(
        &self,
        run_id: i64,
        report: &RunReport,
        error: Option<&str>,
    ) -> Result<(), IngestError> {
        let counts = report.ledger_counts();
        match error {
            None => newswire_db::complete_ingest_run(&self.pool, run_id, counts).await?,
            Some(message) => {
                newswire_db::fail_ingest_run(&self.pool, run_id, counts, message).await?
            }
        }
        Ok(())
    }
}
