//! One ingest cycle: FETCH → DEDUP → ENRICH → PERSIST.
//!
//! Only one cycle runs at a time per pipeline. A trigger that arrives while
//! a cycle is in flight is dropped with [`RunError::AlreadyRunning`]; the
//! running flag is released by a guard, so a failed or panicking cycle never
//! leaves it set.

use std::sync::atomic::{AtomicBool, Ordering};

use newswire_db::InsertOutcome;

use crate::classifier::SentimentClassifier;
use crate::dedup::filter_new;
use crate::enrich::Enricher;
use crate::error::{IngestError, RunError};
use crate::image::ImageLookup;
use crate::sources::ProviderRegistry;
use crate::store::ArticleStore;
use crate::types::{RunReport, Stage};

/// Holds the running flag for the lifetime of one cycle.
struct RunGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> RunGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

pub struct IngestionPipeline<C, I, S> {
    registry: ProviderRegistry,
    enricher: Enricher<C, I>,
    store: S,
    running: AtomicBool,
}

impl<C, I, S> IngestionPipeline<C, I, S>
where
    C: SentimentClassifier,
    I: ImageLookup,
    S: ArticleStore,
{
    #[must_use]
    pub fn new(registry: ProviderRegistry, enricher: Enricher<C, I>, store: S) -> Self {
        Self {
            registry,
            enricher,
            store,
            running: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Whether a cycle currently holds the running flag.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Run one full cycle.
    ///
    /// `trigger` labels the cycle in the run ledger (`"scheduler"`,
    /// `"cli"`, ...). Ledger writes are best effort and never change the
    /// outcome.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::AlreadyRunning`] if another cycle is in flight, or
    /// [`RunError::Failed`] with the stage and the counts reached when the
    /// store or classifier fails.
    pub async fn run(&self, trigger: &str) -> Result<RunReport, RunError> {
        let Some(_guard) = RunGuard::acquire(&self.running) else {
            return Err(RunError::AlreadyRunning);
        };

        let run_id = match self.store.begin_run(trigger).await {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(error = %e, "failed to record ingest run start");
                None
            }
        };

        let mut report = RunReport::default();
        let outcome = self.run_stages(&mut report).await;

        if let Some(id) = run_id {
            let message = outcome
                .as_ref()
                .err()
                .map(|(stage, e)| format!("{stage}: {e}"));
            if let Err(e) = self.store.finish_run(id, &report, message.as_deref()).await {
                tracing::warn!(run_id = id, error = %e, "failed to record ingest run outcome");
            }
        }

        match outcome {
            Ok(()) => Ok(report),
            Err((stage, source)) => Err(RunError::Failed {
                stage,
                report,
                source,
            }),
        }
    }

    /// Run one cycle and log its outcome instead of returning an error.
    ///
    /// This is the scheduler boundary: failures are logged once and
    /// swallowed so the next trigger proceeds normally.
    pub async fn run_logged(&self, trigger: &str) -> Option<RunReport> {
        tracing::info!(trigger, "ingest cycle started");
        match self.run(trigger).await {
            Ok(report) => {
                tracing::info!(
                    trigger,
                    fetched = report.fetched,
                    failed_sources = report.failed_sources,
                    pruned = report.pruned,
                    enriched = report.enriched,
                    persisted = report.persisted,
                    duplicates = report.duplicates,
                    "ingest cycle finished"
                );
                Some(report)
            }
            Err(RunError::AlreadyRunning) => {
                tracing::warn!(trigger, "ingest cycle already running, trigger dropped");
                None
            }
            Err(RunError::Failed {
                stage,
                report,
                source,
            }) => {
                tracing::error!(
                    trigger,
                    %stage,
                    fetched = report.fetched,
                    pruned = report.pruned,
                    enriched = report.enriched,
                    persisted = report.persisted,
                    error = %source,
                    "ingest cycle failed"
                );
                None
            }
        }
    }

    async fn run_stages(&self, report: &mut RunReport) -> Result<(), (Stage, IngestError)> {
        let fetched = self.registry.fetch_all().await;
        report.fetched = fetched.articles.len();
        report.failed_sources = fetched.failed_sources;
        tracing::info!(
            fetched = report.fetched,
            failed_sources = report.failed_sources,
            "fetch stage complete"
        );
        if fetched.articles.is_empty() {
            return Ok(());
        }

        let existing = self
            .store
            .find_identities()
            .await
            .map_err(|e| (Stage::Dedup, e))?;
        let fresh = filter_new(fetched.articles, &existing);
        report.pruned = report.fetched - fresh.len();
        tracing::info!(pruned = report.pruned, remaining = fresh.len(), "dedup stage complete");
        if fresh.is_empty() {
            return Ok(());
        }

        let enriched = self
            .enricher
            .enrich(fresh)
            .await
            .map_err(|e| (Stage::Enrich, e))?;
        report.enriched = enriched.len();
        tracing::info!(enriched = report.enriched, "enrich stage complete");

        for article in &enriched {
            match self
                .store
                .insert(article)
                .await
                .map_err(|e| (Stage::Persist, e))?
            {
                InsertOutcome::Inserted(_) => report.persisted += 1,
                InsertOutcome::Duplicate => {
                    report.duplicates += 1;
                    tracing::debug!(link = %article.article.link, "article already stored");
                }
            }
        }
        tracing::info!(
            persisted = report.persisted,
            duplicates = report.duplicates,
            "persist stage complete"
        );

        Ok(())
    }
}
