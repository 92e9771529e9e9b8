use std::time::Duration;

/// Runtime knobs for the ingestion pipeline.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub classifier_url: String,
    pub user_agent: String,
    pub fetch_timeout: Duration,
    pub classifier_timeout: Duration,
    pub image_timeout: Duration,
    pub max_concurrent_feeds: usize,
    pub max_concurrent_images: usize,
    pub fetch_max_retries: u32,
    pub fetch_retry_backoff_ms: u64,
}

impl IngestConfig {
    #[must_use]
    pub fn from_app_config(config: &newswire_core::AppConfig) -> Self {
        Self {
            classifier_url: config.classifier_url.clone(),
            user_agent: config.user_agent.clone(),
            fetch_timeout: Duration::from_secs(config.fetch_timeout_secs),
            classifier_timeout: Duration::from_secs(config.classifier_timeout_secs),
            image_timeout: Duration::from_secs(config.image_timeout_secs),
            max_concurrent_feeds: config.max_concurrent_feeds.max(1),
            max_concurrent_images: config.max_concurrent_images.max(1),
            fetch_max_retries: config.fetch_max_retries,
            fetch_retry_backoff_ms: config.fetch_retry_backoff_ms,
        }
    }
}

/// Stages of one ingest cycle, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetch,
    Dedup,
    Enrich,
    Persist,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Fetch => write!(f, "fetch"),
            Stage::Dedup => write!(f, "dedup"),
            Stage::Enrich => write!(f, "enrich"),
            Stage::Persist => write!(f, "persist"),
        }
    }
}

/// Counts reported by one ingest cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Articles returned by all sources combined.
    pub fetched: usize,
    /// Sources that failed and contributed nothing.
    pub failed_sources: usize,
    /// Articles dropped because their link was already stored.
    pub pruned: usize,
    /// Articles that received sentiment and image fields.
    pub enriched: usize,
    /// Articles written to the store.
    pub persisted: usize,
    /// Articles rejected by the store's unique link constraint.
    pub duplicates: usize,
}

impl RunReport {
    /// Counts in the shape of the `ingest_runs` ledger columns.
    #[must_use]
    pub fn ledger_counts(&self) -> newswire_db::IngestRunCounts {
        let clamp = |n: usize| i32::try_from(n).unwrap_or(i32::MAX);
        newswire_db::IngestRunCounts {
            fetched: clamp(self.fetched),
            failed_sources: clamp(self.failed_sources),
            pruned: clamp(self.pruned),
            enriched: clamp(self.enriched),
            persisted: clamp(self.persisted),
            duplicates: clamp(self.duplicates),
        }
    }
}
