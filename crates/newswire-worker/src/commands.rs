//! One-shot subcommands.

use std::path::Path;

use anyhow::Context;
use newswire_core::{AppConfig, FetchConfig};
use newswire_ingest::{
    Enricher, FeedClient, IngestConfig, IngestionPipeline, OgImageLookup, PgArticleStore,
    ProviderRegistry, RunError, TeiClassifier,
};
use sqlx::PgPool;

/// The production pipeline wiring.
pub type Pipeline = IngestionPipeline<TeiClassifier, OgImageLookup, PgArticleStore>;

/// Connect to Postgres and apply pending migrations.
pub async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    let pool_config = newswire_db::PoolConfig::from_app_config(config);
    let pool = newswire_db::connect_pool(&config.database_url, pool_config)
        .await
        .context("failed to connect to database")?;
    let applied = newswire_db::run_migrations(&pool)
        .await
        .context("failed to run migrations")?;
    if applied > 0 {
        tracing::info!(applied, "applied database migrations");
    }
    Ok(pool)
}

fn load_registry(
    feeds_path: &Path,
    client: FeedClient,
    max_concurrent_feeds: usize,
) -> anyhow::Result<ProviderRegistry> {
    let feeds = newswire_core::load_feeds(feeds_path)
        .with_context(|| format!("failed to load feeds from {}", feeds_path.display()))?;
    Ok(ProviderRegistry::from_specs(
        client,
        feeds.sources(),
        max_concurrent_feeds,
    ))
}

/// Assemble the pipeline from configuration and a connected pool.
pub fn build_pipeline(config: &AppConfig, pool: PgPool) -> anyhow::Result<Pipeline> {
    let ingest = IngestConfig::from_app_config(config);
    let registry = load_registry(
        &config.feeds_path,
        FeedClient::new(&ingest)?,
        ingest.max_concurrent_feeds,
    )?;
    tracing::info!(sources = registry.sources().len(), "loaded feed sources");

    let classifier = TeiClassifier::new(
        &ingest.classifier_url,
        ingest.classifier_timeout,
        &ingest.user_agent,
    )?;
    let images = OgImageLookup::new(ingest.image_timeout, &ingest.user_agent)?;
    let enricher = Enricher::new(
        classifier,
        images,
        ingest.max_concurrent_images,
        ingest.image_timeout,
    );

    Ok(IngestionPipeline::new(
        registry,
        enricher,
        PgArticleStore::new(pool),
    ))
}

pub async fn run_once(config: &AppConfig) -> anyhow::Result<()> {
    let pool = connect(config).await?;
    let pipeline = build_pipeline(config, pool)?;

    match pipeline.run("cli").await {
        Ok(report) => {
            println!(
                "fetched {} ({} sources failed), pruned {}, enriched {}, persisted {}, \
                 duplicates {}",
                report.fetched,
                report.failed_sources,
                report.pruned,
                report.enriched,
                report.persisted,
                report.duplicates
            );
            Ok(())
        }
        Err(RunError::Failed {
            stage,
            report,
            source,
        }) => {
            tracing::error!(
                %stage,
                fetched = report.fetched,
                persisted = report.persisted,
                error = %source,
                "ingest cycle failed"
            );
            Err(anyhow::Error::new(source).context(format!("ingest cycle failed during {stage}")))
        }
        Err(e @ RunError::AlreadyRunning) => Err(e.into()),
    }
}

/// Fetch every source once and print a per-source line. Needs no database.
pub async fn check_feeds(config: &FetchConfig) -> anyhow::Result<()> {
    let registry = load_registry(
        &config.feeds_path,
        FeedClient::from_fetch_config(config)?,
        config.max_concurrent_feeds,
    )?;

    let mut failed = 0usize;
    for source in registry.sources() {
        match source.try_fetch(registry.client()).await {
            Ok(articles) => println!(
                "ok    {:<12} {:<14} {:>4} articles  {}",
                source.publisher,
                source.category,
                articles.len(),
                source.url
            ),
            Err(e) => {
                failed += 1;
                println!(
                    "FAIL  {:<12} {:<14} {}  ({e})",
                    source.publisher, source.category, source.url
                );
            }
        }
    }

    println!("{} sources, {failed} failed", registry.sources().len());
    if failed > 0 {
        anyhow::bail!("{failed} feed source(s) failed");
    }
    Ok(())
}

pub async fn recent(config: &AppConfig, publisher: Option<&str>, limit: i64) -> anyhow::Result<()> {
    let pool = connect(config).await?;
    let rows = newswire_db::list_recent_articles(&pool, publisher, limit).await?;
    let total = newswire_db::count_articles(&pool).await?;

    for row in &rows {
        println!(
            "{}  {:+.2}  [{} / {}]  {}\n      {}",
            row.published_date.format("%Y-%m-%d %H:%M"),
            row.sentiment,
            row.publisher,
            row.category,
            row.title,
            row.link
        );
    }
    println!("showing {} of {total} stored articles", rows.len());
    Ok(())
}

pub async fn runs(config: &AppConfig, limit: i64) -> anyhow::Result<()> {
    let pool = connect(config).await?;
    let runs = newswire_db::list_ingest_runs(&pool, limit).await?;

    for run in &runs {
        let duration = run
            .completed_at
            .map(|done| format!("{}s", (done - run.started_at).num_seconds()))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "#{:<5} {:<10} {:<9} {}  {:>5}  fetched {} failed-sources {} pruned {} \
             enriched {} persisted {} duplicates {}{}",
            run.id,
            run.trigger_source,
            run.status,
            run.started_at.format("%Y-%m-%d %H:%M:%S"),
            duration,
            run.fetched,
            run.failed_sources,
            run.pruned,
            run.enriched,
            run.persisted,
            run.duplicates,
            run.error_message
                .as_deref()
                .map(|m| format!("  error: {m}"))
                .unwrap_or_default()
        );
    }
    Ok(())
}

pub async fn db_ping(config: &AppConfig) -> anyhow::Result<()> {
    let pool_config = newswire_db::PoolConfig::from_app_config(config);
    let pool = newswire_db::connect_pool(&config.database_url, pool_config).await?;
    newswire_db::health_check(&pool).await?;
    println!("database ok");
    Ok(())
}

pub async fn db_migrate(config: &AppConfig) -> anyhow::Result<()> {
    let pool_config = newswire_db::PoolConfig::from_app_config(config);
    let pool = newswire_db::connect_pool(&config.database_url, pool_config).await?;
    let applied = newswire_db::run_migrations(&pool).await?;
    println!("applied {applied} migration(s)");
    Ok(())
}
