mod commands;
mod scheduler;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use newswire_core::{AppConfig, Environment};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "newswire")]
#[command(about = "News ingestion worker: fetch, dedup, enrich, persist")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run a single ingest cycle and exit
    RunOnce,
    /// Run ingest cycles on the configured cron schedule (default)
    Schedule,
    /// Fetch every configured feed once and report what each returns
    CheckFeeds,
    /// Show the most recently published stored articles
    Recent {
        /// Only show articles from this publisher
        #[arg(long)]
        publisher: Option<String>,
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
    /// Show the ingest run ledger, newest first
    Runs {
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
    /// Database operations
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::CheckFeeds) => {
            let config = newswire_core::load_fetch_config()?;
            init_tracing(&config.log_level, &config.env)?;
            commands::check_feeds(&config).await
        }
        command => {
            let config = Arc::new(newswire_core::load_app_config()?);
            init_tracing(&config.log_level, &config.env)?;
            dispatch(command, config).await
        }
    }
}

async fn dispatch(command: Option<Commands>, config: Arc<AppConfig>) -> anyhow::Result<()> {
    match command {
        Some(Commands::RunOnce) => commands::run_once(&config).await,
        Some(Commands::Schedule) | None => run_scheduler(config).await,
        Some(Commands::CheckFeeds) => commands::check_feeds(&config.fetch_config()).await,
        Some(Commands::Recent { publisher, limit }) => {
            commands::recent(&config, publisher.as_deref(), limit).await
        }
        Some(Commands::Runs { limit }) => commands::runs(&config, limit).await,
        Some(Commands::Db { command }) => match command {
            DbCommands::Ping => commands::db_ping(&config).await,
            DbCommands::Migrate => commands::db_migrate(&config).await,
        },
    }
}

/// `RUST_LOG` wins over the configured level. Production output carries no
/// ANSI colour codes so log shippers see plain text.
fn init_tracing(log_level: &str, env: &Environment) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(log_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_ansi(use_ansi_logs(env))
        .init();
    tracing::info!(%env, version = env!("CARGO_PKG_VERSION"), "newswire starting");
    Ok(())
}

fn use_ansi_logs(env: &Environment) -> bool {
    *env != Environment::Production
}

async fn run_scheduler(config: Arc<AppConfig>) -> anyhow::Result<()> {
    let pool = commands::connect(&config).await?;
    let pipeline = Arc::new(commands::build_pipeline(&config, pool)?);

    let mut scheduler = scheduler::build_scheduler(pipeline, &config.schedule_cron).await?;
    tracing::info!(cron = %config.schedule_cron, "scheduler started");

    shutdown_signal().await;
    scheduler.shutdown().await?;
    tracing::info!("scheduler stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, stopping scheduler");
}
