//! Shared configuration and domain types for newswire.

pub mod app_config;
pub mod articles;
pub mod config;
pub mod feeds;

use thiserror::Error;

pub use app_config::{AppConfig, Environment, FetchConfig};
pub use articles::{canonical_link, Article, ArticleError, EnrichedArticle};
pub use config::{load_app_config, load_app_config_from_env, load_fetch_config};
pub use feeds::{load_feeds, parse_feeds, FeedKind, FeedSourceSpec, FeedsFile};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read feeds file {path}: {source}")]
    FeedsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse feeds file: {0}")]
    FeedsFileParse(#[from] serde_yaml::Error),

    #[error("feeds validation failed: {0}")]
    Validation(String),
}
