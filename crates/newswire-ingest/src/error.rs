use thiserror::Error;

use crate::types::{RunReport, Stage};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("feed parse error for {url}: {source}")]
    FeedParse {
        url: String,
        #[source]
        source: feed_rs::parser::ParseFeedError,
    },

    #[error("JSON deserialization error for {context}: {source}")]
    Decode {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("classifier error: {0}")]
    Classifier(String),

    #[error("database error: {0}")]
    Db(#[from] newswire_db::DbError),
}

/// Why an ingest cycle did not complete.
#[derive(Debug, Error)]
pub enum RunError {
    /// Another cycle holds the running flag; this trigger was dropped.
    #[error("an ingest cycle is already running")]
    AlreadyRunning,

    /// A stage failed. `report` holds the counts reached before the failure.
    #[error("ingest cycle failed during {stage}: {source}")]
    Failed {
        stage: Stage,
        report: RunReport,
        #[source]
        source: IngestError,
    },
}
