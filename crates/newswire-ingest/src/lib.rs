//! Ingestion pipeline for newswire.
//!
//! Fetches articles from the configured RSS/REST feeds, drops those whose
//! link is already stored, scores titles with an external sentiment
//! classifier, resolves a preview image per article, and persists the
//! results. Each stage short-circuits on an empty batch.

pub mod classifier;
pub mod dedup;
pub mod enrich;
pub mod error;
pub mod image;
pub mod pipeline;
pub mod sources;
pub mod store;
pub mod types;

mod retry;

pub use classifier::{signed_sentiment, Prediction, SentimentClassifier, TeiClassifier};
pub use dedup::filter_new;
pub use enrich::Enricher;
pub use error::{IngestError, RunError};
pub use image::{ImageLookup, OgImageLookup};
pub use newswire_db::InsertOutcome;
pub use pipeline::IngestionPipeline;
pub use sources::{FeedClient, FeedSource, FetchedArticles, ProviderRegistry};
pub use store::{ArticleStore, PgArticleStore};
pub use types::{IngestConfig, RunReport, Stage};
