//! Feed source abstractions.
//!
//! A [`FeedSource`] is one `(publisher, category, url)` endpoint. Its
//! [`FeedKind`] selects how the body is parsed; every kind yields the same
//! normalized [`Article`] shape. [`ProviderRegistry`] fetches all configured
//! sources and is the fail-soft boundary: a failing source is logged once and
//! contributes nothing.

mod helpers;
mod rest;
mod rss;

pub use rest::parse_rest_articles;
pub use rss::parse_syndication_feed;

use std::time::Duration;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use newswire_core::{Article, FeedKind, FeedSourceSpec, FetchConfig};

use crate::error::IngestError;
use crate::retry::{retry_with_backoff, RetryPolicy};
use crate::types::IngestConfig;

const FEED_ACCEPT: &str =
    "application/rss+xml, application/atom+xml, application/json, text/xml;q=0.9, */*;q=0.8";

/// HTTP client shared by all feed fetches in a cycle.
#[derive(Debug, Clone)]
pub struct FeedClient {
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl FeedClient {
    /// Build a client with the configured timeout, user agent, and retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Http`] if the underlying client cannot be built.
    pub fn new(config: &IngestConfig) -> Result<Self, IngestError> {
        Self::build(
            config.fetch_timeout,
            &config.user_agent,
            RetryPolicy {
                max_retries: config.fetch_max_retries,
                backoff_base_ms: config.fetch_retry_backoff_ms,
            },
        )
    }

    /// Build a client from the fetch-only settings, for commands that run
    /// without a database or classifier.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Http`] if the underlying client cannot be built.
    pub fn from_fetch_config(config: &FetchConfig) -> Result<Self, IngestError> {
        Self::build(
            Duration::from_secs(config.fetch_timeout_secs),
            &config.user_agent,
            RetryPolicy {
                max_retries: config.fetch_max_retries,
                backoff_base_ms: config.fetch_retry_backoff_ms,
            },
        )
    }

    fn build(timeout: Duration, user_agent: &str, retry: RetryPolicy) -> Result<Self, IngestError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .user_agent(user_agent)
            .build()?;

        Ok(Self { client, retry })
    }

    /// GET `url` and return the body bytes of a 2xx response.
    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, IngestError> {
        let client = &self.client;
        retry_with_backoff(self.retry, url, move || async move {
            let response = client
                .get(url)
                .header(reqwest::header::ACCEPT, FEED_ACCEPT)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                return Err(IngestError::UnexpectedStatus {
                    status: status.as_u16(),
                    url: url.to_string(),
                });
            }

            Ok(response.bytes().await?.to_vec())
        })
        .await
    }
}

/// One configured feed endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSource {
    pub publisher: String,
    pub category: String,
    pub url: String,
    pub kind: FeedKind,
}

impl From<FeedSourceSpec> for FeedSource {
    fn from(spec: FeedSourceSpec) -> Self {
        Self {
            publisher: spec.publisher,
            category: spec.category,
            url: spec.url,
            kind: spec.kind,
        }
    }
}

impl FeedSource {
    /// Fetch and parse this source into normalized articles.
    ///
    /// Never fails: a transport, status, or parse failure is logged once and
    /// yields an empty vector.
    pub async fn fetch(&self, client: &FeedClient) -> Vec<Article> {
        self.fetch_or_warn(client).await.unwrap_or_default()
    }

    /// Fetch and parse this source, surfacing the failure to the caller.
    ///
    /// Entries missing a title or link are skipped individually; only a
    /// transport, status, or whole-document parse failure is an error.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError`] if the request fails after retries or the body
    /// cannot be parsed as this source's kind.
    pub async fn try_fetch(&self, client: &FeedClient) -> Result<Vec<Article>, IngestError> {
        let body = client.get_bytes(&self.url).await?;
        let fetched_at = Utc::now();

        match self.kind {
            FeedKind::Rss => parse_syndication_feed(
                &body,
                &self.url,
                &self.publisher,
                &self.category,
                fetched_at,
            ),
            FeedKind::Rest => parse_rest_articles(
                &body,
                &self.url,
                &self.publisher,
                &self.category,
                fetched_at,
            ),
        }
    }

    /// `None` means the source failed and a warning has been emitted.
    async fn fetch_or_warn(&self, client: &FeedClient) -> Option<Vec<Article>> {
        match self.try_fetch(client).await {
            Ok(articles) => {
                tracing::info!(
                    publisher = %self.publisher,
                    category = %self.category,
                    count = articles.len(),
                    "fetched articles"
                );
                Some(articles)
            }
            Err(e) => {
                tracing::warn!(
                    publisher = %self.publisher,
                    category = %self.category,
                    url = %self.url,
                    error = %e,
                    "feed fetch failed"
                );
                None
            }
        }
    }
}

/// Everything one FETCH stage produced.
#[derive(Debug, Default)]
pub struct FetchedArticles {
    /// Articles from all sources, in configuration order.
    pub articles: Vec<Article>,
    /// Number of sources that failed this cycle.
    pub failed_sources: usize,
}

/// The configured set of feed sources.
#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    client: FeedClient,
    sources: Vec<FeedSource>,
    max_concurrent: usize,
}

impl ProviderRegistry {
    #[must_use]
    pub fn new(client: FeedClient, sources: Vec<FeedSource>, max_concurrent: usize) -> Self {
        Self {
            client,
            sources,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Build a registry from flattened feed configuration.
    #[must_use]
    pub fn from_specs(
        client: FeedClient,
        specs: Vec<FeedSourceSpec>,
        max_concurrent: usize,
    ) -> Self {
        Self::new(
            client,
            specs.into_iter().map(FeedSource::from).collect(),
            max_concurrent,
        )
    }

    #[must_use]
    pub fn sources(&self) -> &[FeedSource] {
        &self.sources
    }

    #[must_use]
    pub fn client(&self) -> &FeedClient {
        &self.client
    }

    /// Fetch every source and concatenate the results in configuration order.
    ///
    /// Sources are fetched concurrently (bounded by `max_concurrent`) and all
    /// complete before this returns. A failed source is logged exactly once
    /// and counted in [`FetchedArticles::failed_sources`].
    pub async fn fetch_all(&self) -> FetchedArticles {
        let fetches: Vec<_> = self
            .sources
            .iter()
            .map(|source| source.fetch_or_warn(&self.client))
            .collect();
        let results: Vec<Option<Vec<Article>>> = stream::iter(fetches)
            .buffered(self.max_concurrent)
            .collect()
            .await;

        let mut fetched = FetchedArticles::default();
        for result in results {
            match result {
                Some(articles) => fetched.articles.extend(articles),
                None => fetched.failed_sources += 1,
            }
        }

        fetched
    }
}
