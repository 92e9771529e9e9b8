//! JSON article endpoints shaped as `{ "articles": [ ... ] }`.

use chrono::{DateTime, Utc};
use newswire_core::Article;
use serde::Deserialize;

use crate::error::IngestError;

#[derive(Debug, Deserialize)]
struct RestEnvelope {
    #[serde(default)]
    articles: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RestEntry {
    title: String,
    #[serde(default)]
    summary: Option<String>,
    link: String,
    #[serde(default)]
    publisher: Option<String>,
    #[serde(default)]
    published_date: Option<RestDate>,
    #[serde(default)]
    topic: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RestDate {
    Unix(i64),
    Text(String),
}

impl RestDate {
    fn to_utc(&self) -> Option<DateTime<Utc>> {
        match self {
            RestDate::Unix(secs) => DateTime::from_timestamp(*secs, 0),
            RestDate::Text(text) => {
                let text = text.trim();
                DateTime::parse_from_rfc3339(text)
                    .or_else(|_| DateTime::parse_from_rfc2822(text))
                    .map(|dt| dt.with_timezone(&Utc))
                    .ok()
                    .or_else(|| {
                        text.parse::<i64>()
                            .ok()
                            .and_then(|secs| DateTime::from_timestamp(secs, 0))
                    })
            }
        }
    }
}

/// Parse a REST provider response into normalized articles.
///
/// `publisher` and `category` are used when an entry omits `publisher` or
/// `topic`. Entries that fail to decode, or have an empty title or link,
/// are skipped.
///
/// # Errors
///
/// Returns [`IngestError::Decode`] if the body is not a JSON object with an
/// `articles` array.
pub fn parse_rest_articles(
    body: &[u8],
    url: &str,
    publisher: &str,
    category: &str,
    fetched_at: DateTime<Utc>,
) -> Result<Vec<Article>, IngestError> {
    let envelope: RestEnvelope =
        serde_json::from_slice(body).map_err(|source| IngestError::Decode {
            context: url.to_string(),
            source,
        })?;

    let mut articles = Vec::with_capacity(envelope.articles.len());
    for value in envelope.articles {
        let entry: RestEntry = match serde_json::from_value(value) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!(feed = %url, error = %e, "skipping undecodable REST entry");
                continue;
            }
        };

        let published_date = entry
            .published_date
            .as_ref()
            .and_then(RestDate::to_utc)
            .unwrap_or(fetched_at);
        let entry_publisher = entry
            .publisher
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(publisher);
        let entry_category = entry
            .topic
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(category);

        match Article::new(
            &entry.title,
            entry.summary.as_deref().unwrap_or_default(),
            &entry.link,
            entry_publisher,
            entry_category,
            published_date,
        ) {
            Ok(article) => articles.push(article),
            Err(e) => tracing::debug!(feed = %url, error = %e, "skipping REST entry"),
        }
    }

    Ok(articles)
}
