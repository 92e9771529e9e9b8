//! Article records as they move through ingestion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArticleError {
    #[error("entry has no title")]
    MissingTitle,
    #[error("entry has no link")]
    MissingLink,
}

/// A normalized article as produced by a feed source.
///
/// `link` is the identity key used for deduplication and the store's
/// unique constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub summary: String,
    pub link: String,
    pub publisher: String,
    pub category: String,
    pub published_date: DateTime<Utc>,
}

impl Article {
    /// Build an article, trimming `title` and putting `link` in canonical form.
    ///
    /// # Errors
    ///
    /// Returns [`ArticleError`] if `title` or `link` is empty after trimming.
    pub fn new(
        title: &str,
        summary: &str,
        link: &str,
        publisher: &str,
        category: &str,
        published_date: DateTime<Utc>,
    ) -> Result<Self, ArticleError> {
        let title = title.trim();
        let link = link.trim();
        if title.is_empty() {
            return Err(ArticleError::MissingTitle);
        }
        if link.is_empty() {
            return Err(ArticleError::MissingLink);
        }

        Ok(Self {
            title: title.to_string(),
            summary: summary.trim().to_string(),
            link: canonical_link(link),
            publisher: publisher.to_string(),
            category: category.to_string(),
            published_date,
        })
    }
}

/// Canonical form of an article link, shared by every source kind.
///
/// Absolute URLs are normalized the way the URL standard serializes them
/// (lowercase scheme and host, default port dropped, `/` path for a bare
/// host). Anything that does not parse as a URL is kept as trimmed.
#[must_use]
pub fn canonical_link(link: &str) -> String {
    let link = link.trim();
    url::Url::parse(link).map_or_else(|_| link.to_string(), String::from)
}

/// An article after sentiment and preview-image enrichment. Only values of
/// this type are ever persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedArticle {
    pub article: Article,
    /// Signed classifier confidence in `[-1.0, 1.0]`.
    pub sentiment: f64,
    /// Preview image URL, empty when none could be resolved.
    pub image_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_trims_title_and_link() {
        let article = Article::new(
            "  Headline \n",
            " body ",
            " https://example.com/a ",
            "BBC",
            "World",
            Utc::now(),
        )
        .expect("valid article");
        assert_eq!(article.title, "Headline");
        assert_eq!(article.summary, "body");
        assert_eq!(article.link, "https://example.com/a");
    }

    #[test]
    fn link_is_canonicalized() {
        let article = Article::new("T", "", "HTTP://Example.COM:80", "BBC", "World", Utc::now())
            .expect("valid article");
        assert_eq!(article.link, "http://example.com/");
    }

    #[test]
    fn canonical_link_is_idempotent() {
        let once = canonical_link("https://News.Example.com/story?id=1");
        assert_eq!(once, "https://news.example.com/story?id=1");
        assert_eq!(canonical_link(&once), once);
    }

    #[test]
    fn unparsable_link_is_kept_trimmed() {
        assert_eq!(canonical_link("  urn-less story id "), "urn-less story id");
    }

    #[test]
    fn new_rejects_blank_title() {
        let err = Article::new("  ", "", "https://example.com/a", "BBC", "World", Utc::now())
            .unwrap_err();
        assert_eq!(err, ArticleError::MissingTitle);
    }

    #[test]
    fn new_rejects_blank_link() {
        let err = Article::new("Headline", "", "", "BBC", "World", Utc::now()).unwrap_err();
        assert_eq!(err, ArticleError::MissingLink);
    }

    #[test]
    fn enriched_article_serializes_with_nested_article() {
        let enriched = EnrichedArticle {
            article: Article::new("T", "", "http://b", "BBC", "World", Utc::now()).unwrap(),
            sentiment: -0.5,
            image_url: String::new(),
        };
        let value = serde_json::to_value(&enriched).unwrap();
        assert_eq!(value["article"]["link"], "http://b/");
        assert_eq!(value["sentiment"], -0.5);
        assert_eq!(value["image_url"], "");
    }
}
