use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Wire format of a configured feed endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedKind {
    /// RSS 2.0, Atom, or JSON Feed syndication document.
    #[default]
    Rss,
    /// JSON REST endpoint returning an `articles` array.
    Rest,
}

impl std::fmt::Display for FeedKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedKind::Rss => write!(f, "rss"),
            FeedKind::Rest => write!(f, "rest"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    pub category: String,
    pub url: String,
    #[serde(default)]
    pub kind: FeedKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublisherConfig {
    pub name: String,
    pub feeds: Vec<FeedConfig>,
}

#[derive(Debug, Deserialize)]
pub struct FeedsFile {
    pub publishers: Vec<PublisherConfig>,
}

/// One `(publisher, category, url)` entry, flattened from [`FeedsFile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSourceSpec {
    pub publisher: String,
    pub category: String,
    pub url: String,
    pub kind: FeedKind,
}

impl FeedsFile {
    /// Flatten into source specs in configuration order: publisher, then
    /// category within publisher.
    #[must_use]
    pub fn sources(&self) -> Vec<FeedSourceSpec> {
        self.publishers
            .iter()
            .flat_map(|publisher| {
                publisher.feeds.iter().map(|feed| FeedSourceSpec {
                    publisher: publisher.name.clone(),
                    category: feed.category.clone(),
                    url: feed.url.clone(),
                    kind: feed.kind,
                })
            })
            .collect()
    }
}

/// Load and validate the feeds configuration from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_feeds(path: &Path) -> Result<FeedsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FeedsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_feeds(&content)
}

/// Parse and validate feeds configuration from a YAML string.
///
/// # Errors
///
/// Returns `ConfigError` if the YAML is malformed or fails validation.
pub fn parse_feeds(yaml: &str) -> Result<FeedsFile, ConfigError> {
    let feeds_file: FeedsFile = serde_yaml::from_str(yaml)?;
    validate_feeds(&feeds_file)?;
    Ok(feeds_file)
}

fn validate_feeds(feeds_file: &FeedsFile) -> Result<(), ConfigError> {
    let mut seen_publishers = HashSet::new();

    for publisher in &feeds_file.publishers {
        if publisher.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "publisher name must be non-empty".to_string(),
            ));
        }

        if !seen_publishers.insert(publisher.name.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate publisher: '{}'",
                publisher.name
            )));
        }

        let mut seen_categories = HashSet::new();
        for feed in &publisher.feeds {
            if feed.category.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "publisher '{}' has a feed with an empty category",
                    publisher.name
                )));
            }

            if !seen_categories.insert(feed.category.to_lowercase()) {
                return Err(ConfigError::Validation(format!(
                    "publisher '{}' lists category '{}' more than once",
                    publisher.name, feed.category
                )));
            }

            if !(feed.url.starts_with("http://") || feed.url.starts_with("https://")) {
                return Err(ConfigError::Validation(format!(
                    "feed '{}/{}' has non-http url '{}'",
                    publisher.name, feed.category, feed.url
                )));
            }
        }
    }

    Ok(())
}
