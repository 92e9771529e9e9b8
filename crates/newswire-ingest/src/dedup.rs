//! Prefilter that drops articles whose link is already stored.
//!
//! This is an optimization only. Two articles sharing a link inside one
//! batch both pass; the store's unique constraint decides which one lands.

use std::collections::HashSet;

use newswire_core::Article;

/// Keep the articles whose `link` is not in `existing`, preserving order.
#[must_use]
pub fn filter_new(articles: Vec<Article>, existing: &HashSet<String>) -> Vec<Article> {
    articles
        .into_iter()
        .filter(|article| !existing.contains(&article.link))
        .collect()
}
