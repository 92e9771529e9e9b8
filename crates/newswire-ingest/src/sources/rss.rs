//! RSS 2.0 / Atom feeds via `feed-rs`.

use chrono::{DateTime, Utc};
use feed_rs::model::Entry;
use newswire_core::Article;

use super::helpers::strip_html;
use crate::error::IngestError;

/// Parse a syndication feed body into normalized articles.
///
/// Publication date falls back from `published` to `updated` to
/// `fetched_at`. Entries with no title or no link are skipped.
///
/// # Errors
///
/// Returns [`IngestError::FeedParse`] if the document is not a recognizable
/// RSS or Atom feed.
pub fn parse_syndication_feed(
    body: &[u8],
    url: &str,
    publisher: &str,
    category: &str,
    fetched_at: DateTime<Utc>,
) -> Result<Vec<Article>, IngestError> {
    let feed = feed_rs::parser::parse(body).map_err(|source| IngestError::FeedParse {
        url: url.to_string(),
        source,
    })?;

    let articles = feed
        .entries
        .iter()
        .filter_map(|entry| {
            let article = entry_to_article(entry, publisher, category, fetched_at);
            if article.is_none() {
                tracing::debug!(
                    feed = %url,
                    entry_id = %entry.id,
                    "skipping feed entry without title or link"
                );
            }
            article
        })
        .collect();

    Ok(articles)
}

fn entry_to_article(
    entry: &Entry,
    publisher: &str,
    category: &str,
    fetched_at: DateTime<Utc>,
) -> Option<Article> {
    let title = entry.title.as_ref().map(|t| t.content.as_str()).unwrap_or_default();
    let link = entry
        .links
        .iter()
        .find(|l| l.rel.as_deref().is_none_or(|rel| rel == "alternate"))
        .or_else(|| entry.links.first())
        .map(|l| l.href.as_str())
        .unwrap_or_default();
    let summary = entry
        .summary
        .as_ref()
        .map(|s| strip_html(&s.content))
        .unwrap_or_default();
    let published_date = entry.published.or(entry.updated).unwrap_or(fetched_at);

    Article::new(title, &summary, link, publisher, category, published_date).ok()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn fetched_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>BBC News - Technology</title>
    <link>https://www.bbc.co.uk/news/technology</link>
    <description>Technology news</description>
    <item>
      <title>Chip maker posts record profits</title>
      <description><![CDATA[<p>Demand for <b>AI</b> hardware keeps rising.</p>]]></description>
      <link>https://www.bbc.co.uk/news/articles/abc123</link>
      <pubDate>Fri, 01 Mar 2024 09:30:00 GMT</pubDate>
    </item>
    <item>
      <title>Undated story</title>
      <link>https://www.bbc.co.uk/news/articles/def456</link>
    </item>
    <item>
      <description>No title here</description>
      <link>https://www.bbc.co.uk/news/articles/ghi789</link>
    </item>
    <item>
      <title>No link here</title>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn parses_rss_items() {
        let articles = parse_syndication_feed(
            RSS.as_bytes(),
            "https://feeds.bbci.co.uk/news/technology/rss.xml",
            "BBC",
            "Technology",
            fetched_at(),
        )
        .unwrap();

        assert_eq!(articles.len(), 2);
        let first = &articles[0];
        assert_eq!(first.title, "Chip maker posts record profits");
        assert_eq!(first.summary, "Demand for AI hardware keeps rising.");
        assert_eq!(first.link, "https://www.bbc.co.uk/news/articles/abc123");
        assert_eq!(first.publisher, "BBC");
        assert_eq!(first.category, "Technology");
        assert_eq!(
            first.published_date,
            Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap()
        );
    }

    #[test]
    fn undated_item_uses_fetch_time() {
        let articles =
            parse_syndication_feed(RSS.as_bytes(), "u", "BBC", "Technology", fetched_at()).unwrap();
        assert_eq!(articles[1].title, "Undated story");
        assert_eq!(articles[1].published_date, fetched_at());
        assert_eq!(articles[1].summary, "");
    }

    #[test]
    fn parses_atom_entries_preferring_alternate_link() {
        let atom = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Sky News</title>
  <id>urn:sky:world</id>
  <updated>2024-03-01T10:00:00Z</updated>
  <entry>
    <title>Summit ends without agreement</title>
    <id>urn:sky:1</id>
    <link rel="enclosure" href="https://news.sky.com/media/1.jpg"/>
    <link rel="alternate" href="https://news.sky.com/story/1"/>
    <updated>2024-03-01T08:15:00Z</updated>
    <summary>Leaders left early.</summary>
  </entry>
</feed>"#;

        let articles =
            parse_syndication_feed(atom.as_bytes(), "u", "Sky News", "World", fetched_at())
                .unwrap();

        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].link, "https://news.sky.com/story/1");
        assert_eq!(articles[0].summary, "Leaders left early.");
        assert_eq!(
            articles[0].published_date,
            Utc.with_ymd_and_hms(2024, 3, 1, 8, 15, 0).unwrap()
        );
    }

    #[test]
    fn malformed_document_is_a_parse_error() {
        let url = "https://x.test/feed";
        let err = parse_syndication_feed(b"<html><body>not a feed", url, "P", "C", fetched_at())
            .unwrap_err();
        assert!(matches!(err, IngestError::FeedParse { url: ref u, .. } if u == url));
    }
}
