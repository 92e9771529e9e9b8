//! Preview-image lookup from an article page's social meta tags.

use std::future::Future;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

use crate::error::IngestError;

static META_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<meta\b[^>]*>").expect("valid regex"));
static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)([a-z][a-z0-9:_-]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .expect("valid attr regex")
});

/// Meta keys checked in priority order.
const IMAGE_META_KEYS: [&str; 3] = ["og:image", "og:image:url", "twitter:image"];

/// Best-effort preview image resolver.
pub trait ImageLookup: Send + Sync {
    /// Resolve the preview image for the page at `url`.
    ///
    /// `Ok(None)` means the page has no usable image tag.
    fn lookup(&self, url: &str) -> impl Future<Output = Result<Option<String>, IngestError>> + Send;
}

/// Fetches the article page and reads its Open Graph / Twitter image tag.
#[derive(Debug, Clone)]
pub struct OgImageLookup {
    client: reqwest::Client,
}

impl OgImageLookup {
    /// # Errors
    ///
    /// Returns [`IngestError::Http`] if the HTTP client cannot be built.
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, IngestError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent.to_string())
            .build()?;
        Ok(Self { client })
    }
}

impl ImageLookup for OgImageLookup {
    async fn lookup(&self, url: &str) -> Result<Option<String>, IngestError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "text/html,application/xhtml+xml")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        // Relative image paths resolve against the final URL after redirects.
        let base = response.url().to_string();
        let body = response.text().await?;
        Ok(extract_preview_image(&base, &body))
    }
}

/// Extract the preview image URL from an HTML document.
///
/// Checks `og:image`, then `og:image:url`, then `twitter:image`, matching on
/// either the `property` or `name` attribute. The result is absolutized
/// against `base_url`.
#[must_use]
pub fn extract_preview_image(base_url: &str, html: &str) -> Option<String> {
    IMAGE_META_KEYS.iter().find_map(|key| {
        let content = find_meta_content(html, "property", key)
            .or_else(|| find_meta_content(html, "name", key))?;
        absolutize_url(base_url, &content)
    })
}

fn find_meta_content(html: &str, key_attr: &str, key_value: &str) -> Option<String> {
    META_TAG_RE.find_iter(html).find_map(|m| {
        let tag = m.as_str();
        let key = extract_attr(tag, key_attr)?;
        if key.eq_ignore_ascii_case(key_value) {
            extract_attr(tag, "content").filter(|c| !c.is_empty())
        } else {
            None
        }
    })
}

fn extract_attr(tag: &str, attr: &str) -> Option<String> {
    ATTR_RE.captures_iter(tag).find_map(|c| {
        let name = c.get(1)?.as_str();
        if !name.eq_ignore_ascii_case(attr) {
            return None;
        }
        c.get(2)
            .or_else(|| c.get(3))
            .map(|m| m.as_str().trim().to_string())
    })
}

fn absolutize_url(base_url: &str, candidate: &str) -> Option<String> {
    let candidate = candidate.replace("&amp;", "&");
    let base = reqwest::Url::parse(base_url).ok()?;
    base.join(&candidate).ok().map(|u| u.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://www.bbc.co.uk/news/articles/abc123";

    #[test]
    fn reads_og_image_property() {
        let html = r#"<html><head>
            <meta property="og:title" content="Headline">
            <meta property="og:image" content="https://ichef.bbci.co.uk/news/1024/lead.jpg">
        </head></html>"#;
        assert_eq!(
            extract_preview_image(BASE, html).as_deref(),
            Some("https://ichef.bbci.co.uk/news/1024/lead.jpg")
        );
    }

    #[test]
    fn attribute_order_and_quotes_do_not_matter() {
        let html = r"<meta content='https://cdn.test/a.png' property='og:image' />";
        assert_eq!(
            extract_preview_image(BASE, html).as_deref(),
            Some("https://cdn.test/a.png")
        );
    }

    #[test]
    fn falls_back_to_twitter_image_by_name() {
        let html = r#"<meta name="twitter:image" content="https://cdn.test/tw.jpg">"#;
        assert_eq!(
            extract_preview_image(BASE, html).as_deref(),
            Some("https://cdn.test/tw.jpg")
        );
    }

    #[test]
    fn og_image_wins_over_twitter_image() {
        let html = r#"
            <meta name="twitter:image" content="https://cdn.test/tw.jpg">
            <meta property="og:image" content="https://cdn.test/og.jpg">"#;
        assert_eq!(
            extract_preview_image(BASE, html).as_deref(),
            Some("https://cdn.test/og.jpg")
        );
    }

    #[test]
    fn relative_image_is_absolutized() {
        let html = r#"<meta property="og:image" content="/media/lead.jpg?w=640&amp;h=360">"#;
        assert_eq!(
            extract_preview_image(BASE, html).as_deref(),
            Some("https://www.bbc.co.uk/media/lead.jpg?w=640&h=360")
        );
    }

    #[test]
    fn page_without_image_tags_yields_none() {
        let html = concat!(
            r#"<meta property="og:title" content="Headline">"#,
            r#"<meta property="og:image" content="">"#,
        );
        assert_eq!(extract_preview_image(BASE, html), None);
    }
}
