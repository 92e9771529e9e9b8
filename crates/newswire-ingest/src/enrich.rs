//! ENRICH stage: sentiment for the whole batch, then best-effort images.

use std::time::Duration;

use futures::stream::{self, StreamExt};
use newswire_core::{Article, EnrichedArticle};

use crate::classifier::{signed_sentiment, SentimentClassifier};
use crate::error::IngestError;
use crate::image::ImageLookup;

/// Attaches sentiment and preview images to new articles.
///
/// Sentiment is all-or-nothing per batch: if the classifier fails or returns
/// the wrong number of predictions, no article in the batch is enriched.
/// Image lookups are independent per article and never fail the batch.
#[derive(Debug)]
pub struct Enricher<C, I> {
    classifier: C,
    images: I,
    max_concurrent_images: usize,
    image_timeout: Duration,
}

impl<C, I> Enricher<C, I>
where
    C: SentimentClassifier,
    I: ImageLookup,
{
    #[must_use]
    pub fn new(
        classifier: C,
        images: I,
        max_concurrent_images: usize,
        image_timeout: Duration,
    ) -> Self {
        Self {
            classifier,
            images,
            max_concurrent_images: max_concurrent_images.max(1),
            image_timeout,
        }
    }

    /// Enrich `articles`, preserving order.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Classifier`] if the sentiment batch fails.
    pub async fn enrich(
        &self,
        articles: Vec<Article>,
    ) -> Result<Vec<EnrichedArticle>, IngestError> {
        if articles.is_empty() {
            return Ok(Vec::new());
        }

        let titles: Vec<String> = articles.iter().map(|a| a.title.clone()).collect();
        let predictions = self.classifier.classify(&titles).await?;
        if predictions.len() != articles.len() {
            return Err(IngestError::Classifier(format!(
                "classifier returned {} predictions for {} inputs",
                predictions.len(),
                articles.len()
            )));
        }

        let lookups: Vec<_> = articles
            .iter()
            .map(|article| self.preview_image(&article.link))
            .collect();
        let image_urls: Vec<String> = stream::iter(lookups)
            .buffered(self.max_concurrent_images)
            .collect()
            .await;

        Ok(articles
            .into_iter()
            .zip(predictions.iter().map(signed_sentiment))
            .zip(image_urls)
            .map(|((article, sentiment), image_url)| EnrichedArticle {
                article,
                sentiment,
                image_url,
            })
            .collect())
    }

    /// Empty string when the lookup fails, times out, or finds nothing.
    async fn preview_image(&self, link: &str) -> String {
        match tokio::time::timeout(self.image_timeout, self.images.lookup(link)).await {
            Ok(Ok(Some(url))) => url,
            Ok(Ok(None)) => String::new(),
            Ok(Err(e)) => {
                tracing::debug!(link, error = %e, "preview image lookup failed");
                String::new()
            }
            Err(_) => {
                tracing::debug!(link, "preview image lookup timed out");
                String::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::Utc;

    use super::*;
    use crate::classifier::Prediction;

    struct FixedClassifier {
        predictions: Vec<Prediction>,
        calls: AtomicUsize,
    }

    impl SentimentClassifier for FixedClassifier {
        async fn classify(&self, _titles: &[String]) -> Result<Vec<Prediction>, IngestError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.predictions.clone())
        }
    }

    struct FailingClassifier;

    impl SentimentClassifier for FailingClassifier {
        async fn classify(&self, _titles: &[String]) -> Result<Vec<Prediction>, IngestError> {
            Err(IngestError::Classifier("model unavailable".to_string()))
        }
    }

    /// Links ending in "/broken" fail; everything else gets `<link>.jpg`.
    struct StubImages {
        calls: AtomicUsize,
    }

    impl ImageLookup for StubImages {
        async fn lookup(&self, url: &str) -> Result<Option<String>, IngestError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if url.ends_with("/broken") {
                Err(IngestError::UnexpectedStatus {
                    status: 404,
                    url: url.to_string(),
                })
            } else {
                Ok(Some(format!("{url}.jpg")))
            }
        }
    }

    fn stub_images() -> StubImages {
        StubImages {
            calls: AtomicUsize::new(0),
        }
    }

    fn article(link: &str) -> Article {
        Article::new("headline", "", link, "BBC", "World", Utc::now()).unwrap()
    }

    fn prediction(label: &str, score: f64) -> Prediction {
        Prediction {
            label: label.to_string(),
            score,
        }
    }

    #[tokio::test]
    async fn attaches_signed_sentiment_and_images_in_order() {
        let classifier = FixedClassifier {
            predictions: vec![prediction("POSITIVE", 0.8), prediction("NEGATIVE", 0.6)],
            calls: AtomicUsize::new(0),
        };
        let enricher = Enricher::new(classifier, stub_images(), 4, Duration::from_secs(1));

        let enriched = enricher
            .enrich(vec![article("http://news.test/a"), article("http://news.test/b")])
            .await
            .unwrap();

        assert_eq!(enriched.len(), 2);
        assert_eq!(enriched[0].article.link, "http://news.test/a");
        assert!((enriched[0].sentiment - 0.8).abs() < f64::EPSILON);
        assert_eq!(enriched[0].image_url, "http://news.test/a.jpg");
        assert!((enriched[1].sentiment + 0.6).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn image_failure_only_blanks_that_article() {
        let classifier = FixedClassifier {
            predictions: vec![prediction("POSITIVE", 0.5), prediction("POSITIVE", 0.5)],
            calls: AtomicUsize::new(0),
        };
        let enricher = Enricher::new(classifier, stub_images(), 2, Duration::from_secs(1));

        let enriched = enricher
            .enrich(vec![article("http://x/broken"), article("http://news.test/y")])
            .await
            .unwrap();

        assert_eq!(enriched[0].image_url, "");
        assert_eq!(enriched[1].image_url, "http://news.test/y.jpg");
    }

    #[tokio::test]
    async fn classifier_failure_fails_whole_batch_without_image_lookups() {
        let images = stub_images();
        let enricher = Enricher::new(FailingClassifier, images, 2, Duration::from_secs(1));

        let err = enricher
            .enrich(vec![article("http://news.test/a"), article("http://news.test/b")])
            .await
            .unwrap_err();

        assert!(matches!(err, IngestError::Classifier(_)));
        assert_eq!(enricher.images.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn prediction_count_mismatch_fails_batch() {
        let classifier = FixedClassifier {
            predictions: vec![prediction("POSITIVE", 0.9)],
            calls: AtomicUsize::new(0),
        };
        let enricher = Enricher::new(classifier, stub_images(), 2, Duration::from_secs(1));

        let result = enricher
            .enrich(vec![article("http://news.test/a"), article("http://news.test/b")])
            .await;

        assert!(matches!(result, Err(IngestError::Classifier(_))));
    }

    #[tokio::test]
    async fn empty_batch_skips_external_calls() {
        let classifier = FixedClassifier {
            predictions: Vec::new(),
            calls: AtomicUsize::new(0),
        };
        let enricher = Enricher::new(classifier, stub_images(), 2, Duration::from_secs(1));

        assert!(enricher.enrich(Vec::new()).await.unwrap().is_empty());
        assert_eq!(enricher.classifier.calls.load(Ordering::SeqCst), 0);
        assert_eq!(enricher.images.calls.load(Ordering::SeqCst), 0);
    }
}
