//! Sentiment classification over a TEI `/predict` endpoint.
//!
//! The deployed model is a binary POSITIVE/NEGATIVE sequence classifier.
//! A prediction is folded into one signed score: the confidence itself for
//! POSITIVE, its negation for anything else.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::IngestError;

/// One label/confidence pair returned by the classifier.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Prediction {
    pub label: String,
    pub score: f64,
}

/// Map a prediction to a signed sentiment in `[-1.0, 1.0]`.
#[must_use]
pub fn signed_sentiment(prediction: &Prediction) -> f64 {
    let score = prediction.score.clamp(0.0, 1.0);
    if prediction.label.eq_ignore_ascii_case("POSITIVE") {
        score
    } else {
        -score
    }
}

/// Batch sentiment classifier.
pub trait SentimentClassifier: Send + Sync {
    /// Classify `titles`, returning exactly one prediction per title in order.
    fn classify(
        &self,
        titles: &[String],
    ) -> impl Future<Output = Result<Vec<Prediction>, IngestError>> + Send;
}

#[derive(Serialize)]
struct PredictRequest<'a> {
    inputs: Vec<[&'a str; 1]>,
    truncate: bool,
}

/// TEI returns either one list of labels per input or, for single-label
/// output, a flat list.
#[derive(Deserialize)]
#[serde(untagged)]
enum PredictResponse {
    Nested(Vec<Vec<Prediction>>),
    Flat(Vec<Prediction>),
}

fn top_label(mut predictions: Vec<Prediction>) -> Option<Prediction> {
    predictions.sort_by(|a, b| b.score.total_cmp(&a.score));
    predictions.into_iter().next()
}

/// TEI HTTP client.
#[derive(Debug, Clone)]
pub struct TeiClassifier {
    client: reqwest::Client,
    url: String,
}

impl TeiClassifier {
    /// Create a client posting to `{base_url}/predict`.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Http`] if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration, user_agent: &str) -> Result<Self, IngestError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent.to_string())
            .build()?;

        Ok(Self {
            client,
            url: format!("{}/predict", base_url.trim_end_matches('/')),
        })
    }

    fn decode(response: PredictResponse, expected: usize) -> Result<Vec<Prediction>, IngestError> {
        let predictions: Vec<Prediction> = match response {
            PredictResponse::Nested(per_input) => per_input
                .into_iter()
                .map(|labels| {
                    top_label(labels).ok_or_else(|| {
                        IngestError::Classifier(
                            "classifier returned no labels for an input".to_string(),
                        )
                    })
                })
                .collect::<Result<_, _>>()?,
            PredictResponse::Flat(flat) if flat.len() == expected => flat,
            PredictResponse::Flat(flat) if expected == 1 => top_label(flat).into_iter().collect(),
            PredictResponse::Flat(flat) => flat,
        };

        if predictions.len() != expected {
            return Err(IngestError::Classifier(format!(
                "classifier returned {} predictions for {} inputs",
                predictions.len(),
                expected
            )));
        }

        Ok(predictions)
    }
}

impl SentimentClassifier for TeiClassifier {
    async fn classify(&self, titles: &[String]) -> Result<Vec<Prediction>, IngestError> {
        if titles.is_empty() {
            return Ok(Vec::new());
        }

        let request = PredictRequest {
            inputs: titles.iter().map(|t| [t.as_str()]).collect(),
            truncate: true,
        };
        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| IngestError::Classifier(format!("classifier request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(IngestError::Classifier(format!(
                "classifier returned status {}",
                response.status()
            )));
        }

        let body: PredictResponse = response
            .json()
            .await
            .map_err(|e| IngestError::Classifier(format!("classifier response parse error: {e}")))?;

        Self::decode(body, titles.len())
    }
}
