//! Retry with exponential back-off and jitter for feed fetches.
//!
//! Only transient failures are retried. A feed that still fails after the
//! last attempt is reported once by the registry and contributes nothing to
//! the cycle.

use std::future::Future;
use std::time::Duration;

use crate::error::IngestError;

/// Returns `true` for errors that are worth retrying after a back-off delay.
///
/// **Retriable:** timeouts, connection failures, HTTP 5xx and 429.
///
/// **Not retriable:** other statuses, malformed feed documents, JSON decode
/// errors. Retrying won't change the body.
pub(crate) fn is_retriable(err: &IngestError) -> bool {
    match err {
        IngestError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        IngestError::UnexpectedStatus { status, .. } => *status >= 500 || *status == 429,
        IngestError::FeedParse { .. }
        | IngestError::Decode { .. }
        | IngestError::Classifier(_)
        | IngestError::Db(_) => false,
    }
}

/// Back-off settings applied to every feed GET.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RetryPolicy {
    /// Extra attempts after the first failure.
    pub max_retries: u32,
    /// Base delay before the first retry, doubled for each later one.
    pub backoff_base_ms: u64,
}

impl RetryPolicy {
    const MAX_DELAY_MS: u64 = 30_000;

    /// Delay before retry number `attempt` (1-based), with ±25 % jitter.
    ///
    /// `backoff_base_ms × 2ⁿ⁻¹`, capped at 30 s before jitter is applied.
    fn delay_for(self, attempt: u32) -> Duration {
        let computed = self
            .backoff_base_ms
            .saturating_mul(1u64 << attempt.saturating_sub(1).min(10));
        let capped = computed.min(Self::MAX_DELAY_MS);
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss
        )]
        let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
        Duration::from_millis(delay_ms)
    }
}

/// Fetches `url` through `operation`, retrying transient errors per `policy`.
///
/// Non-retriable errors are returned immediately. Each retry is logged at
/// debug level with the feed URL; the final error is left to the caller.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    policy: RetryPolicy,
    url: &str,
    mut operation: F,
) -> Result<T, IngestError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, IngestError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= policy.max_retries {
                    return Err(err);
                }
                attempt += 1;
                let delay = policy.delay_for(attempt);
                tracing::debug!(
                    url,
                    attempt,
                    max_retries = policy.max_retries,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %err,
                    "transient feed fetch error, retrying after back-off"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
