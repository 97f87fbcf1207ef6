//! Retry with exponential back-off and jitter for idempotent API calls.
//!
//! Only GET requests go through [`retry_with_backoff`]. Creating a part is
//! never retried: a duplicate create is worse than a surfaced error.

use std::future::Future;
use std::time::Duration;

use rand::Rng;

use crate::error::ClientError;

/// Longest server-requested wait we are willing to honor.
const MAX_RETRY_AFTER: Duration = Duration::from_secs(30);

/// Cap on the computed exponential delay, before jitter.
const MAX_BACKOFF_MS: u64 = 10_000;

/// Returns `true` for errors that are worth retrying after a delay.
///
/// **Retriable:**
/// - Network-level failures: timeout, connection refused or reset.
/// - HTTP 429 and 5xx responses.
///
/// **Not retriable:**
/// - Other 4xx responses; the request itself is wrong.
/// - [`ClientError::Deserialize`], [`ClientError::InvalidUrl`],
///   [`ClientError::EmptyBody`]; retrying returns the same thing.
pub(crate) fn is_retriable(err: &ClientError) -> bool {
    match err {
        ClientError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        ClientError::RateLimited { .. } => true,
        ClientError::Api { status, .. } => *status >= 500,
        ClientError::Deserialize { .. }
        | ClientError::InvalidUrl { .. }
        | ClientError::EmptyBody { .. } => false,
    }
}

/// Delay before retry number `retry` (1-based).
///
/// A rate-limit response that names its own delay is obeyed, up to
/// [`MAX_RETRY_AFTER`]. Everything else waits `backoff_base_ms * 2^(retry-1)`,
/// capped at 10 s, with ±25 % jitter.
pub(crate) fn delay_before_retry(err: &ClientError, retry: u32, backoff_base_ms: u64) -> Duration {
    if let ClientError::RateLimited {
        retry_after: Some(wait),
        ..
    } = err
    {
        return (*wait).min(MAX_RETRY_AFTER);
    }
    let exponent = retry.saturating_sub(1).min(16);
    let nominal = backoff_base_ms
        .saturating_mul(1u64 << exponent)
        .min(MAX_BACKOFF_MS);
    let spread = nominal / 4;
    let jittered = rand::rng().random_range(nominal - spread..=nominal + spread);
    Duration::from_millis(jittered)
}

/// Runs `operation`, retrying transient failures up to `max_retries` times.
///
/// Non-retriable errors, and the error from the final attempt, are returned
/// unchanged.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, ClientError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ClientError>>,
{
    let mut retries = 0u32;
    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if retries == max_retries || !is_retriable(&err) {
            return Err(err);
        }
        retries += 1;
        let delay = delay_before_retry(&err, retries, backoff_base_ms);
        tracing::warn!(
            retry = retries,
            max_retries,
            ?delay,
            status = ?err.status(),
            error = %err,
            "request failed, retrying"
        );
        tokio::time::sleep(delay).await;
    }
}
