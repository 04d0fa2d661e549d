//! Bounded exponential-backoff retry policy for transient store failures.
//!
//! [`retry_with_backoff`] runs an async operation up to `1 + max_attempts`
//! times, sleeping `base_delay * 2^(k-1)` between attempt `k` and `k+1`, and
//! only for errors the configured [`RetryClassifier`] deems retryable.

mod classifier;
mod config;
mod events;

pub use classifier::{DefaultClassifier, FnClassifier, RetryClassifier};
pub use config::{RetryConfig, RetryConfigBuilder};
pub use events::RetryEvent;

use std::future::Future;
use std::time::Instant;

/// Runs `op` under the retry policy in `config`.
///
/// - Succeeds on the first successful attempt; no further attempts are made.
/// - A non-retryable error (per `config`'s classifier) propagates immediately,
///   with zero sleeps.
/// - A retryable error sleeps `base_delay * 2^(k-1)` after attempt `k`
///   (1-indexed) and retries, up to `1 + max_attempts` total attempts.
/// - If every attempt fails, the last error is returned.
pub async fn retry_with_backoff<F, Fut, T, E>(config: &RetryConfig<E>, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt: u32 = 0;

    loop {
        match op().await {
            Ok(value) => {
                config.event_listeners.emit(&RetryEvent::Success {
                    store: config.name.clone(),
                    timestamp: Instant::now(),
                    attempts: attempt + 1,
                });

                #[cfg(feature = "tracing")]
                if attempt > 0 {
                    tracing::info!(store = %config.name, attempts = attempt + 1, "succeeded after retries");
                }

                #[cfg(feature = "metrics")]
                metrics::counter!("retry_success_total", "store" => config.name.clone())
                    .increment(1);

                return Ok(value);
            }
            Err(error) => {
                if !config.classifier.is_retryable(&error) {
                    config.event_listeners.emit(&RetryEvent::NonRetryable {
                        store: config.name.clone(),
                        timestamp: Instant::now(),
                    });

                    #[cfg(feature = "tracing")]
                    tracing::debug!(store = %config.name, "error not retryable, propagating immediately");

                    return Err(error);
                }

                if attempt >= config.max_attempts {
                    config.event_listeners.emit(&RetryEvent::Exhausted {
                        store: config.name.clone(),
                        timestamp: Instant::now(),
                        attempts: attempt + 1,
                    });

                    #[cfg(feature = "tracing")]
                    tracing::warn!(store = %config.name, attempts = attempt + 1, "retries exhausted");

                    #[cfg(feature = "metrics")]
                    metrics::counter!("retry_exhausted_total", "store" => config.name.clone())
                        .increment(1);

                    return Err(error);
                }

                let delay = config.base_delay * 2u32.pow(attempt);

                config.event_listeners.emit(&RetryEvent::Retry {
                    store: config.name.clone(),
                    timestamp: Instant::now(),
                    attempt: attempt + 1,
                    delay,
                });

                #[cfg(feature = "tracing")]
                tracing::debug!(store = %config.name, attempt = attempt + 1, delay_ms = delay.as_millis(), "retrying after delay");

                #[cfg(feature = "metrics")]
                metrics::counter!("retry_attempts_total", "store" => config.name.clone())
                    .increment(1);

                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
