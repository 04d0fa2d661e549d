use std::time::{Duration, Instant};

use dualstore_core::ResilienceEvent;

/// Events emitted by [`crate::retry_with_backoff`].
#[derive(Debug, Clone)]
pub enum RetryEvent {
    /// A retry attempt is about to be made after `delay`.
    Retry {
        store: String,
        timestamp: Instant,
        attempt: u32,
        delay: Duration,
    },
    /// The operation succeeded, possibly after retries.
    Success {
        store: String,
        timestamp: Instant,
        attempts: u32,
    },
    /// All attempts were exhausted; the last error is being propagated.
    Exhausted {
        store: String,
        timestamp: Instant,
        attempts: u32,
    },
    /// The error was not retryable and was propagated immediately.
    NonRetryable {
        store: String,
        timestamp: Instant,
    },
}

impl ResilienceEvent for RetryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RetryEvent::Retry { .. } => "Retry",
            RetryEvent::Success { .. } => "Success",
            RetryEvent::Exhausted { .. } => "Exhausted",
            RetryEvent::NonRetryable { .. } => "NonRetryable",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            RetryEvent::Retry { timestamp, .. }
            | RetryEvent::Success { timestamp, .. }
            | RetryEvent::Exhausted { timestamp, .. }
            | RetryEvent::NonRetryable { timestamp, .. } => *timestamp,
        }
    }
}
