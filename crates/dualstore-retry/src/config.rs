use std::sync::Arc;
use std::time::Duration;

use dualstore_core::{EventListeners, FnListener};

use crate::classifier::{DefaultClassifier, RetryClassifier};
use crate::events::RetryEvent;

/// Configuration for [`crate::retry_with_backoff`].
pub struct RetryConfig<E> {
    pub(crate) name: String,
    pub(crate) max_attempts: u32,
    pub(crate) base_delay: Duration,
    pub(crate) classifier: Arc<dyn RetryClassifier<E>>,
    pub(crate) event_listeners: EventListeners<RetryEvent>,
}

impl<E> RetryConfig<E>
where
    E: 'static,
    DefaultClassifier: RetryClassifier<E>,
{
    /// Creates a builder seeded with spec.md §3's defaults: `retryMaxAttempts = 2`
    /// additional attempts, `retryBaseDelay = 500ms`, and [`DefaultClassifier`].
    pub fn builder() -> RetryConfigBuilder<E> {
        RetryConfigBuilder::new()
    }
}

/// Builder for [`RetryConfig`].
pub struct RetryConfigBuilder<E> {
    name: String,
    max_attempts: u32,
    base_delay: Duration,
    classifier: Arc<dyn RetryClassifier<E>>,
    event_listeners: EventListeners<RetryEvent>,
}

impl<E> RetryConfigBuilder<E>
where
    E: 'static,
    DefaultClassifier: RetryClassifier<E>,
{
    pub fn new() -> Self {
        Self {
            name: String::from("<unnamed>"),
            max_attempts: 2,
            base_delay: Duration::from_millis(500),
            classifier: Arc::new(DefaultClassifier),
            event_listeners: EventListeners::new(),
        }
    }
}

impl<E> RetryConfigBuilder<E> {
    /// Human-readable name used in events, e.g. `"primary"` / `"secondary"`.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Additional attempts after the first. Total attempts = `1 + max_attempts`.
    /// Default: 2.
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Base delay for exponential backoff: `delay = base_delay * 2^(k-1)` after
    /// attempt `k`. Default: 500ms.
    pub fn base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Overrides the classifier deciding which errors are retried.
    pub fn classifier(mut self, classifier: impl RetryClassifier<E> + 'static) -> Self {
        self.classifier = Arc::new(classifier);
        self
    }

    /// Registers a callback invoked before each retry sleep.
    pub fn on_retry<F>(mut self, f: F) -> Self
    where
        F: Fn(u32, Duration) + Send + Sync + 'static,
    {
        self.event_listeners
            .add(FnListener::new(move |event: &RetryEvent| {
                if let RetryEvent::Retry { attempt, delay, .. } = event {
                    f(*attempt, *delay);
                }
            }));
        self
    }

    pub fn build(self) -> RetryConfig<E> {
        RetryConfig {
            name: self.name,
            max_attempts: self.max_attempts,
            base_delay: self.base_delay,
            classifier: self.classifier,
            event_listeners: self.event_listeners,
        }
    }
}

impl<E> Default for RetryConfigBuilder<E>
where
    E: 'static,
    DefaultClassifier: RetryClassifier<E>,
{
    fn default() -> Self {
        Self::new()
    }
}
