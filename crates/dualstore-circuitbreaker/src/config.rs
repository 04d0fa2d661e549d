use std::time::Duration;

use dualstore_core::{EventListeners, FnListener};

use crate::events::CircuitBreakerEvent;
use crate::CircuitState;

/// Configuration for one [`crate::CircuitBreaker`] instance.
pub struct CircuitBreakerConfig {
    pub(crate) name: String,
    pub(crate) failure_threshold: u32,
    pub(crate) recovery_timeout: Duration,
    pub(crate) event_listeners: EventListeners<CircuitBreakerEvent>,
}

impl CircuitBreakerConfig {
    /// Creates a new configuration builder with spec.md §3's defaults:
    /// `failureThreshold = 3`, `recoveryTimeout = 30s`.
    pub fn builder() -> CircuitBreakerConfigBuilder {
        CircuitBreakerConfigBuilder::new()
    }
}

/// Builder for [`CircuitBreakerConfig`].
pub struct CircuitBreakerConfigBuilder {
    name: String,
    failure_threshold: u32,
    recovery_timeout: Duration,
    event_listeners: EventListeners<CircuitBreakerEvent>,
}

impl CircuitBreakerConfigBuilder {
    pub fn new() -> Self {
        Self {
            name: String::from("<unnamed>"),
            failure_threshold: 3,
            recovery_timeout: Duration::from_secs(30),
            event_listeners: EventListeners::new(),
        }
    }

    /// Human-readable name used in logs and events, e.g. `"primary"` / `"secondary"`.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Number of consecutive failures that opens the circuit. Default: 3.
    pub fn failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold.max(1);
        self
    }

    /// How long the breaker stays `Open` before probing `HalfOpen`. Default: 30s.
    pub fn recovery_timeout(mut self, timeout: Duration) -> Self {
        self.recovery_timeout = timeout;
        self
    }

    /// Registers a callback invoked on every state transition.
    pub fn on_state_transition<F>(mut self, f: F) -> Self
    where
        F: Fn(CircuitState, CircuitState) + Send + Sync + 'static,
    {
        self.event_listeners
            .add(FnListener::new(move |event: &CircuitBreakerEvent| {
                if let CircuitBreakerEvent::StateTransition { from, to, .. } = event {
                    f(*from, *to);
                }
            }));
        self
    }

    pub fn build(self) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            name: self.name,
            failure_threshold: self.failure_threshold,
            recovery_timeout: self.recovery_timeout,
            event_listeners: self.event_listeners,
        }
    }
}

impl Default for CircuitBreakerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
