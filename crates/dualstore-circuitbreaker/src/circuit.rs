use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use dualstore_core::{Clock, MonotonicClock};

use crate::config::CircuitBreakerConfig;
use crate::events::CircuitBreakerEvent;

/// State of a per-store circuit breaker. See spec.md §3/§4.2 for the full state
/// machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CircuitState {
    Closed = 0,
    Open = 1,
    HalfOpen = 2,
}

impl CircuitState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => CircuitState::Closed,
            1 => CircuitState::Open,
            _ => CircuitState::HalfOpen,
        }
    }
}

struct Inner {
    state: CircuitState,
    failure_count: u32,
    last_failure_at_millis: Option<u64>,
}

/// Per-store failure-isolation gate. `CLOSED ⇒ failureCount < failureThreshold`,
/// `OPEN ⇒ lastFailureAt ≠ null`, and the full state tuple is guarded by a single
/// mutex so the lazy `Open → HalfOpen` transition in [`CircuitBreaker::observe_state`]
/// is atomic with respect to concurrent observers (spec.md §4.2 "Concurrency").
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    inner: Mutex<Inner>,
    state_atomic: Arc<AtomicU8>,
    clock: Arc<dyn Clock>,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self::with_clock(config, Arc::new(MonotonicClock::default()))
    }

    /// Constructs a breaker backed by an explicit [`Clock`], so
    /// `recoveryTimeout`-dependent transitions can be driven deterministically in
    /// tests.
    pub fn with_clock(config: CircuitBreakerConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                failure_count: 0,
                last_failure_at_millis: None,
            }),
            state_atomic: Arc::new(AtomicU8::new(CircuitState::Closed as u8)),
            clock,
        }
    }

    /// Returns the current state, performing the lazy `Open → HalfOpen` transition
    /// as a side effect if `recoveryTimeout` has elapsed (spec.md §4.2).
    pub fn observe_state(&self) -> CircuitState {
        let mut inner = self.inner.lock().unwrap();
        if inner.state == CircuitState::Open {
            if let Some(last_failure) = inner.last_failure_at_millis {
                let elapsed = self.clock.now_millis().saturating_sub(last_failure);
                if elapsed >= self.config.recovery_timeout.as_millis() as u64 {
                    self.transition(&mut inner, CircuitState::HalfOpen, "recovery timeout elapsed");
                }
            }
        }
        inner.state
    }

    /// `true` iff [`Self::observe_state`] is `Closed` or `HalfOpen`.
    pub fn allow(&self) -> bool {
        !matches!(self.observe_state(), CircuitState::Open)
    }

    /// Returns the current `failureCount` without forcing a state re-evaluation.
    pub fn failure_count(&self) -> u32 {
        self.inner.lock().unwrap().failure_count
    }

    pub fn state(&self) -> CircuitState {
        CircuitState::from_u8(self.state_atomic.load(Ordering::Acquire))
    }

    /// `state ← CLOSED`, `failureCount ← 0`, `lastFailureAt ← null`, from any state.
    pub fn record_success(&self) {
        let mut inner = self.inner.lock().unwrap();
        let from = inner.state;
        inner.failure_count = 0;
        inner.last_failure_at_millis = None;
        if from != CircuitState::Closed {
            self.transition(&mut inner, CircuitState::Closed, "success recorded");
        } else {
            inner.state = CircuitState::Closed;
        }

        self.config
            .event_listeners
            .emit(&CircuitBreakerEvent::SuccessRecorded {
                store: self.config.name.clone(),
                timestamp: Instant::now(),
                state: inner.state,
            });

        #[cfg(feature = "tracing")]
        tracing::debug!(store = %self.config.name, "circuit breaker: success recorded");

        #[cfg(feature = "metrics")]
        metrics::counter!("circuitbreaker_success_total", "store" => self.config.name.clone())
            .increment(1);
    }

    /// `failureCount += 1`; unconditional `HalfOpen → Open`, else `Open` once
    /// `failureCount ≥ failureThreshold` (spec.md §4.2).
    pub fn record_failure(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.failure_count += 1;
        inner.last_failure_at_millis = Some(self.clock.now_millis());
        let failure_count = inner.failure_count;

        match inner.state {
            CircuitState::HalfOpen => {
                self.transition(&mut inner, CircuitState::Open, "half-open trial failed");
            }
            _ if failure_count >= self.config.failure_threshold => {
                self.transition(&mut inner, CircuitState::Open, "failure threshold reached");
            }
            _ => {}
        }

        self.config
            .event_listeners
            .emit(&CircuitBreakerEvent::FailureRecorded {
                store: self.config.name.clone(),
                timestamp: Instant::now(),
                state: inner.state,
                failure_count,
            });

        #[cfg(feature = "tracing")]
        tracing::warn!(store = %self.config.name, failure_count, "circuit breaker: failure recorded");

        #[cfg(feature = "metrics")]
        metrics::counter!("circuitbreaker_failure_total", "store" => self.config.name.clone())
            .increment(1);
    }

    /// Forces the breaker back to `Closed` with a clean counter. Testing affordance
    /// per spec.md §4.2.
    pub fn reset(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.failure_count = 0;
        inner.last_failure_at_millis = None;
        self.transition(&mut inner, CircuitState::Closed, "manual reset");
    }

    fn transition(&self, inner: &mut Inner, to: CircuitState, reason: &'static str) {
        let from = inner.state;
        if from == to {
            return;
        }
        inner.state = to;
        self.state_atomic.store(to as u8, Ordering::Release);

        self.config
            .event_listeners
            .emit(&CircuitBreakerEvent::StateTransition {
                store: self.config.name.clone(),
                timestamp: Instant::now(),
                from,
                to,
                reason,
            });

        #[cfg(feature = "tracing")]
        tracing::info!(store = %self.config.name, ?from, ?to, reason, "circuit breaker state transition");

        #[cfg(feature = "metrics")]
        metrics::counter!(
            "circuitbreaker_transitions_total",
            "store" => self.config.name.clone(),
            "to" => match to {
                CircuitState::Closed => "closed",
                CircuitState::Open => "open",
                CircuitState::HalfOpen => "half_open",
            }
        )
        .increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CircuitBreakerConfig;
    use dualstore_core::ManualClock;
    use std::time::Duration;

    fn breaker(threshold: u32, recovery: Duration) -> (CircuitBreaker, ManualClock) {
        let clock = ManualClock::new();
        let config = CircuitBreakerConfig::builder()
            .name("test")
            .failure_threshold(threshold)
            .recovery_timeout(recovery)
            .build();
        let breaker = CircuitBreaker::with_clock(config, Arc::new(clock.clone()));
        (breaker, clock)
    }

    #[test]
    fn starts_closed_and_allows_calls() {
        let (cb, _clock) = breaker(3, Duration::from_secs(30));
        assert_eq!(cb.observe_state(), CircuitState::Closed);
        assert!(cb.allow());
    }

    #[test]
    fn opens_after_failure_threshold_consecutive_failures() {
        let (cb, _clock) = breaker(3, Duration::from_secs(30));
        cb.record_failure();
        cb.record_failure();
        assert_eq!(cb.observe_state(), CircuitState::Closed);
        cb.record_failure();
        assert_eq!(cb.observe_state(), CircuitState::Open);
        assert!(!cb.allow());
    }

    #[test]
    fn success_resets_failure_count_and_closes() {
        let (cb, _clock) = breaker(3, Duration::from_secs(30));
        cb.record_failure();
        cb.record_failure();
        cb.record_success();
        assert_eq!(cb.failure_count(), 0);
        assert_eq!(cb.observe_state(), CircuitState::Closed);
        cb.record_failure();
        cb.record_failure();
        assert_eq!(cb.observe_state(), CircuitState::Closed, "count should have reset to 0");
    }

    #[test]
    fn stays_open_until_recovery_timeout_elapses() {
        let (cb, clock) = breaker(1, Duration::from_millis(1000));
        cb.record_failure();
        assert_eq!(cb.observe_state(), CircuitState::Open);

        clock.advance(500);
        assert_eq!(cb.observe_state(), CircuitState::Open, "recoveryTimeout not yet elapsed");

        clock.advance(500);
        assert_eq!(cb.observe_state(), CircuitState::HalfOpen, "recoveryTimeout elapsed");
        assert!(cb.allow());
    }

    #[test]
    fn half_open_failure_reopens_unconditionally() {
        let (cb, clock) = breaker(10, Duration::from_millis(100));
        cb.record_failure();
        clock.advance(100);
        assert_eq!(cb.observe_state(), CircuitState::HalfOpen);

        cb.record_failure();
        assert_eq!(
            cb.observe_state(),
            CircuitState::Open,
            "a single half-open failure reopens regardless of failureThreshold"
        );
    }

    #[test]
    fn half_open_success_closes_and_clears_counter() {
        let (cb, clock) = breaker(3, Duration::from_millis(100));
        cb.record_failure();
        cb.record_failure();
        cb.record_failure();
        clock.advance(100);
        assert_eq!(cb.observe_state(), CircuitState::HalfOpen);

        cb.record_success();
        assert_eq!(cb.observe_state(), CircuitState::Closed);
        assert_eq!(cb.failure_count(), 0);
    }

    #[test]
    fn reset_forces_closed_regardless_of_prior_state() {
        let (cb, _clock) = breaker(1, Duration::from_secs(30));
        cb.record_failure();
        assert_eq!(cb.observe_state(), CircuitState::Open);
        cb.reset();
        assert_eq!(cb.observe_state(), CircuitState::Closed);
        assert_eq!(cb.failure_count(), 0);
    }

    proptest::proptest! {
        #[test]
        fn failure_count_never_exceeds_threshold_before_opening(threshold in 1u32..10, failures in 0u32..20) {
            let (cb, _clock) = breaker(threshold, Duration::from_secs(30));
            for i in 0..failures {
                cb.record_failure();
                let expected_open = i + 1 >= threshold;
                prop_assert_eq!(cb.observe_state() == CircuitState::Open, expected_open);
                if expected_open {
                    break;
                }
            }
        }
    }
}
