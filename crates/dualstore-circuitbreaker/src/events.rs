use dualstore_core::ResilienceEvent;
use std::time::Instant;

use crate::CircuitState;

/// Events emitted by a [`crate::CircuitBreaker`].
#[derive(Debug, Clone)]
pub enum CircuitBreakerEvent {
    /// The breaker moved from one state to another.
    StateTransition {
        store: String,
        timestamp: Instant,
        from: CircuitState,
        to: CircuitState,
        reason: &'static str,
    },
    /// A success was recorded while the breaker was in `state`.
    SuccessRecorded {
        store: String,
        timestamp: Instant,
        state: CircuitState,
    },
    /// A failure was recorded while the breaker was in `state`.
    FailureRecorded {
        store: String,
        timestamp: Instant,
        state: CircuitState,
        failure_count: u32,
    },
}

impl ResilienceEvent for CircuitBreakerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CircuitBreakerEvent::StateTransition { .. } => "StateTransition",
            CircuitBreakerEvent::SuccessRecorded { .. } => "SuccessRecorded",
            CircuitBreakerEvent::FailureRecorded { .. } => "FailureRecorded",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            CircuitBreakerEvent::StateTransition { timestamp, .. }
            | CircuitBreakerEvent::SuccessRecorded { timestamp, .. }
            | CircuitBreakerEvent::FailureRecorded { timestamp, .. } => *timestamp,
        }
    }
}
