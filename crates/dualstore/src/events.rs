use std::time::Instant;

use dualstore_core::ResilienceEvent;

/// Dispatcher-level observations that don't belong to any single sub-pattern
/// (spec.md §6): parallel-path outcomes, single-store fallback reasons, and
/// fail-fast decisions. Per-store breaker transitions and probe results are
/// emitted by `dualstore-circuitbreaker` and `dualstore-healthcheck`
/// respectively.
#[derive(Debug, Clone)]
pub enum DispatchEvent {
    /// The parallel write path finished; `primary_succeeded`/
    /// `secondary_succeeded` report which store(s) accepted the write.
    ParallelOutcome {
        operation: &'static str,
        timestamp: Instant,
        primary_succeeded: bool,
        secondary_succeeded: bool,
    },
    /// One store was skipped (breaker open or failed probe) and the
    /// operation ran against the other store alone.
    SingleStoreFallback {
        operation: &'static str,
        timestamp: Instant,
        surviving_store: &'static str,
        reason: &'static str,
    },
    /// Neither store was reachable; the operation failed fast without
    /// issuing any store call.
    BothUnavailable {
        operation: &'static str,
        timestamp: Instant,
    },
    /// A read fell through from primary to secondary.
    ReadFallback {
        operation: &'static str,
        timestamp: Instant,
        reason: &'static str,
    },
}

impl ResilienceEvent for DispatchEvent {
    fn event_type(&self) -> &'static str {
        match self {
            DispatchEvent::ParallelOutcome { .. } => "ParallelOutcome",
            DispatchEvent::SingleStoreFallback { .. } => "SingleStoreFallback",
            DispatchEvent::BothUnavailable { .. } => "BothUnavailable",
            DispatchEvent::ReadFallback { .. } => "ReadFallback",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            DispatchEvent::ParallelOutcome { timestamp, .. }
            | DispatchEvent::SingleStoreFallback { timestamp, .. }
            | DispatchEvent::BothUnavailable { timestamp, .. }
            | DispatchEvent::ReadFallback { timestamp, .. } => *timestamp,
        }
    }
}
