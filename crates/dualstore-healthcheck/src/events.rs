use std::time::Instant;

use dualstore_core::ResilienceEvent;

/// Events emitted by [`crate::probe_both`].
#[derive(Debug, Clone)]
pub enum ProbeEvent {
    /// A probe completed within its deadline.
    Completed {
        store: String,
        timestamp: Instant,
        alive: bool,
    },
    /// A probe did not complete within `ping_timeout` and was treated as down.
    TimedOut {
        store: String,
        timestamp: Instant,
    },
}

impl ResilienceEvent for ProbeEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ProbeEvent::Completed { .. } => "Completed",
            ProbeEvent::TimedOut { .. } => "TimedOut",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            ProbeEvent::Completed { timestamp, .. } | ProbeEvent::TimedOut { timestamp, .. } => {
                *timestamp
            }
        }
    }
}
