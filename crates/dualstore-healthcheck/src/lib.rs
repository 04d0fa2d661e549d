//! Per-store liveness probes.
//!
//! Health checking here is proactive and cheap: each store gets a single
//! `check()` call bounded by `pingTimeout`, and [`probe_both`] races the two
//! probes concurrently so a slow secondary never delays the primary's result.

mod events;
mod probe;

pub use events::ProbeEvent;
pub use probe::Probe;

use std::time::{Duration, Instant};

use dualstore_core::EventListeners;

/// Runs `primary`'s and `secondary`'s probes concurrently, each bounded by
/// `ping_timeout`. A probe that errors or exceeds the deadline is reported as
/// not alive rather than propagating a failure (spec.md §4.4).
pub async fn probe_both<P, S>(
    primary: &P,
    secondary: &S,
    ping_timeout: Duration,
    listeners: &EventListeners<events::ProbeEvent>,
) -> (bool, bool)
where
    P: Probe,
    S: Probe,
{
    let (primary_alive, secondary_alive) = tokio::join!(
        probe_one("primary", primary, ping_timeout, listeners),
        probe_one("secondary", secondary, ping_timeout, listeners),
    );
    (primary_alive, secondary_alive)
}

async fn probe_one<P: Probe>(
    store: &str,
    probe: &P,
    ping_timeout: Duration,
    listeners: &EventListeners<events::ProbeEvent>,
) -> bool {
    match tokio::time::timeout(ping_timeout, probe.check()).await {
        Ok(alive) => {
            listeners.emit(&ProbeEvent::Completed {
                store: store.to_string(),
                timestamp: Instant::now(),
                alive,
            });

            #[cfg(feature = "tracing")]
            tracing::debug!(store, alive, "probe completed");

            alive
        }
        Err(_) => {
            listeners.emit(&ProbeEvent::TimedOut {
                store: store.to_string(),
                timestamp: Instant::now(),
            });

            #[cfg(feature = "tracing")]
            tracing::warn!(store, "probe timed out, treating as down");

            false
        }
    }
}
