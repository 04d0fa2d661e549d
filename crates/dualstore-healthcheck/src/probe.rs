use std::future::Future;

/// A cheap liveness check for one store.
///
/// Implementors perform whatever ping/ready-check is appropriate for their
/// backend (e.g. `SELECT 1`, a MongoDB `ping` command). Implementations must
/// never panic; a probe that cannot determine liveness should resolve to
/// `false` rather than propagate an error, matching spec.md §4.4's "probes
/// never throw" contract. [`crate::probe_both`] additionally enforces a hard
/// deadline around the call.
pub trait Probe: Send + Sync {
    fn check(&self) -> impl Future<Output = bool> + Send;
}

// Blanket impl for closures, mirroring the lineage's `HealthChecker<T>`.
impl<F, Fut> Probe for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = bool> + Send,
{
    fn check(&self) -> impl Future<Output = bool> + Send {
        self()
    }
}
