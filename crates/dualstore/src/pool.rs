use std::sync::Arc;
use std::time::Duration;

use dualstore_core::RepoError;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// A bounded, process-wide pool of slots shared by the probe step and the
/// parallel store path (spec.md §4.5.5).
///
/// Sized to at least 4 at construction (two probe slots, two parallel-op
/// slots) and never recreated per call, mirroring the lineage's bulkhead
/// service's `Semaphore::acquire_owned` pattern — but submissions here queue
/// for a slot rather than rejecting outright. Only a submission whose wait
/// for a slot itself breaches the caller's deadline counts as a transient
/// failure for that store (spec.md §4.5.5 "rejection of a submission counts
/// as a transient error").
pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
}

impl WorkerPool {
    pub fn new(size: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(size.max(1))),
        }
    }

    /// Waits for a free slot, bounded by `max_wait`. Exceeding `max_wait`
    /// surfaces as [`RepoError::Transient`] so the caller's retry policy can
    /// treat pool contention like any other transient failure.
    pub async fn acquire(&self, max_wait: Duration) -> Result<OwnedSemaphorePermit, RepoError> {
        match tokio::time::timeout(max_wait, Arc::clone(&self.semaphore).acquire_owned()).await {
            Ok(Ok(permit)) => Ok(permit),
            Ok(Err(_)) => Err(RepoError::Transient("worker pool closed".to_string())),
            Err(_) => Err(RepoError::Transient(
                "timed out waiting for a worker pool slot".to_string(),
            )),
        }
    }
}
