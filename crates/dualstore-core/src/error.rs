//! The error taxonomy every store adapter maps its driver errors into, and the
//! dispatcher propagates or aggregates.

use thiserror::Error;

/// Errors a [`crate::task::Task`] repository call can fail with.
///
/// A lookup miss (`get` returning `Ok(None)`) is never represented here — it is a
/// legitimate business outcome, not a failure.
#[derive(Debug, Error, Clone)]
pub enum RepoError {
    /// Connectivity loss, I/O timeout, OS-level I/O error, or a driver-classified
    /// transient connectivity/server-selection error. Eligible for retry.
    #[error("transient store error: {0}")]
    Transient(String),

    /// A deadline governed by the dispatcher (not the adapter) elapsed — the parallel
    /// write path's combined deadline, or a worker-pool permit acquisition that itself
    /// timed out. Treated as a failure on the affected store for breaker purposes, but
    /// is never retried by the single-store retry policy (it is not a per-call
    /// classification).
    #[error("operation timed out")]
    Timeout,

    /// Invalid argument, serialization bug, or other precondition violation. Never
    /// retried; propagated to the caller as-is.
    #[error("invalid operation: {0}")]
    Logic(String),

    /// Neither store was reachable: both breakers were open, or both probes failed.
    /// Returned only from writes and from `list`.
    #[error("neither store is available")]
    BothUnavailable,

    /// Both stores were attempted and both failed. Returned only from writes and from
    /// `list`; carries both underlying causes.
    #[error("both stores failed: primary: {primary}, secondary: {secondary}")]
    BothFailed {
        primary: Box<RepoError>,
        secondary: Box<RepoError>,
    },
}

impl RepoError {
    /// `true` for the error classes spec.md §4.3 designates retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RepoError::Transient(_))
    }

    pub fn is_both_unavailable(&self) -> bool {
        matches!(self, RepoError::BothUnavailable)
    }

    pub fn is_both_failed(&self) -> bool {
        matches!(self, RepoError::BothFailed { .. })
    }
}
