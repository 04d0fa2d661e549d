//! Shared domain model, error taxonomy and event plumbing for the dual-store task
//! repository core.
//!
//! This crate has no knowledge of circuit breakers, retries, or the dispatcher itself
//! — it exists so those crates, and any concrete store adapter, can agree on a single
//! `Task`/`TaskState`/`RepoError` vocabulary without depending on each other.

pub mod clock;
pub mod error;
pub mod events;
pub mod task;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use error::RepoError;
pub use events::{EventListener, EventListeners, FnListener, ResilienceEvent};
pub use task::{Task, TaskState, TaskValidationError};
