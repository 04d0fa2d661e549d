//! Resilience-oriented dual-store dispatcher for a task-management service
//! migrating between a relational store and a document store with zero
//! downtime.
//!
//! [`DualDispatcher`] composes two adapters implementing [`TaskRepository`],
//! keeping them synchronized on writes via a circuit-breaker-gated,
//! probe-informed write policy, and serving reads from the primary store with
//! transparent fallback to the secondary.

mod config;
mod dispatcher;
mod events;
mod pool;
mod repository;
mod selection;

pub use config::{DispatcherConfig, DispatcherConfigBuilder};
pub use dispatcher::DualDispatcher;
pub use events::DispatchEvent;
pub use repository::TaskRepository;
pub use selection::{RepositorySelection, UnknownSelection};

pub use dualstore_core::{RepoError, Task, TaskState, TaskValidationError};
