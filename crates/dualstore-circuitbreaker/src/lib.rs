//! Per-store consecutive-failure circuit breaker.
//!
//! Each store (primary/secondary) gets its own [`CircuitBreaker`], tracked
//! independently so a failing secondary never blocks reads/writes against a
//! healthy primary and vice versa.

mod circuit;
mod config;
mod events;

pub use circuit::{CircuitBreaker, CircuitState};
pub use config::{CircuitBreakerConfig, CircuitBreakerConfigBuilder};
pub use events::CircuitBreakerEvent;
