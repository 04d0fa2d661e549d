//! Event system shared by every resilience-pattern crate in this workspace.
//!
//! Each pattern crate defines its own event enum and reuses [`EventListeners`] to
//! broadcast it, so embedding applications can observe breaker transitions, retry
//! attempts and probe results without depending on a particular logging backend.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// Trait implemented by the event enum of each pattern crate.
pub trait ResilienceEvent: Send + Sync + fmt::Debug {
    /// Short machine-readable name of the event variant, e.g. `"StateTransition"`.
    fn event_type(&self) -> &'static str;

    /// When the event occurred.
    fn timestamp(&self) -> Instant;
}

/// Receives events emitted by a pattern instance.
pub trait EventListener<E: ResilienceEvent>: Send + Sync {
    fn on_event(&self, event: &E);
}

type BoxedEventListener<E> = Arc<dyn EventListener<E>>;

/// A broadcast list of [`EventListener`]s for one pattern instance.
#[derive(Clone)]
pub struct EventListeners<E: ResilienceEvent> {
    listeners: Vec<BoxedEventListener<E>>,
}

impl<E: ResilienceEvent> EventListeners<E> {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn add<L>(&mut self, listener: L)
    where
        L: EventListener<E> + 'static,
    {
        self.listeners.push(Arc::new(listener));
    }

    /// Emits an event to every registered listener. A panicking listener is caught so
    /// it cannot prevent its siblings from observing the event.
    pub fn emit(&self, event: &E) {
        for listener in &self.listeners {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                listener.on_event(event);
            }));
            if result.is_err() {
                #[cfg(feature = "tracing")]
                tracing::warn!(event_type = event.event_type(), "event listener panicked");
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl<E: ResilienceEvent> Default for EventListeners<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// A function-backed [`EventListener`], for ad hoc `on_*` builder callbacks.
pub struct FnListener<E, F>
where
    F: Fn(&E) + Send + Sync,
{
    f: F,
    _phantom: std::marker::PhantomData<E>,
}

impl<E, F> FnListener<E, F>
where
    F: Fn(&E) + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self {
            f,
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<E, F> EventListener<E> for FnListener<E, F>
where
    E: ResilienceEvent,
    F: Fn(&E) + Send + Sync,
{
    fn on_event(&self, event: &E) {
        (self.f)(event)
    }
}
