use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use dualstore_circuitbreaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
use dualstore_core::{Clock, EventListener, EventListeners, MonotonicClock, RepoError, Task};
use dualstore_healthcheck::{probe_both, Probe, ProbeEvent};
use dualstore_retry::{retry_with_backoff, RetryConfig};
use uuid::Uuid;

use crate::config::DispatcherConfig;
use crate::events::DispatchEvent;
use crate::pool::WorkerPool;
use crate::repository::TaskRepository;

/// Routes `save`/`delete`/`get`/`list` across two store adapters per spec.md
/// §4.5, owning the two circuit breakers and the shared worker pool and
/// holding non-owning references to the adapters.
///
/// `Primary` and `Secondary` must each implement both [`TaskRepository`] (the
/// CRUD port) and [`Probe`] (the liveness check the write policy consults) —
/// concrete adapters satisfy both from the same connection handle.
pub struct DualDispatcher<Primary, Secondary> {
    primary: Primary,
    secondary: Secondary,
    primary_breaker: CircuitBreaker,
    secondary_breaker: CircuitBreaker,
    pool: WorkerPool,
    config: DispatcherConfig,
    primary_retry: RetryConfig<RepoError>,
    secondary_retry: RetryConfig<RepoError>,
    event_listeners: EventListeners<DispatchEvent>,
    probe_listeners: EventListeners<ProbeEvent>,
}

impl<Primary, Secondary> DualDispatcher<Primary, Secondary>
where
    Primary: TaskRepository + Probe,
    Secondary: TaskRepository + Probe,
{
    pub fn new(primary: Primary, secondary: Secondary, config: DispatcherConfig) -> Self {
        Self::with_clock(primary, secondary, config, Arc::new(MonotonicClock::default()))
    }

    /// Constructs a dispatcher whose breakers share an explicit [`Clock`], so
    /// `recoveryTimeout`-dependent behavior (spec.md scenario S5) can be
    /// driven deterministically in tests.
    pub fn with_clock(
        primary: Primary,
        secondary: Secondary,
        config: DispatcherConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let primary_breaker_config = CircuitBreakerConfig::builder()
            .name("primary")
            .failure_threshold(config.failure_threshold)
            .recovery_timeout(config.recovery_timeout)
            .build();
        let secondary_breaker_config = CircuitBreakerConfig::builder()
            .name("secondary")
            .failure_threshold(config.failure_threshold)
            .recovery_timeout(config.recovery_timeout)
            .build();

        let primary_retry: RetryConfig<RepoError> = RetryConfig::builder()
            .name("primary")
            .max_attempts(config.retry_max_attempts)
            .base_delay(config.retry_base_delay)
            .build();
        let secondary_retry: RetryConfig<RepoError> = RetryConfig::builder()
            .name("secondary")
            .max_attempts(config.retry_max_attempts)
            .base_delay(config.retry_base_delay)
            .build();

        Self {
            primary,
            secondary,
            primary_breaker: CircuitBreaker::with_clock(primary_breaker_config, Arc::clone(&clock)),
            secondary_breaker: CircuitBreaker::with_clock(secondary_breaker_config, clock),
            pool: WorkerPool::new(config.worker_pool_size),
            config,
            primary_retry,
            secondary_retry,
            event_listeners: EventListeners::new(),
            probe_listeners: EventListeners::new(),
        }
    }

    /// Registers a listener for dispatcher-level events (parallel outcomes,
    /// fallback reasons, fail-fast decisions).
    pub fn add_event_listener<L>(&mut self, listener: L)
    where
        L: EventListener<DispatchEvent> + 'static,
    {
        self.event_listeners.add(listener);
    }

    /// Registers a listener for per-store probe results.
    pub fn add_probe_listener<L>(&mut self, listener: L)
    where
        L: EventListener<ProbeEvent> + 'static,
    {
        self.probe_listeners.add(listener);
    }

    pub fn primary_breaker_state(&self) -> CircuitState {
        self.primary_breaker.observe_state()
    }

    pub fn secondary_breaker_state(&self) -> CircuitState {
        self.secondary_breaker.observe_state()
    }

    pub fn primary_failure_count(&self) -> u32 {
        self.primary_breaker.failure_count()
    }

    pub fn secondary_failure_count(&self) -> u32 {
        self.secondary_breaker.failure_count()
    }

    /// Idempotent upsert across both stores, per the write policy (spec.md
    /// §4.5.1-4.5.3).
    pub async fn save(&self, task: Task) -> Result<(), RepoError> {
        self.execute_write(
            "save",
            || self.primary.save(task.clone()),
            || self.secondary.save(task.clone()),
        )
        .await
    }

    /// Deletes by id across both stores, per the write policy.
    pub async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.execute_write("delete", || self.primary.delete(id), || self.secondary.delete(id))
            .await
    }

    /// Reads never probe; primary is consulted first, falling through to
    /// secondary on a `null` result or a failure (spec.md §4.5.4). Never
    /// errors — a lookup miss is a legitimate business outcome, not a
    /// failure, so the worst case is `Ok(None)`.
    pub async fn get(&self, id: Uuid) -> Result<Option<Task>, RepoError> {
        if self.primary_breaker.allow() {
            match retry_with_backoff(&self.primary_retry, || self.primary.get(id)).await {
                Ok(Some(task)) => {
                    self.primary_breaker.record_success();
                    return Ok(Some(task));
                }
                Ok(None) => {
                    // A null from primary is not itself a reason to stop; it's
                    // only a reason to stop consulting secondary once we
                    // already know primary is healthy (spec.md §9 rationale).
                    self.primary_breaker.record_success();
                }
                Err(_) => {
                    self.primary_breaker.record_failure();
                }
            }
        } else {
            self.event_listeners.emit(&DispatchEvent::ReadFallback {
                operation: "get",
                timestamp: Instant::now(),
                reason: "primary breaker open",
            });
        }

        if self.secondary_breaker.allow() {
            match retry_with_backoff(&self.secondary_retry, || self.secondary.get(id)).await {
                Ok(value) => {
                    self.secondary_breaker.record_success();
                    return Ok(value);
                }
                Err(_) => {
                    self.secondary_breaker.record_failure();
                }
            }
        }

        Ok(None)
    }

    /// Enumerates all tasks, falling through to secondary on primary
    /// failure. Unlike `get`, an empty-but-successful primary result is
    /// authoritative and a failure on both sides is a real error (spec.md
    /// §4.5.4 "Rationale for asymmetry").
    pub async fn list(&self) -> Result<Vec<Task>, RepoError> {
        let primary_allowed = self.primary_breaker.allow();
        let mut primary_error: Option<RepoError> = None;

        if primary_allowed {
            match retry_with_backoff(&self.primary_retry, || self.primary.list()).await {
                Ok(tasks) => {
                    self.primary_breaker.record_success();
                    return Ok(tasks);
                }
                Err(e) => {
                    self.primary_breaker.record_failure();
                    primary_error = Some(e);
                }
            }
        } else {
            self.event_listeners.emit(&DispatchEvent::ReadFallback {
                operation: "list",
                timestamp: Instant::now(),
                reason: "primary breaker open",
            });
        }

        let secondary_allowed = self.secondary_breaker.allow();
        if secondary_allowed {
            match retry_with_backoff(&self.secondary_retry, || self.secondary.list()).await {
                Ok(tasks) => {
                    self.secondary_breaker.record_success();
                    return Ok(tasks);
                }
                Err(e) => {
                    self.secondary_breaker.record_failure();
                    let primary_err = primary_error.unwrap_or_else(Self::breaker_open_error);
                    return Err(RepoError::BothFailed {
                        primary: Box::new(primary_err),
                        secondary: Box::new(e),
                    });
                }
            }
        }

        if !primary_allowed && !secondary_allowed {
            Err(RepoError::BothUnavailable)
        } else {
            let primary_err = primary_error.unwrap_or_else(Self::breaker_open_error);
            Err(RepoError::BothFailed {
                primary: Box::new(primary_err),
                secondary: Box::new(Self::breaker_open_error()),
            })
        }
    }

    fn breaker_open_error() -> RepoError {
        RepoError::Transient("circuit breaker open, call skipped".to_string())
    }

    async fn execute_write<F1, F2, Fut1, Fut2>(
        &self,
        operation: &'static str,
        primary_call: F1,
        secondary_call: F2,
    ) -> Result<(), RepoError>
    where
        F1: Fn() -> Fut1,
        Fut1: Future<Output = Result<(), RepoError>>,
        F2: Fn() -> Fut2,
        Fut2: Future<Output = Result<(), RepoError>>,
    {
        let primary_allowed = self.primary_breaker.allow();
        let secondary_allowed = self.secondary_breaker.allow();

        match (primary_allowed, secondary_allowed) {
            (false, false) => {
                self.event_listeners.emit(&DispatchEvent::BothUnavailable {
                    operation,
                    timestamp: Instant::now(),
                });
                Err(RepoError::BothUnavailable)
            }
            (true, false) => {
                self.event_listeners.emit(&DispatchEvent::SingleStoreFallback {
                    operation,
                    timestamp: Instant::now(),
                    surviving_store: "primary",
                    reason: "secondary breaker open",
                });
                self.single_store(&self.primary_breaker, &self.primary_retry, primary_call).await
            }
            (false, true) => {
                self.event_listeners.emit(&DispatchEvent::SingleStoreFallback {
                    operation,
                    timestamp: Instant::now(),
                    surviving_store: "secondary",
                    reason: "primary breaker open",
                });
                self.single_store(&self.secondary_breaker, &self.secondary_retry, secondary_call)
                    .await
            }
            (true, true) => {
                let (primary_alive, secondary_alive) = probe_both(
                    &self.primary,
                    &self.secondary,
                    self.config.ping_timeout,
                    &self.probe_listeners,
                )
                .await;

                match (primary_alive, secondary_alive) {
                    (false, false) => {
                        self.primary_breaker.record_failure();
                        self.secondary_breaker.record_failure();
                        self.event_listeners.emit(&DispatchEvent::BothUnavailable {
                            operation,
                            timestamp: Instant::now(),
                        });
                        Err(RepoError::BothUnavailable)
                    }
                    (true, false) => {
                        self.secondary_breaker.record_failure();
                        self.event_listeners.emit(&DispatchEvent::SingleStoreFallback {
                            operation,
                            timestamp: Instant::now(),
                            surviving_store: "primary",
                            reason: "secondary probe failed",
                        });
                        self.single_store(&self.primary_breaker, &self.primary_retry, primary_call)
                            .await
                    }
                    (false, true) => {
                        self.primary_breaker.record_failure();
                        self.event_listeners.emit(&DispatchEvent::SingleStoreFallback {
                            operation,
                            timestamp: Instant::now(),
                            surviving_store: "secondary",
                            reason: "primary probe failed",
                        });
                        self.single_store(
                            &self.secondary_breaker,
                            &self.secondary_retry,
                            secondary_call,
                        )
                        .await
                    }
                    (true, true) => self.parallel(operation, primary_call, secondary_call).await,
                }
            }
        }
    }

    async fn single_store<F, Fut>(
        &self,
        breaker: &CircuitBreaker,
        retry: &RetryConfig<RepoError>,
        call: F,
    ) -> Result<(), RepoError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<(), RepoError>>,
    {
        match retry_with_backoff(retry, call).await {
            Ok(()) => {
                breaker.record_success();
                Ok(())
            }
            Err(e) => {
                breaker.record_failure();
                Err(e)
            }
        }
    }

    /// Runs both store calls concurrently under a single `parallelTimeout`
    /// deadline (spec.md §4.5.2). A store that doesn't finish by the deadline
    /// is treated as having failed with `Timeout`; the in-flight call is
    /// abandoned, not forcibly cancelled, matching adapters that may not
    /// honor cancellation.
    async fn parallel<F1, F2, Fut1, Fut2>(
        &self,
        operation: &'static str,
        primary_call: F1,
        secondary_call: F2,
    ) -> Result<(), RepoError>
    where
        F1: Fn() -> Fut1,
        Fut1: Future<Output = Result<(), RepoError>>,
        F2: Fn() -> Fut2,
        Fut2: Future<Output = Result<(), RepoError>>,
    {
        let deadline = tokio::time::Instant::now() + self.config.parallel_timeout;

        let primary_fut = async {
            let _permit = self.pool.acquire(self.config.parallel_timeout).await?;
            primary_call().await
        };
        let secondary_fut = async {
            let _permit = self.pool.acquire(self.config.parallel_timeout).await?;
            secondary_call().await
        };

        let (primary_result, secondary_result) = tokio::join!(
            tokio::time::timeout_at(deadline, primary_fut),
            tokio::time::timeout_at(deadline, secondary_fut),
        );

        let primary_result = primary_result.unwrap_or_else(|_| Err(RepoError::Timeout));
        let secondary_result = secondary_result.unwrap_or_else(|_| Err(RepoError::Timeout));

        match &primary_result {
            Ok(()) => self.primary_breaker.record_success(),
            Err(_) => self.primary_breaker.record_failure(),
        }
        match &secondary_result {
            Ok(()) => self.secondary_breaker.record_success(),
            Err(_) => self.secondary_breaker.record_failure(),
        }

        self.event_listeners.emit(&DispatchEvent::ParallelOutcome {
            operation,
            timestamp: Instant::now(),
            primary_succeeded: primary_result.is_ok(),
            secondary_succeeded: secondary_result.is_ok(),
        });

        match (primary_result, secondary_result) {
            (Ok(()), Ok(())) => Ok(()),
            // Partial success is accepted: the write is considered durable
            // and cross-store convergence is the reconciler's job.
            (Ok(()), Err(_)) | (Err(_), Ok(())) => Ok(()),
            (Err(p), Err(s)) => Err(RepoError::BothFailed {
                primary: Box::new(p),
                secondary: Box::new(s),
            }),
        }
    }
}

impl<Primary, Secondary> TaskRepository for DualDispatcher<Primary, Secondary>
where
    Primary: TaskRepository + Probe,
    Secondary: TaskRepository + Probe,
{
    fn save(&self, task: Task) -> impl Future<Output = Result<(), RepoError>> + Send {
        DualDispatcher::save(self, task)
    }

    fn get(&self, id: Uuid) -> impl Future<Output = Result<Option<Task>, RepoError>> + Send {
        DualDispatcher::get(self, id)
    }

    fn list(&self) -> impl Future<Output = Result<Vec<Task>, RepoError>> + Send {
        DualDispatcher::list(self)
    }

    fn delete(&self, id: Uuid) -> impl Future<Output = Result<(), RepoError>> + Send {
        DualDispatcher::delete(self, id)
    }
}
