use std::time::Duration;

/// Tunables forwarded to the two breakers, the retry policy, and the probe
/// step (spec.md §3, §6). All fields have defaults drawn straight from the
/// spec's enumerated option list.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    pub ping_timeout: Duration,
    pub parallel_timeout: Duration,
    pub retry_max_attempts: u32,
    pub retry_base_delay: Duration,
    pub failure_threshold: u32,
    pub recovery_timeout: Duration,
    pub worker_pool_size: usize,
}

impl DispatcherConfig {
    pub fn builder() -> DispatcherConfigBuilder {
        DispatcherConfigBuilder::new()
    }

    /// Loads tunables from the environment, falling back to spec defaults for
    /// any variable that is unset or fails to parse (spec.md §6 lists these as
    /// "all optional"; a malformed override is treated the same as an absent
    /// one rather than aborting startup).
    ///
    /// Recognized variables: `CB_FAILURE_THRESHOLD`, `CB_RECOVERY_TIMEOUT_SEC`,
    /// `RETRY_MAX_ATTEMPTS`, `RETRY_BASE_DELAY_SEC`, `PARALLEL_TIMEOUT_SEC`,
    /// `PING_TIMEOUT_SEC`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            failure_threshold: env_u32("CB_FAILURE_THRESHOLD").unwrap_or(defaults.failure_threshold),
            recovery_timeout: env_secs("CB_RECOVERY_TIMEOUT_SEC").unwrap_or(defaults.recovery_timeout),
            retry_max_attempts: env_u32("RETRY_MAX_ATTEMPTS").unwrap_or(defaults.retry_max_attempts),
            retry_base_delay: env_secs("RETRY_BASE_DELAY_SEC").unwrap_or(defaults.retry_base_delay),
            parallel_timeout: env_secs("PARALLEL_TIMEOUT_SEC").unwrap_or(defaults.parallel_timeout),
            ping_timeout: env_secs("PING_TIMEOUT_SEC").unwrap_or(defaults.ping_timeout),
            worker_pool_size: defaults.worker_pool_size,
        }
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            ping_timeout: Duration::from_secs(3),
            parallel_timeout: Duration::from_secs(10),
            retry_max_attempts: 2,
            retry_base_delay: Duration::from_millis(500),
            failure_threshold: 3,
            recovery_timeout: Duration::from_secs(30),
            worker_pool_size: 4,
        }
    }
}

fn env_u32(name: &str) -> Option<u32> {
    std::env::var(name).ok()?.parse().ok()
}

fn env_secs(name: &str) -> Option<Duration> {
    let secs: u64 = std::env::var(name).ok()?.parse().ok()?;
    Some(Duration::from_secs(secs))
}

/// Builder for [`DispatcherConfig`], for callers who want explicit tunables
/// rather than environment-driven ones (e.g. tests).
pub struct DispatcherConfigBuilder {
    config: DispatcherConfig,
}

impl DispatcherConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: DispatcherConfig::default(),
        }
    }

    pub fn ping_timeout(mut self, timeout: Duration) -> Self {
        self.config.ping_timeout = timeout;
        self
    }

    pub fn parallel_timeout(mut self, timeout: Duration) -> Self {
        self.config.parallel_timeout = timeout;
        self
    }

    pub fn retry_max_attempts(mut self, attempts: u32) -> Self {
        self.config.retry_max_attempts = attempts;
        self
    }

    pub fn retry_base_delay(mut self, delay: Duration) -> Self {
        self.config.retry_base_delay = delay;
        self
    }

    pub fn failure_threshold(mut self, threshold: u32) -> Self {
        self.config.failure_threshold = threshold.max(1);
        self
    }

    pub fn recovery_timeout(mut self, timeout: Duration) -> Self {
        self.config.recovery_timeout = timeout;
        self
    }

    /// Size of the shared worker pool. Spec.md §4.5.5 requires at least 4
    /// (two probe slots, two parallel-op slots); smaller values are clamped.
    pub fn worker_pool_size(mut self, size: usize) -> Self {
        self.config.worker_pool_size = size.max(4);
        self
    }

    pub fn build(self) -> DispatcherConfig {
        self.config
    }
}

impl Default for DispatcherConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
