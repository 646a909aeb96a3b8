//! Owner thread configuration.

use std::time::Duration;

use crate::error::Result;
use crate::owner::OwnerThread;

/// Default interval between readiness checks while waiting for the display.
const DEFAULT_CONTEXT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Default upper bound for waiting on the display to come up.
const DEFAULT_STARTUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Default time the loop sleeps waiting for work before re-checking shutdown.
const DEFAULT_IDLE_INTERVAL: Duration = Duration::from_millis(100);

/// Configuration for creating an [`OwnerThread`].
#[derive(Debug, Clone)]
pub struct OwnerThreadConfig {
    /// Name for the owner thread; also used as the display name.
    pub name: String,
    /// Stack size for the owner thread in bytes. `None` uses the default.
    pub stack_size: Option<usize>,
    /// Bound applied to every `invoke` that does not pass its own timeout.
    /// `None` blocks until the owner thread answers.
    pub invoke_timeout: Option<Duration>,
    /// Upper bound for `start()`/`context()` waiting on the display.
    pub startup_timeout: Duration,
    /// Interval between readiness checks in `context()`.
    pub context_poll_interval: Duration,
    /// How long the loop sleeps when there is no native event and no request.
    pub idle_interval: Duration,
}

impl Default for OwnerThreadConfig {
    fn default() -> Self {
        Self {
            name: "horizon-owner".to_string(),
            stack_size: None,
            invoke_timeout: None,
            startup_timeout: DEFAULT_STARTUP_TIMEOUT,
            context_poll_interval: DEFAULT_CONTEXT_POLL_INTERVAL,
            idle_interval: DEFAULT_IDLE_INTERVAL,
        }
    }
}

impl OwnerThreadConfig {
    /// Create a new configuration with the given thread name.
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Builder for creating owner threads with custom configuration.
#[derive(Debug, Default)]
pub struct OwnerThreadBuilder {
    config: OwnerThreadConfig,
}

impl OwnerThreadBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the thread name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// Set the stack size for the owner thread.
    pub fn stack_size(mut self, size: usize) -> Self {
        self.config.stack_size = Some(size);
        self
    }

    /// Bound every invocation by default.
    pub fn invoke_timeout(mut self, timeout: Duration) -> Self {
        self.config.invoke_timeout = Some(timeout);
        self
    }

    /// Set the startup timeout.
    pub fn startup_timeout(mut self, timeout: Duration) -> Self {
        self.config.startup_timeout = timeout;
        self
    }

    /// Set the readiness polling interval.
    pub fn context_poll_interval(mut self, interval: Duration) -> Self {
        self.config.context_poll_interval = interval;
        self
    }

    /// Set the idle sleep interval of the loop.
    pub fn idle_interval(mut self, interval: Duration) -> Self {
        self.config.idle_interval = interval;
        self
    }

    /// The configuration built so far.
    pub fn config(&self) -> &OwnerThreadConfig {
        &self.config
    }

    /// Spawn the owner thread and wait until its display is ready.
    pub fn start(self) -> Result<OwnerThread> {
        OwnerThread::start(self.config)
    }

    /// Spawn the owner thread without waiting for the display.
    pub fn spawn(self) -> Result<OwnerThread> {
        OwnerThread::spawn(self.config)
    }
}
