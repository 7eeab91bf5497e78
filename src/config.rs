//! Configuration for the worker threads this crate owns.
//!
//! Only two components start threads: the [`Timer`](crate::time::Timer) that
//! fires deadlines and delayed values, and each
//! [`SerialQueue`](crate::context::SerialQueue). Both take a small config
//! struct with builder-style setters.
//!
//! # Defaults
//!
//! | Field | Default |
//! |-------|---------|
//! | `TimerConfig::thread_name` | `"promissory-timer"` |
//! | `TimerConfig::stack_size` | platform default |
//! | `TimerConfig::idle_timeout` | 10s |
//! | `QueueConfig::label` | `"promissory-queue"` |
//! | `QueueConfig::stack_size` | platform default |

use std::time::Duration;

/// Default name of the timer thread.
pub const DEFAULT_TIMER_THREAD_NAME: &str = "promissory-timer";

/// Default time an idle timer dispatch thread waits before exiting.
pub const DEFAULT_DISPATCH_IDLE_TIMEOUT: Duration = Duration::from_secs(10);

/// Default label of a serial queue created without one.
pub const DEFAULT_QUEUE_LABEL: &str = "promissory-queue";

/// Configuration for a [`Timer`](crate::time::Timer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerConfig {
    /// Name given to the timer thread.
    pub thread_name: String,
    /// Stack size for the timer and dispatch threads, or the platform
    /// default.
    pub stack_size: Option<usize>,
    /// How long a dispatch thread stays idle before it exits.
    pub idle_timeout: Duration,
}

impl TimerConfig {
    /// Creates a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            thread_name: DEFAULT_TIMER_THREAD_NAME.to_string(),
            stack_size: None,
            idle_timeout: DEFAULT_DISPATCH_IDLE_TIMEOUT,
        }
    }

    /// Sets the timer thread name.
    #[must_use]
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Sets the timer and dispatch thread stack size.
    #[must_use]
    pub const fn stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }

    /// Sets how long an idle dispatch thread lingers.
    #[must_use]
    pub const fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration for a [`SerialQueue`](crate::context::SerialQueue).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueConfig {
    /// Queue label; also used as the worker thread name.
    pub label: String,
    /// Stack size for the worker thread, or the platform default.
    pub stack_size: Option<usize>,
}

impl QueueConfig {
    /// Creates a configuration with the given label.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            stack_size: None,
        }
    }

    /// Sets the worker thread stack size.
    #[must_use]
    pub const fn stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_LABEL)
    }
}
