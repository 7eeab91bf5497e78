//! Test utilities.
//!
//! - Consistent tracing-based logging initialization
//! - Outcome assertion macros for futures

use std::sync::Once;

static INIT_LOGGING: Once = Once::new();

/// Initialize test logging with trace-level output.
///
/// Safe to call multiple times; only initializes once.
pub fn init_test_logging() {
    INIT_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_test_writer()
            .with_thread_names(true)
            .with_target(true)
            .with_ansi(false)
            .try_init();
    });
}

/// Assert that a future has already succeeded with a specific value.
macro_rules! assert_succeeded {
    ($future:expr, $expected:expr) => {
        match $future.poll() {
            Some($crate::types::Outcome::Succeeded(v)) => assert_eq!(v, $expected),
            other => panic!("expected Succeeded({:?}), got {:?}", $expected, other),
        }
    };
}

/// Assert that a future has already failed with a specific error kind.
macro_rules! assert_failed {
    ($future:expr, $kind:expr) => {
        match $future.poll() {
            Some($crate::types::Outcome::Failed(e)) => assert_eq!(e.kind(), $kind),
            other => panic!("expected Failed({:?}), got {:?}", $kind, other),
        }
    };
}

pub(crate) use assert_failed;
pub(crate) use assert_succeeded;
