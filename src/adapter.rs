//! Turning callback-style APIs into futures.
//!
//! [`completion`] returns a pending [`Future`] together with a one-shot
//! [`Completion`] to hand to the callback. Because completing consumes the
//! handle, a callback cannot fulfill the future twice. Dropping the
//! `Completion` unused abandons the future.
//!
//! ```
//! use promissory::adapter::completion;
//!
//! fn fetch(id: u32, callback: impl FnOnce(Result<String, std::io::Error>) + Send + 'static) {
//!     std::thread::spawn(move || callback(Ok(format!("item {id}"))));
//! }
//!
//! let (future, done) = completion();
//! fetch(7, done.into_callback());
//! assert_eq!(future.wait().ok().as_deref(), Some("item 7"));
//! ```

use crate::error::Error;
use crate::future::Future;
use crate::promise::Promise;
use crate::types::Outcome;

/// One-shot producer handle for a callback.
#[derive(Debug)]
pub struct Completion<T> {
    promise: Promise<T>,
}

/// Creates a pending future and the handle that completes it.
#[must_use]
pub fn completion<T: Clone + Send + 'static>() -> (Future<T>, Completion<T>) {
    let promise = Promise::new();
    (promise.future(), Completion { promise })
}

/// Like [`completion`], running `on_cancel` whenever the future is cancelled.
///
/// Use it to abort the underlying operation (close a request, stop a job).
#[must_use]
pub fn completion_with_cancel<T, F>(on_cancel: F) -> (Future<T>, Completion<T>)
where
    T: Clone + Send + 'static,
    F: Fn() + Send + Sync + 'static,
{
    let promise = Promise::with_cancel_action(on_cancel);
    (promise.future(), Completion { promise })
}

impl<T: Clone + Send + 'static> Completion<T> {
    /// Completes with a callback's `Result`.
    pub fn complete<E>(self, result: Result<T, E>)
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        match result {
            Ok(value) => self.promise.succeed(value),
            Err(error) => self.promise.fail(Error::producer(error)),
        }
    }

    /// Completes with an outcome that is already in this crate's terms.
    pub fn complete_outcome(self, outcome: Outcome<T>) {
        self.promise.fulfill(outcome);
    }

    /// Completes from the `(value, error)` pair many callback APIs deliver.
    ///
    /// An error wins over a value. If neither is present the future fails
    /// with [`ErrorKind::OptionalMissing`](crate::ErrorKind::OptionalMissing).
    pub fn complete_parts<E>(self, value: Option<T>, error: Option<E>)
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        match (value, error) {
            (_, Some(error)) => self.promise.fail(Error::producer(error)),
            (Some(value), None) => self.promise.succeed(value),
            (None, None) => self.promise.fail(
                Error::optional_missing().with_message("callback delivered neither value nor error"),
            ),
        }
    }

    /// Converts the handle into a plain callback.
    #[must_use]
    pub fn into_callback<E>(self) -> Box<dyn FnOnce(Result<T, E>) + Send + 'static>
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Box::new(move |result| self.complete(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::test_utils::{assert_failed, assert_succeeded, init_test_logging};
    use std::fmt;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[derive(Debug)]
    struct Refused;

    impl fmt::Display for Refused {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("connection refused")
        }
    }

    impl std::error::Error for Refused {}

    #[test]
    fn complete_ok_and_err() {
        init_test_logging();
        let (ok, done) = completion();
        done.complete(Ok::<_, Refused>(1));
        assert_succeeded!(ok, 1);

        let (failed, done) = completion::<i32>();
        done.complete(Err(Refused));
        let err = failed.poll().expect("fulfilled").unwrap_err();
        assert!(err.downcast_ref::<Refused>().is_some());
    }

    #[test]
    fn complete_parts_error_wins() {
        init_test_logging();
        let (future, done) = completion();
        done.complete_parts(Some(3), Some(Refused));
        assert_failed!(future, ErrorKind::Producer);
    }

    #[test]
    fn complete_parts_value_only() {
        init_test_logging();
        let (future, done) = completion();
        done.complete_parts(Some("v"), None::<Refused>);
        assert_succeeded!(future, "v");
    }

    #[test]
    fn complete_parts_neither_is_missing() {
        init_test_logging();
        let (future, done) = completion::<u8>();
        done.complete_parts(None, None::<Refused>);
        assert_failed!(future, ErrorKind::OptionalMissing);
    }

    #[test]
    fn dropped_completion_abandons_future() {
        init_test_logging();
        let (future, done) = completion::<u8>();
        drop(done);
        // The future itself still holds the state; waiting consumes it.
        assert!(future.wait().is_err_and(|e| e.is_abandoned()));
    }

    #[test]
    fn cancel_reaches_operation() {
        init_test_logging();
        let aborted = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&aborted);
        let (future, _done) =
            completion_with_cancel::<(), _>(move || flag.store(true, Ordering::SeqCst));
        future.map(|()| 1).cancel();
        assert!(aborted.load(Ordering::SeqCst));
    }

    #[test]
    fn complete_outcome_passes_through() {
        init_test_logging();
        let (future, done) = completion::<i32>();
        done.complete_outcome(Outcome::Failed(Error::timeout()));
        assert_failed!(future, ErrorKind::TimeoutExpired);
    }
}
