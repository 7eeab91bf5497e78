//! The read side: [`Future`].
//!
//! A future is either *constant* (fulfilled at construction, no observer
//! list, immune to cancellation) or *promise-backed* (sharing the state of a
//! [`Promise`]). Both variants answer the same contract; on a constant every
//! transform runs synchronously on the calling thread.
//!
//! # Transforms
//!
//! | Method | Runs on | Result |
//! |--------|---------|--------|
//! | `map(f)` | success | `f(value)` |
//! | `flat_map(f)` | success | the outcome of the future `f` returns |
//! | `rescue(f)` | failure | the outcome of the future `f` returns |
//! | `by(deadline)` | either | the source outcome, or `TimeoutExpired` |
//!
//! Failures pass through `map` and `flat_map` untouched; successes pass
//! through `rescue` untouched. Every derived future forwards `cancel()` back
//! to its source.
//!
//! # Example
//!
//! ```
//! use promissory::{Future, Promise};
//!
//! let promise = Promise::new();
//! let doubled = promise.future().map(|v: i32| v * 2);
//! promise.succeed(21);
//! assert_eq!(doubled.wait().ok(), Some(42));
//! ```

use crate::context::InvocationContext;
use crate::error::Error;
use crate::promise::{CancelHook, Promise};
use crate::time::Timer;
use crate::types::Outcome;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

enum Repr<T> {
    Constant(Arc<Outcome<T>>),
    Promised(Promise<T>),
}

impl<T> Clone for Repr<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Constant(outcome) => Self::Constant(Arc::clone(outcome)),
            Self::Promised(promise) => Self::Promised(promise.clone()),
        }
    }
}

/// Consumer handle to a value that becomes available later.
///
/// Cheap to clone; all clones observe the same outcome.
pub struct Future<T> {
    repr: Repr<T>,
}

impl<T> Clone for Future<T> {
    fn clone(&self) -> Self {
        Self {
            repr: self.repr.clone(),
        }
    }
}

impl<T: Clone + Send + 'static> Future<T> {
    pub(crate) const fn from_promise(promise: Promise<T>) -> Self {
        Self {
            repr: Repr::Promised(promise),
        }
    }

    // =========================================================================
    // Construction
    // =========================================================================

    /// Creates a future that already holds `outcome`.
    #[must_use]
    pub fn from_outcome(outcome: Outcome<T>) -> Self {
        Self {
            repr: Repr::Constant(Arc::new(outcome)),
        }
    }

    /// Creates a future that already succeeded with `value`.
    #[must_use]
    pub fn value(value: T) -> Self {
        Self::from_outcome(Outcome::Succeeded(value))
    }

    /// Creates a future that already failed with `error`.
    #[must_use]
    pub fn error(error: Error) -> Self {
        Self::from_outcome(Outcome::Failed(error))
    }

    /// Creates a future from a finished computation.
    #[must_use]
    pub fn from_result(result: crate::Result<T>) -> Self {
        Self::from_outcome(result.into())
    }

    /// Succeeds with the value if present, otherwise fails with `on_missing`.
    #[must_use]
    pub fn from_option(value: Option<T>, on_missing: Error) -> Self {
        value.map_or_else(|| Self::error(on_missing), Self::value)
    }

    /// Succeeds with the value if present, otherwise fails with
    /// [`ErrorKind::OptionalMissing`](crate::ErrorKind::OptionalMissing).
    #[must_use]
    pub fn from_option_or_missing(value: Option<T>) -> Self {
        Self::from_option(value, Error::optional_missing())
    }

    /// Runs `f` now and captures its result.
    ///
    /// ```
    /// use promissory::{Error, Future};
    ///
    /// let parsed = Future::from_fallible(|| "12".parse::<u8>().map_err(Error::producer));
    /// assert_eq!(parsed.poll().and_then(|o| o.value().copied()), Some(12));
    /// ```
    #[must_use]
    pub fn from_fallible<F>(f: F) -> Self
    where
        F: FnOnce() -> crate::Result<T>,
    {
        Self::from_result(f())
    }

    /// Succeeds with `value` once `delay` has elapsed on the global timer.
    #[must_use]
    pub fn after(delay: Duration, value: T) -> Self {
        Self::after_on(Timer::global(), delay, value)
    }

    /// Succeeds with `value` once `delay` has elapsed on `timer`.
    #[must_use]
    pub fn after_on(timer: &Timer, delay: Duration, value: T) -> Self {
        let promise = Promise::new();
        let producer = promise.clone();
        timer.schedule_after(delay, move || producer.succeed(value));
        promise.future()
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// Returns the outcome if the future is fulfilled, without blocking.
    #[must_use]
    pub fn poll(&self) -> Option<Outcome<T>> {
        match &self.repr {
            Repr::Constant(outcome) => Some(Outcome::clone(outcome)),
            Repr::Promised(promise) => promise.poll(),
        }
    }

    /// Returns true until the future is fulfilled.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        match &self.repr {
            Repr::Constant(_) => false,
            Repr::Promised(promise) => promise.is_pending(),
        }
    }

    // =========================================================================
    // Side Effects
    // =========================================================================

    /// Runs `f` with the outcome once it is known.
    ///
    /// Runs immediately on the calling thread if the future is fulfilled,
    /// otherwise on the thread that fulfills it.
    pub fn respond<F>(&self, f: F) -> &Self
    where
        F: FnOnce(&Outcome<T>) + Send + 'static,
    {
        match &self.repr {
            Repr::Constant(outcome) => f(&**outcome),
            Repr::Promised(promise) => promise.respond(f),
        }
        self
    }

    /// Runs `f` with the value if the future succeeds.
    pub fn on_success<F>(&self, f: F) -> &Self
    where
        F: FnOnce(T) + Send + 'static,
    {
        self.respond(move |outcome| {
            if let Outcome::Succeeded(value) = outcome {
                f(value.clone());
            }
        })
    }

    /// Runs `f` with the error if the future fails.
    pub fn on_error<F>(&self, f: F) -> &Self
    where
        F: FnOnce(Error) + Send + 'static,
    {
        self.respond(move |outcome| {
            if let Outcome::Failed(error) = outcome {
                f(error.clone());
            }
        })
    }

    /// Like [`on_success`](Self::on_success), but runs `f` through `ctx`.
    pub fn on_success_in<F>(&self, ctx: &InvocationContext, f: F) -> &Self
    where
        F: FnOnce(T) + Send + 'static,
    {
        let ctx = ctx.clone();
        self.on_success(move |value| ctx.execute(move || f(value)))
    }

    /// Like [`on_error`](Self::on_error), but runs `f` through `ctx`.
    pub fn on_error_in<F>(&self, ctx: &InvocationContext, f: F) -> &Self
    where
        F: FnOnce(Error) + Send + 'static,
    {
        let ctx = ctx.clone();
        self.on_error(move |error| ctx.execute(move || f(error)))
    }

    // =========================================================================
    // Transforms
    // =========================================================================

    /// Transforms the value; failures pass through.
    #[must_use]
    pub fn map<U, F>(&self, f: F) -> Future<U>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        match &self.repr {
            Repr::Constant(outcome) => Future::from_outcome(Outcome::clone(outcome).map(f)),
            Repr::Promised(promise) => promise.map(f),
        }
    }

    /// Chains a dependent asynchronous step; failures pass through.
    ///
    /// The returned future adopts the outcome of the future `f` produces,
    /// and cancelling it reaches that inner future too.
    #[must_use]
    pub fn flat_map<U, F>(&self, f: F) -> Future<U>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> Future<U> + Send + 'static,
    {
        match &self.repr {
            Repr::Constant(outcome) => match &**outcome {
                Outcome::Succeeded(value) => f(value.clone()),
                Outcome::Failed(error) => Future::error(error.clone()),
            },
            Repr::Promised(promise) => promise.flat_map(f),
        }
    }

    /// Recovers from a failure with another future; successes pass through.
    #[must_use]
    pub fn rescue<F>(&self, f: F) -> Self
    where
        F: FnOnce(Error) -> Self + Send + 'static,
    {
        match &self.repr {
            Repr::Constant(outcome) => match &**outcome {
                Outcome::Succeeded(_) => self.clone(),
                Outcome::Failed(error) => f(error.clone()),
            },
            Repr::Promised(promise) => promise.rescue(f),
        }
    }

    /// Fails with [`ErrorKind::TimeoutExpired`](crate::ErrorKind::TimeoutExpired)
    /// unless the source completes before `deadline`.
    #[must_use]
    pub fn by(&self, deadline: Instant) -> Self {
        self.by_or(deadline, Error::timeout())
    }

    /// Like [`by`](Self::by), failing with `error` when the deadline wins.
    #[must_use]
    pub fn by_or(&self, deadline: Instant, error: Error) -> Self {
        self.by_with(Timer::global(), deadline, error)
    }

    /// Like [`by_or`](Self::by_or), scheduling the deadline on `timer`.
    #[must_use]
    pub fn by_with(&self, timer: &Timer, deadline: Instant, error: Error) -> Self {
        match &self.repr {
            Repr::Constant(_) => self.clone(),
            Repr::Promised(promise) => promise.by(timer, deadline, error),
        }
    }

    /// Shorthand for `by(Instant::now() + timeout)`.
    #[must_use]
    pub fn within(&self, timeout: Duration) -> Self {
        self.by(Instant::now() + timeout)
    }

    // =========================================================================
    // Cancellation
    // =========================================================================

    /// Tells the producer the result is no longer wanted.
    ///
    /// Advisory: the future stays pending until the producer fulfills it.
    /// Has no effect on constant futures.
    pub fn cancel(&self) {
        if let Repr::Promised(promise) = &self.repr {
            promise.cancel();
        }
    }

    /// Returns a hook that cancels this future without keeping it alive.
    pub(crate) fn canceller(&self) -> CancelHook {
        match &self.repr {
            Repr::Constant(_) => Arc::new(|| {}),
            Repr::Promised(promise) => promise.canceller(),
        }
    }

    // =========================================================================
    // Blocking
    // =========================================================================

    /// Blocks the calling thread until the future is fulfilled.
    ///
    /// Returns [`ErrorKind::Abandoned`](crate::ErrorKind::Abandoned) if every
    /// handle to the pending promise is dropped first.
    pub fn wait(self) -> crate::Result<T> {
        crate::bridge::wait(self)
    }
}

impl<T: Clone + Send + 'static> From<Promise<T>> for Future<T> {
    fn from(promise: Promise<T>) -> Self {
        Self::from_promise(promise)
    }
}

impl<T: Clone + Send + 'static> From<Outcome<T>> for Future<T> {
    fn from(outcome: Outcome<T>) -> Self {
        Self::from_outcome(outcome)
    }
}

impl<T: fmt::Debug> fmt::Debug for Future<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.repr {
            Repr::Constant(outcome) => f.debug_tuple("Future").field(&**outcome).finish(),
            Repr::Promised(promise) => f.debug_tuple("Future").field(promise).finish(),
        }
    }
}
