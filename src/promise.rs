//! The write side of a future.
//!
//! A [`Promise`] owns the state machine:
//!
//! ```text
//! Pending(observers) --succeed/fail--> Fulfilled(outcome)
//! ```
//!
//! There are no other transitions. Fulfilling twice is a broken producer
//! contract: [`Promise::succeed`] and [`Promise::fail`] panic, while the
//! `try_*` variants report [`PromiseError::AlreadyFulfilled`] so that internal
//! races (a deadline against its source) can drop the loser quietly.
//!
//! # Observers
//!
//! Observers registered while pending run exactly once, in registration
//! order, on the fulfilling thread. Observers registered afterwards run
//! immediately on the registering thread. No observer ever runs while the
//! state lock is held, so an observer may freely register further observers
//! or fulfill other promises.
//!
//! A panicking observer does not starve the rest: every queued observer
//! runs, and the first panic is resumed once all of them have.
//!
//! # Cancellation
//!
//! `cancel()` is orthogonal to the state machine: it never changes the
//! state. It fires up to three hooks, in order:
//!
//! 1. the parent hook, forwarding toward the promise this one was derived from
//! 2. the producer's own cancel action
//! 3. the proxy hook, reaching the inner future a `flat_map`/`rescue` adopted
//!
//! Parent and proxy hooks hold their targets weakly. A derived promise never
//! keeps its source alive.

use crate::error::{Error, PromiseError};
use crate::future::Future;
use crate::time::Timer;
use crate::types::Outcome;
use parking_lot::Mutex;
use std::fmt;
use std::panic::{catch_unwind, resume_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

/// A callback run with the outcome of a future.
pub(crate) type Observer<T> = Box<dyn FnOnce(&Outcome<T>) + Send + 'static>;

/// A shareable cancellation signal.
pub(crate) type CancelHook = Arc<dyn Fn() + Send + Sync + 'static>;

enum State<T> {
    Pending(Vec<Observer<T>>),
    Fulfilled(Outcome<T>),
}

#[derive(Default)]
struct CancelHooks {
    parent: Option<CancelHook>,
    action: Option<CancelHook>,
    proxy: Option<CancelHook>,
}

struct Inner<T> {
    state: Mutex<State<T>>,
    hooks: Mutex<CancelHooks>,
}

/// Producer handle that fulfills a [`Future`] exactly once.
///
/// Cloning a promise yields another handle to the same state.
pub struct Promise<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Promise<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone + Send + 'static> Promise<T> {
    fn from_state(state: State<T>, hooks: CancelHooks) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(state),
                hooks: Mutex::new(hooks),
            }),
        }
    }

    /// Creates a pending promise.
    #[must_use]
    pub fn new() -> Self {
        Self::from_state(State::Pending(Vec::new()), CancelHooks::default())
    }

    /// Creates a pending promise whose producer reacts to `cancel()`.
    ///
    /// The action is fixed at construction so it can never race with
    /// consumers; it runs on every `cancel()` call.
    #[must_use]
    pub fn with_cancel_action<F>(action: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self::from_state(
            State::Pending(Vec::new()),
            CancelHooks {
                action: Some(Arc::new(action)),
                ..CancelHooks::default()
            },
        )
    }

    /// Creates a promise that already succeeded with `value`.
    #[must_use]
    pub fn succeeded(value: T) -> Self {
        Self::from_state(
            State::Fulfilled(Outcome::Succeeded(value)),
            CancelHooks::default(),
        )
    }

    /// Creates a promise that already failed with `error`.
    #[must_use]
    pub fn failed(error: Error) -> Self {
        Self::from_state(
            State::Fulfilled(Outcome::Failed(error)),
            CancelHooks::default(),
        )
    }

    /// Returns the read handle for this promise.
    #[must_use]
    pub fn future(&self) -> Future<T> {
        Future::from_promise(self.clone())
    }

    /// Returns true until the promise is fulfilled.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(*self.inner.state.lock(), State::Pending(_))
    }

    /// Returns the outcome if the promise has been fulfilled.
    #[must_use]
    pub fn poll(&self) -> Option<Outcome<T>> {
        match &*self.inner.state.lock() {
            State::Pending(_) => None,
            State::Fulfilled(outcome) => Some(outcome.clone()),
        }
    }

    /// Fulfills the promise with a value.
    ///
    /// # Panics
    ///
    /// Panics if the promise was already fulfilled.
    #[track_caller]
    pub fn succeed(&self, value: T) {
        self.fulfill(Outcome::Succeeded(value));
    }

    /// Fulfills the promise with an error.
    ///
    /// # Panics
    ///
    /// Panics if the promise was already fulfilled.
    #[track_caller]
    pub fn fail(&self, error: Error) {
        self.fulfill(Outcome::Failed(error));
    }

    /// Fulfills the promise with an outcome.
    ///
    /// # Panics
    ///
    /// Panics if the promise was already fulfilled.
    #[track_caller]
    pub fn fulfill(&self, outcome: Outcome<T>) {
        if let Err(err) = self.try_fulfill(outcome) {
            panic!("{err}: a promise must be fulfilled at most once");
        }
    }

    /// Fulfills the promise with a value unless it is already fulfilled.
    pub fn try_succeed(&self, value: T) -> Result<(), PromiseError> {
        self.try_fulfill(Outcome::Succeeded(value))
    }

    /// Fulfills the promise with an error unless it is already fulfilled.
    pub fn try_fail(&self, error: Error) -> Result<(), PromiseError> {
        self.try_fulfill(Outcome::Failed(error))
    }

    /// Fulfills the promise unless it is already fulfilled.
    ///
    /// On success every queued observer has run by the time this returns.
    ///
    /// # Panics
    ///
    /// Resumes the first observer panic, after every observer has run.
    pub fn try_fulfill(&self, outcome: Outcome<T>) -> Result<(), PromiseError> {
        let observers = {
            let mut state = self.inner.state.lock();
            match &mut *state {
                State::Fulfilled(_) => return Err(PromiseError::AlreadyFulfilled),
                State::Pending(observers) => {
                    let observers = std::mem::take(observers);
                    *state = State::Fulfilled(outcome.clone());
                    observers
                }
            }
        };

        tracing::trace!(
            success = outcome.is_success(),
            observers = observers.len(),
            "promise fulfilled"
        );
        let mut first_panic = None;
        for observer in observers {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| observer(&outcome))) {
                tracing::error!("promise observer panicked");
                first_panic.get_or_insert(payload);
            }
        }
        if let Some(payload) = first_panic {
            resume_unwind(payload);
        }
        Ok(())
    }

    /// Registers `f` to run with the outcome.
    ///
    /// Runs `f` immediately if the promise is already fulfilled.
    pub fn respond<F>(&self, f: F)
    where
        F: FnOnce(&Outcome<T>) + Send + 'static,
    {
        let ready = {
            let mut state = self.inner.state.lock();
            match &mut *state {
                State::Pending(observers) => {
                    observers.push(Box::new(f));
                    return;
                }
                State::Fulfilled(outcome) => outcome.clone(),
            }
        };
        f(&ready);
    }

    /// Signals that the result is no longer wanted.
    ///
    /// Advisory only: the state is untouched and the producer decides what,
    /// if anything, to stop.
    pub fn cancel(&self) {
        let (parent, action, proxy) = {
            let hooks = self.inner.hooks.lock();
            (
                hooks.parent.clone(),
                hooks.action.clone(),
                hooks.proxy.clone(),
            )
        };
        tracing::debug!(
            has_parent = parent.is_some(),
            has_action = action.is_some(),
            has_proxy = proxy.is_some(),
            "cancel requested"
        );
        for hook in [parent, action, proxy].into_iter().flatten() {
            hook();
        }
    }

    /// Returns a hook that cancels this promise without keeping it alive.
    pub(crate) fn canceller(&self) -> CancelHook {
        let weak = Arc::downgrade(&self.inner);
        Arc::new(move || {
            if let Some(inner) = weak.upgrade() {
                Promise { inner }.cancel();
            }
        })
    }

    /// Creates a pending promise whose `cancel()` is forwarded to `self`.
    fn child<U: Clone + Send + 'static>(&self) -> Promise<U> {
        Promise::from_state(
            State::Pending(Vec::new()),
            CancelHooks {
                parent: Some(self.canceller()),
                ..CancelHooks::default()
            },
        )
    }

    /// Adopts the outcome of `inner`, forwarding cancellation into it.
    fn proxy_via(&self, inner: &Future<T>) {
        self.inner.hooks.lock().proxy = Some(inner.canceller());
        let target = self.clone();
        inner.respond(move |outcome| target.fulfill(outcome.clone()));
    }

    pub(crate) fn map<U, F>(&self, f: F) -> Future<U>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        let child = self.child::<U>();
        let target = child.clone();
        self.respond(move |outcome| target.fulfill(outcome.clone().map(f)));
        child.future()
    }

    pub(crate) fn flat_map<U, F>(&self, f: F) -> Future<U>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> Future<U> + Send + 'static,
    {
        let child = self.child::<U>();
        let target = child.clone();
        self.respond(move |outcome| match outcome {
            Outcome::Succeeded(value) => target.proxy_via(&f(value.clone())),
            Outcome::Failed(error) => target.fail(error.clone()),
        });
        child.future()
    }

    pub(crate) fn rescue<F>(&self, f: F) -> Future<T>
    where
        F: FnOnce(Error) -> Future<T> + Send + 'static,
    {
        let child = self.child::<T>();
        let target = child.clone();
        self.respond(move |outcome| match outcome {
            Outcome::Succeeded(value) => target.succeed(value.clone()),
            Outcome::Failed(error) => target.proxy_via(&f(error.clone())),
        });
        child.future()
    }

    pub(crate) fn by(&self, timer: &Timer, deadline: Instant, error: Error) -> Future<T> {
        let child = self.child::<T>();

        let expiring = child.clone();
        let scheduled = timer.schedule_at(deadline, move || {
            if expiring.try_fail(error).is_ok() {
                tracing::debug!("deadline elapsed before the source completed");
            }
        });

        let target = child.clone();
        self.respond(move |outcome| {
            if target.try_fulfill(outcome.clone()).is_ok() {
                scheduled.cancel();
            }
        });
        child.future()
    }
}

impl<T: Clone + Send + 'static> Default for Promise<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Promise<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &*self.inner.state.lock() {
            State::Pending(observers) => format!("pending ({} observers)", observers.len()),
            State::Fulfilled(Outcome::Succeeded(_)) => "succeeded".to_string(),
            State::Fulfilled(Outcome::Failed(e)) => format!("failed: {e}"),
        };
        f.debug_struct("Promise").field("state", &state).finish()
    }
}
