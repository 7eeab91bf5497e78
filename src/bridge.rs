//! Leaving the callback world: blocking and `.await`.
//!
//! Both bridges attach one observer that moves the outcome into a shared
//! slot. The observer carries a drop guard: if the promise is dropped while
//! still pending, its observers are dropped unrun, the guard marks the slot
//! abandoned, and the waiter gets [`ErrorKind::Abandoned`] instead of
//! blocking forever.
//!
//! [`ErrorKind::Abandoned`]: crate::ErrorKind::Abandoned
//!
//! ```
//! use promissory::{Future, Promise};
//!
//! let promise = Promise::new();
//! let future = promise.future();
//! std::thread::spawn(move || promise.succeed("ready"));
//! assert_eq!(future.wait().ok(), Some("ready"));
//! ```

use crate::error::Error;
use crate::future::Future;
use crate::types::Outcome;
use parking_lot::{Condvar, Mutex};
use std::future::{Future as StdFuture, IntoFuture};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};

enum SlotState<T> {
    Waiting(Option<Waker>),
    Ready(Outcome<T>),
    Abandoned,
    Taken,
}

struct Slot<T> {
    state: Mutex<SlotState<T>>,
    ready: Condvar,
}

impl<T> Slot<T> {
    fn set(&self, next: SlotState<T>) {
        let waker = {
            let mut state = self.state.lock();
            match std::mem::replace(&mut *state, next) {
                SlotState::Waiting(waker) => waker,
                _ => None,
            }
        };
        self.ready.notify_all();
        if let Some(waker) = waker {
            waker.wake();
        }
    }

    fn take(state: &mut SlotState<T>) -> Option<crate::Result<T>> {
        match std::mem::replace(state, SlotState::Taken) {
            SlotState::Ready(outcome) => Some(outcome.into_result()),
            SlotState::Abandoned => Some(Err(Error::abandoned())),
            pending => {
                *state = pending;
                None
            }
        }
    }

    fn block(&self) -> crate::Result<T> {
        let mut state = self.state.lock();
        loop {
            if let Some(result) = Self::take(&mut state) {
                return result;
            }
            self.ready.wait(&mut state);
        }
    }
}

/// Fills the slot once; marks it abandoned if dropped unused.
struct Filler<T> {
    slot: Arc<Slot<T>>,
    filled: bool,
}

impl<T> Filler<T> {
    fn fill(mut self, outcome: Outcome<T>) {
        self.filled = true;
        self.slot.set(SlotState::Ready(outcome));
    }
}

impl<T> Drop for Filler<T> {
    fn drop(&mut self) {
        if !self.filled {
            tracing::debug!("promise dropped while a waiter was attached");
            self.slot.set(SlotState::Abandoned);
        }
    }
}

fn attach<T: Clone + Send + 'static>(future: &Future<T>) -> Arc<Slot<T>> {
    let slot = Arc::new(Slot {
        state: Mutex::new(SlotState::Waiting(None)),
        ready: Condvar::new(),
    });
    let filler = Filler {
        slot: Arc::clone(&slot),
        filled: false,
    };
    future.respond(move |outcome| filler.fill(outcome.clone()));
    slot
}

/// Blocks the calling thread until `future` is fulfilled.
///
/// The handle is consumed so that a future nobody else can fulfill reports
/// [`ErrorKind::Abandoned`](crate::ErrorKind::Abandoned).
pub fn wait<T: Clone + Send + 'static>(future: Future<T>) -> crate::Result<T> {
    let slot = attach(&future);
    drop(future);
    slot.block()
}

/// The [`IntoFuture`] form of a [`Future`], resolving to its result.
///
/// ```
/// use promissory::Future;
///
/// let value = futures_lite::future::block_on(async { Future::value(3).await });
/// assert_eq!(value.ok(), Some(3));
/// ```
#[must_use = "futures do nothing unless awaited"]
pub struct Awaiting<T> {
    slot: Arc<Slot<T>>,
}

impl<T> StdFuture for Awaiting<T> {
    type Output = crate::Result<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut state = self.slot.state.lock();
        if let Some(result) = Slot::take(&mut state) {
            return Poll::Ready(result);
        }
        match &mut *state {
            SlotState::Waiting(waker) => {
                if !waker.as_ref().is_some_and(|w| w.will_wake(cx.waker())) {
                    *waker = Some(cx.waker().clone());
                }
            }
            _ => panic!("`Awaiting` polled after completion"),
        }
        Poll::Pending
    }
}

impl<T> std::fmt::Debug for Awaiting<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match &*self.slot.state.lock() {
            SlotState::Waiting(_) => "waiting",
            SlotState::Ready(_) => "ready",
            SlotState::Abandoned => "abandoned",
            SlotState::Taken => "taken",
        };
        f.debug_struct("Awaiting").field("state", &state).finish()
    }
}

impl<T: Clone + Send + 'static> IntoFuture for Future<T> {
    type Output = crate::Result<T>;
    type IntoFuture = Awaiting<T>;

    fn into_future(self) -> Self::IntoFuture {
        Awaiting {
            slot: attach(&self),
        }
    }
}
