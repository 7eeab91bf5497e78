//! Unanimity combinators: `all` and `none`.
//!
//! Both only ever *succeed*. `all` succeeds once every input has succeeded;
//! `none` succeeds once every input has failed. A single dissenting input
//! leaves the result pending forever, so pair these with `by` when a
//! definite answer is needed. An empty input succeeds at once.

use super::{cancellers, forwarding_promise};
use crate::future::Future;
use parking_lot::Mutex;
use std::sync::Arc;

struct Tally {
    remaining: usize,
    broken: bool,
}

fn unanimous<T, I>(futures: I, want_success: bool) -> Future<()>
where
    T: Clone + Send + 'static,
    I: IntoIterator<Item = Future<T>>,
{
    let futures: Vec<Future<T>> = futures.into_iter().collect();
    if futures.is_empty() {
        return Future::value(());
    }

    let promise = forwarding_promise(cancellers(&futures));
    let tally = Arc::new(Mutex::new(Tally {
        remaining: futures.len(),
        broken: false,
    }));

    for future in &futures {
        let tally = Arc::clone(&tally);
        let result = promise.clone();
        future.respond(move |outcome| {
            let done = {
                let mut tally = tally.lock();
                if tally.broken {
                    return;
                }
                if outcome.is_success() == want_success {
                    tally.remaining -= 1;
                    tally.remaining == 0
                } else {
                    tracing::trace!(want_success, "unanimity broken");
                    tally.broken = true;
                    false
                }
            };
            if done {
                result.succeed(());
            }
        });
    }
    promise.future()
}

/// Succeeds once every input has succeeded. Never fails on its own.
#[must_use]
pub fn all<T, I>(futures: I) -> Future<()>
where
    T: Clone + Send + 'static,
    I: IntoIterator<Item = Future<T>>,
{
    unanimous(futures, true)
}

/// Succeeds once every input has failed. Never fails on its own.
#[must_use]
pub fn none<T, I>(futures: I) -> Future<()>
where
    T: Clone + Send + 'static,
    I: IntoIterator<Item = Future<T>>,
{
    unanimous(futures, false)
}
