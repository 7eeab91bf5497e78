//! First-success combinator.
//!
//! # Semantics
//!
//! ```text
//! first([f1, ..., fn]):
//!   on fi succeeds with v: if undecided → Succeeded(v)
//!   on fi fails with e:    last ← e; if every input failed → Failed(last)
//! ```
//!
//! When every input fails, the reported error is the one observed *last*,
//! not the first: later failures overwrite earlier ones. Callers that need
//! every failure should use `collect` over `rescue`d inputs instead.

use super::{cancellers, forwarding_promise};
use crate::error::Error;
use crate::future::Future;
use crate::types::Outcome;
use parking_lot::Mutex;
use std::sync::Arc;

struct Race {
    failures_left: usize,
    last_error: Option<Error>,
    decided: bool,
}

/// Yields the first value to arrive, ignoring failures while any input may
/// still succeed.
///
/// Fails with [`ErrorKind::EmptyInput`](crate::ErrorKind::EmptyInput) when
/// given no futures: with nothing to race there is no last failure to
/// report, and an empty `first` is resolved at once rather than left pending
/// forever.
#[must_use]
pub fn first<T, I>(futures: I) -> Future<T>
where
    T: Clone + Send + 'static,
    I: IntoIterator<Item = Future<T>>,
{
    let futures: Vec<Future<T>> = futures.into_iter().collect();
    if futures.is_empty() {
        return Future::error(Error::empty_input().with_message("first() needs at least one future"));
    }

    let promise = forwarding_promise(cancellers(&futures));
    let race = Arc::new(Mutex::new(Race {
        failures_left: futures.len(),
        last_error: None,
        decided: false,
    }));

    for future in &futures {
        let race = Arc::clone(&race);
        let result = promise.clone();
        future.respond(move |outcome| {
            let decision = {
                let mut race = race.lock();
                if race.decided {
                    return;
                }
                match outcome {
                    Outcome::Succeeded(value) => {
                        race.decided = true;
                        Some(Outcome::Succeeded(value.clone()))
                    }
                    Outcome::Failed(error) => {
                        race.last_error = Some(error.clone());
                        race.failures_left -= 1;
                        if race.failures_left == 0 {
                            race.decided = true;
                            race.last_error.take().map(Outcome::Failed)
                        } else {
                            None
                        }
                    }
                }
            };
            if let Some(outcome) = decision {
                tracing::trace!(success = outcome.is_success(), "first decided");
                result.fulfill(outcome);
            }
        });
    }
    promise.future()
}
