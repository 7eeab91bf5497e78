//! All-or-first-failure combinators: `collect`, `join`, `zip`, `zip3`.
//!
//! # Semantics
//!
//! ```text
//! collect([f1, ..., fn]):
//!   on fi succeeds with v: slot[i] ← v; if every slot filled → Succeeded(slots)
//!   on fi fails with e:    if undecided → Failed(e)
//! ```
//!
//! The values keep input order regardless of completion order. The first
//! failure by completion order decides; later outcomes are ignored.
//!
//! # Algebraic Laws
//!
//! - Identity: `collect([]) ≃ value(vec![])`
//! - Singleton: `collect([f]) ≃ f.map(|v| vec![v])`
//! - Associativity: `zip(zip(a, b), c) ≃ zip(a, zip(b, c))` (up to tuple shape)

use super::{cancellers, forwarding_promise};
use crate::future::Future;
use crate::types::Outcome;
use parking_lot::Mutex;
use std::sync::Arc;

struct Slots<T> {
    values: Vec<Option<T>>,
    remaining: usize,
    decided: bool,
}

/// Waits for every future and yields their values in input order.
///
/// Fails with the first failure to arrive, without waiting for the rest.
/// An empty input succeeds with an empty vector.
#[must_use]
pub fn collect<T, I>(futures: I) -> Future<Vec<T>>
where
    T: Clone + Send + 'static,
    I: IntoIterator<Item = Future<T>>,
{
    let futures: Vec<Future<T>> = futures.into_iter().collect();
    if futures.is_empty() {
        return Future::value(Vec::new());
    }

    let promise = forwarding_promise(cancellers(&futures));
    let slots = Arc::new(Mutex::new(Slots {
        values: (0..futures.len()).map(|_| None).collect(),
        remaining: futures.len(),
        decided: false,
    }));

    for (index, future) in futures.iter().enumerate() {
        let slots = Arc::clone(&slots);
        let result = promise.clone();
        future.respond(move |outcome| {
            let decision = {
                let mut slots = slots.lock();
                if slots.decided {
                    return;
                }
                match outcome {
                    Outcome::Succeeded(value) => {
                        slots.values[index] = Some(value.clone());
                        slots.remaining -= 1;
                        (slots.remaining == 0).then(|| {
                            slots.decided = true;
                            Outcome::Succeeded(slots.values.iter_mut().filter_map(Option::take).collect())
                        })
                    }
                    Outcome::Failed(error) => {
                        slots.decided = true;
                        Some(Outcome::Failed(error.clone()))
                    }
                }
            };
            if let Some(outcome) = decision {
                tracing::trace!(index, success = outcome.is_success(), "collect decided");
                result.fulfill(outcome);
            }
        });
    }
    promise.future()
}

/// Waits for every future, discarding the values.
///
/// Same failure rules as [`collect`].
#[must_use]
pub fn join<T, I>(futures: I) -> Future<()>
where
    T: Clone + Send + 'static,
    I: IntoIterator<Item = Future<T>>,
{
    collect(futures).map(|_| ())
}

struct Pair<A, B> {
    a: Option<A>,
    b: Option<B>,
    decided: bool,
}

impl<A, B> Pair<A, B> {
    fn complete(&mut self) -> Option<Outcome<(A, B)>> {
        if self.a.is_none() || self.b.is_none() {
            return None;
        }
        self.decided = true;
        Some(Outcome::Succeeded((self.a.take()?, self.b.take()?)))
    }
}

/// Pairs the values of two futures.
///
/// Fails as soon as either input fails.
#[must_use]
pub fn zip<A, B>(a: &Future<A>, b: &Future<B>) -> Future<(A, B)>
where
    A: Clone + Send + 'static,
    B: Clone + Send + 'static,
{
    let promise = forwarding_promise(vec![a.canceller(), b.canceller()]);
    let pair = Arc::new(Mutex::new(Pair {
        a: None,
        b: None,
        decided: false,
    }));

    let (state, result) = (Arc::clone(&pair), promise.clone());
    a.respond(move |outcome| {
        let decision = {
            let mut pair = state.lock();
            if pair.decided {
                return;
            }
            match outcome {
                Outcome::Succeeded(value) => {
                    pair.a = Some(value.clone());
                    pair.complete()
                }
                Outcome::Failed(error) => {
                    pair.decided = true;
                    Some(Outcome::Failed(error.clone()))
                }
            }
        };
        if let Some(outcome) = decision {
            result.fulfill(outcome);
        }
    });

    let (state, result) = (pair, promise.clone());
    b.respond(move |outcome| {
        let decision = {
            let mut pair = state.lock();
            if pair.decided {
                return;
            }
            match outcome {
                Outcome::Succeeded(value) => {
                    pair.b = Some(value.clone());
                    pair.complete()
                }
                Outcome::Failed(error) => {
                    pair.decided = true;
                    Some(Outcome::Failed(error.clone()))
                }
            }
        };
        if let Some(outcome) = decision {
            result.fulfill(outcome);
        }
    });

    promise.future()
}

/// Triples the values of three futures.
///
/// Fails as soon as any input fails.
#[must_use]
pub fn zip3<A, B, C>(a: &Future<A>, b: &Future<B>, c: &Future<C>) -> Future<(A, B, C)>
where
    A: Clone + Send + 'static,
    B: Clone + Send + 'static,
    C: Clone + Send + 'static,
{
    zip(&zip(a, b), c).map(|((a, b), c)| (a, b, c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, ErrorKind};
    use crate::promise::Promise;
    use crate::test_utils::{assert_failed, assert_succeeded, init_test_logging};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn pending<T: Clone + Send + 'static>(n: usize) -> Vec<Promise<T>> {
        (0..n).map(|_| Promise::new()).collect()
    }

    // =========================================================================
    // collect
    // =========================================================================

    #[test]
    fn collect_empty_is_empty_vec() {
        init_test_logging();
        assert_succeeded!(collect(Vec::<Future<i32>>::new()), Vec::<i32>::new());
    }

    #[test]
    fn collect_keeps_input_order() {
        init_test_logging();
        let ps = pending::<i32>(3);
        let all = collect(ps.iter().map(Promise::future));
        ps[2].succeed(3);
        ps[0].succeed(1);
        assert!(all.poll().is_none());
        ps[1].succeed(2);
        assert_succeeded!(all, vec![1, 2, 3]);
    }

    #[test]
    fn collect_first_failure_wins_immediately() {
        init_test_logging();
        let ps = pending::<i32>(3);
        let all = collect(ps.iter().map(Promise::future));
        ps[1].fail(Error::msg("E1"));
        let err = all.poll().expect("decided").unwrap_err();
        assert_eq!(err.message(), Some("E1"));

        // Later outcomes are ignored.
        ps[0].fail(Error::msg("E0"));
        ps[2].succeed(3);
        assert_eq!(all.poll().expect("decided").unwrap_err().message(), Some("E1"));
    }

    #[test]
    fn collect_of_constants_is_immediate() {
        init_test_logging();
        let all = collect([Future::value('a'), Future::value('b')]);
        assert_succeeded!(all, vec!['a', 'b']);
    }

    #[test]
    fn collect_cancel_reaches_every_input() {
        init_test_logging();
        let count = Arc::new(AtomicUsize::new(0));
        let ps: Vec<Promise<i32>> = (0..4)
            .map(|_| {
                let count = Arc::clone(&count);
                Promise::with_cancel_action(move || {
                    count.fetch_add(1, Ordering::SeqCst);
                })
            })
            .collect();
        collect(ps.iter().map(Promise::future)).cancel();
        assert_eq!(count.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn join_discards_values() {
        init_test_logging();
        let ps = pending::<String>(2);
        let done = join(ps.iter().map(Promise::future));
        ps[0].succeed("x".into());
        ps[1].succeed("y".into());
        assert_succeeded!(done, ());
    }

    // =========================================================================
    // zip
    // =========================================================================

    #[test]
    fn zip_pairs_values() {
        init_test_logging();
        let (a, b) = (Promise::new(), Promise::new());
        let pair = zip(&a.future(), &b.future());
        b.succeed("two");
        a.succeed(1);
        assert_succeeded!(pair, (1, "two"));
    }

    #[test]
    fn zip_fails_without_waiting() {
        init_test_logging();
        let (a, b) = (Promise::<i32>::new(), Promise::<i32>::new());
        let pair = zip(&a.future(), &b.future());
        b.fail(Error::msg("E"));
        assert_failed!(pair, ErrorKind::Producer);
        a.succeed(1);
    }

    #[test]
    fn zip3_triples_values() {
        init_test_logging();
        let t = zip3(&Future::value(1), &Future::value("b"), &Future::value('c'));
        assert_succeeded!(t, (1, "b", 'c'));
    }

    #[test]
    fn zip3_fails_on_third() {
        init_test_logging();
        let c = Promise::<u8>::new();
        let t = zip3(&Future::value(1), &Future::value(2), &c.future());
        c.fail(Error::timeout());
        assert_failed!(t, ErrorKind::TimeoutExpired);
    }
}
