//! Combinators over collections of futures.
//!
//! - [`collect`]: all values in input order; first failure wins
//! - [`join`]: like `collect`, discarding the values
//! - [`zip`] / [`zip3`]: a tuple of heterogeneous values; first failure wins
//! - [`first`]: first success wins; if all fail, the last failure
//! - [`all`]: succeeds iff every input succeeds
//! - [`none`]: succeeds iff every input fails
//!
//! # Concurrency
//!
//! Inputs may complete concurrently on different threads. Each combinator
//! keeps one mutex-guarded accumulator; the decision to fulfill the result is
//! taken under that lock and the result promise is fulfilled after it is
//! released. Every input is observed exactly once.
//!
//! # Cancellation
//!
//! Cancelling a combined future forwards `cancel()` to every input. Inputs
//! are held weakly by the forwarding hook.

pub mod first;
pub mod join;
pub mod settle;

pub use first::first;
pub use join::{collect, join, zip, zip3};
pub use settle::{all, none};

use crate::future::Future;
use crate::promise::{CancelHook, Promise};

/// Creates the result promise of a combinator, cancelling `inputs` on
/// `cancel()`.
fn forwarding_promise<T>(inputs: Vec<CancelHook>) -> Promise<T>
where
    T: Clone + Send + 'static,
{
    Promise::with_cancel_action(move || {
        tracing::debug!(inputs = inputs.len(), "forwarding cancel to combinator inputs");
        for cancel in &inputs {
            cancel();
        }
    })
}

fn cancellers<T: Clone + Send + 'static>(futures: &[Future<T>]) -> Vec<CancelHook> {
    futures.iter().map(Future::canceller).collect()
}
