//! Promissory: thread-safe futures and promises with advisory cancellation.
//!
//! # Overview
//!
//! A [`Promise`] is the write side of a deferred result; its [`Future`] is the
//! read side. The producer fulfills the promise exactly once with a value or
//! an [`Error`]; consumers attach side effects or derive new futures before
//! or after that happens, without blocking any thread.
//!
//! # Core Guarantees
//!
//! - **Single fulfillment**: a promise moves from pending to fulfilled once;
//!   a second attempt is a contract violation
//! - **Exactly-once observers**: every observer runs once, in registration
//!   order, with the one outcome
//! - **Atomic races**: deadlines and combinators resolve concurrent
//!   completions to a single winner
//! - **Cycle-free cancellation**: `cancel()` walks derived futures back to
//!   their source through weak references
//!
//! # Module Structure
//!
//! - [`types`]: the [`Outcome`] a future is fulfilled with
//! - [`error`]: [`Error`], [`ErrorKind`], [`PromiseError`]
//! - [`promise`]: the write side and its state machine
//! - [`future`]: the read side, constructors and transforms
//! - [`combinator`]: `collect`, `first`, `zip`, `zip3`, `join`, `all`, `none`
//! - [`context`]: invocation contexts and serial queues
//! - [`time`]: the timer thread behind `after` and `by`
//! - [`bridge`]: blocking `wait` and `.await` support
//! - [`adapter`]: futures from callback-style APIs
//! - [`chain`]: arena-backed parent/child links
//! - [`config`]: thread configuration
//! - [`util`]: internal utilities (arena)
//!
//! # Example
//!
//! ```
//! use promissory::{collect, Error, Future, Promise};
//! use std::time::Duration;
//!
//! let (a, b) = (Promise::new(), Promise::new());
//! let both = collect([a.future(), b.future()]).within(Duration::from_secs(5));
//!
//! std::thread::spawn(move || {
//!     b.succeed(2);
//!     a.succeed(1);
//! });
//! assert_eq!(both.wait().ok(), Some(vec![1, 2]));
//!
//! let recovered = Future::<i32>::error(Error::msg("offline")).rescue(|_| Future::value(0));
//! assert_eq!(recovered.wait().ok(), Some(0));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::doc_markdown)]

pub mod adapter;
pub mod bridge;
pub mod chain;
pub mod combinator;
pub mod config;
pub mod context;
pub mod error;
pub mod future;
pub mod promise;
pub mod time;
pub mod types;
pub mod util;

#[cfg(test)]
pub(crate) mod test_utils;

pub use adapter::{completion, completion_with_cancel, Completion};
pub use bridge::{wait, Awaiting};
pub use chain::{Chain, LinkId};
pub use combinator::{all, collect, first, join, none, zip, zip3};
pub use config::{QueueConfig, TimerConfig};
pub use context::{InvocationContext, SerialQueue, When};
pub use error::{Error, ErrorKind, PromiseError, Result};
pub use future::Future;
pub use promise::Promise;
pub use time::{Scheduled, Timer};
pub use types::Outcome;
