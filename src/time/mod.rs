//! Scheduling of delayed work.
//!
//! Futures never sleep. Anything time-based (`Future::after`, `by`
//! deadlines) is expressed as a job handed to a [`Timer`], which hands it to
//! a dispatch thread once the deadline passes.

mod dispatch;
pub mod timer;

pub use timer::{Scheduled, Timer};
