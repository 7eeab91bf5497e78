//! Core value types.
//!
//! - [`outcome`]: the two-valued result a future is fulfilled with

pub mod outcome;

pub use outcome::Outcome;
