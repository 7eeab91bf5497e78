//! Two-valued outcome type.
//!
//! An outcome is what a future is fulfilled with:
//!
//! - `Succeeded(T)`: the producer delivered a value
//! - `Failed(Error)`: the producer (or a combinator) failed
//!
//! Outcomes are immutable values; observers receive them by reference.

use crate::error::Error;
use core::fmt;

/// The result of a fulfilled future.
#[derive(Clone)]
pub enum Outcome<T> {
    /// Success with a value.
    Succeeded(T),
    /// Failure with an error.
    Failed(Error),
}

impl<T> Outcome<T> {
    /// Returns true if this outcome is `Succeeded`.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }

    /// Returns true if this outcome is `Failed`.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Returns the success value, if any.
    #[must_use]
    pub const fn value(&self) -> Option<&T> {
        match self {
            Self::Succeeded(v) => Some(v),
            Self::Failed(_) => None,
        }
    }

    /// Returns the error, if any.
    #[must_use]
    pub const fn error(&self) -> Option<&Error> {
        match self {
            Self::Succeeded(_) => None,
            Self::Failed(e) => Some(e),
        }
    }

    /// Invokes `f` with the value if this outcome succeeded.
    pub fn with_value<F: FnOnce(&T)>(&self, f: F) {
        if let Self::Succeeded(v) = self {
            f(v);
        }
    }

    /// Invokes `f` with the error if this outcome failed.
    pub fn with_error<F: FnOnce(&Error)>(&self, f: F) {
        if let Self::Failed(e) = self {
            f(e);
        }
    }

    /// Maps the success value using the provided function.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Outcome<U> {
        match self {
            Self::Succeeded(v) => Outcome::Succeeded(f(v)),
            Self::Failed(e) => Outcome::Failed(e),
        }
    }

    /// Borrows the success value.
    #[must_use]
    pub fn as_ref(&self) -> Outcome<&T> {
        match self {
            Self::Succeeded(v) => Outcome::Succeeded(v),
            Self::Failed(e) => Outcome::Failed(e.clone()),
        }
    }

    /// Converts this outcome to a standard Result.
    pub fn into_result(self) -> crate::Result<T> {
        match self {
            Self::Succeeded(v) => Ok(v),
            Self::Failed(e) => Err(e),
        }
    }

    /// Returns the success value or panics.
    ///
    /// # Panics
    ///
    /// Panics if the outcome is `Failed`.
    #[track_caller]
    pub fn unwrap(self) -> T {
        match self {
            Self::Succeeded(v) => v,
            Self::Failed(e) => panic!("called `Outcome::unwrap()` on a `Failed` value: {e}"),
        }
    }

    /// Returns the error or panics.
    ///
    /// # Panics
    ///
    /// Panics if the outcome is `Succeeded`.
    #[track_caller]
    pub fn unwrap_err(self) -> Error {
        match self {
            Self::Succeeded(_) => panic!("called `Outcome::unwrap_err()` on a `Succeeded` value"),
            Self::Failed(e) => e,
        }
    }
}

impl<T> From<crate::Result<T>> for Outcome<T> {
    fn from(result: crate::Result<T>) -> Self {
        match result {
            Ok(v) => Self::Succeeded(v),
            Err(e) => Self::Failed(e),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Outcome<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Succeeded(v) => f.debug_tuple("Succeeded").field(v).finish(),
            Self::Failed(e) => f.debug_tuple("Failed").field(e).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    // =========================================================================
    // Predicate Tests
    // =========================================================================

    #[test]
    fn is_success_predicate() {
        let ok: Outcome<i32> = Outcome::Succeeded(42);
        let err: Outcome<i32> = Outcome::Failed(Error::msg("boom"));

        assert!(ok.is_success());
        assert!(!ok.is_failure());
        assert!(!err.is_success());
        assert!(err.is_failure());
    }

    // =========================================================================
    // Accessor Tests
    // =========================================================================

    #[test]
    fn value_present_only_on_success() {
        let ok: Outcome<i32> = Outcome::Succeeded(7);
        let err: Outcome<i32> = Outcome::Failed(Error::timeout());

        assert_eq!(ok.value(), Some(&7));
        assert!(ok.error().is_none());
        assert!(err.value().is_none());
        assert_eq!(err.error().map(Error::kind), Some(ErrorKind::TimeoutExpired));
    }

    #[test]
    fn with_value_runs_only_for_success() {
        let mut seen = None;
        Outcome::Succeeded(3).with_value(|v| seen = Some(*v));
        assert_eq!(seen, Some(3));

        let mut called = false;
        Outcome::<i32>::Failed(Error::msg("x")).with_value(|_| called = true);
        assert!(!called);
    }

    #[test]
    fn with_error_runs_only_for_failure() {
        let mut kind = None;
        Outcome::<()>::Failed(Error::abandoned()).with_error(|e| kind = Some(e.kind()));
        assert_eq!(kind, Some(ErrorKind::Abandoned));

        let mut called = false;
        Outcome::Succeeded(1).with_error(|_| called = true);
        assert!(!called);
    }

    // =========================================================================
    // Conversion Tests
    // =========================================================================

    #[test]
    fn map_transforms_success() {
        let mapped = Outcome::Succeeded(21).map(|x| x * 2);
        assert!(matches!(mapped, Outcome::Succeeded(42)));
    }

    #[test]
    fn map_preserves_failure() {
        let mapped = Outcome::<i32>::Failed(Error::msg("kept")).map(|x| x * 2);
        assert_eq!(mapped.unwrap_err().message(), Some("kept"));
    }

    #[test]
    fn into_result_round_trips() {
        assert_eq!(Outcome::Succeeded(5).into_result().ok(), Some(5));
        let err = Outcome::<i32>::Failed(Error::timeout()).into_result();
        assert!(err.is_err_and(|e| e.is_timeout()));

        let back: Outcome<i32> = Outcome::from(Ok(9));
        assert!(matches!(back, Outcome::Succeeded(9)));
    }

    #[test]
    fn as_ref_borrows_value() {
        let ok = Outcome::Succeeded(String::from("hi"));
        assert_eq!(ok.as_ref().value().map(|s| s.as_str()), Some("hi"));
    }

    #[test]
    #[should_panic(expected = "called `Outcome::unwrap()` on a `Failed` value")]
    fn unwrap_panics_on_failure() {
        let _ = Outcome::<i32>::Failed(Error::msg("no")).unwrap();
    }

    #[test]
    fn debug_names_variant() {
        let ok = Outcome::Succeeded(1);
        assert_eq!(format!("{ok:?}"), "Succeeded(1)");
    }
}
