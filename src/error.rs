//! Error types for futures and promises.
//!
//! Every failure a [`Future`](crate::Future) can carry is an [`Error`]. The
//! core never inspects producer errors: they travel through `map`,
//! `flat_map`, `zip` and `collect` untouched until a handler, the blocking
//! bridge, or `rescue` observes them.
//!
//! # Error Kinds
//!
//! - **Producer**: the domain error a producer explicitly failed with
//! - **OptionalMissing**: `Future::from_option` was given `None`
//! - **TimeoutExpired**: a deadline set with `by` elapsed first
//! - **Abandoned**: every handle to a pending promise was dropped
//! - **EmptyInput**: `first` was given no futures
//!
//! Fulfilling a promise twice is not an `Error`: it is a broken producer
//! contract, reported as [`PromiseError`] by the `try_*` methods and as a
//! panic by `succeed`/`fail`.

use core::fmt;
use std::sync::Arc;

/// The kind of error carried by a failed future.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Error supplied by the producer of the value.
    Producer,
    /// An optional value was absent.
    OptionalMissing,
    /// The deadline elapsed before the source completed.
    TimeoutExpired,
    /// The promise was dropped without being fulfilled.
    Abandoned,
    /// A combinator that needs at least one input received none.
    EmptyInput,
}

impl ErrorKind {
    /// Returns a short, stable name for this kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Producer => "producer",
            Self::OptionalMissing => "optional missing",
            Self::TimeoutExpired => "timeout expired",
            Self::Abandoned => "abandoned",
            Self::EmptyInput => "empty input",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The error carried by the `Failed` variant of an [`Outcome`](crate::Outcome).
///
/// Cheap to clone: the optional source is shared, so one failure can be
/// handed to every observer of a future.
#[derive(Clone)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    source: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub const fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            source: None,
        }
    }

    /// Wraps a producer's domain error.
    #[must_use]
    pub fn producer(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::new(ErrorKind::Producer).with_source(source)
    }

    /// Creates a producer error from a plain message.
    #[must_use]
    pub fn msg(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Producer).with_message(message)
    }

    /// Creates the error used when an optional value is absent.
    #[must_use]
    pub const fn optional_missing() -> Self {
        Self::new(ErrorKind::OptionalMissing)
    }

    /// Creates the error used when a deadline elapses first.
    #[must_use]
    pub const fn timeout() -> Self {
        Self::new(ErrorKind::TimeoutExpired)
    }

    /// Creates the error reported for a promise dropped while pending.
    #[must_use]
    pub const fn abandoned() -> Self {
        Self::new(ErrorKind::Abandoned)
    }

    /// Creates the error reported by combinators given no inputs.
    #[must_use]
    pub const fn empty_input() -> Self {
        Self::new(ErrorKind::EmptyInput)
    }

    /// Adds a message description to the error.
    #[must_use]
    pub fn with_message(mut self, msg: impl Into<String>) -> Self {
        self.message = Some(msg.into());
        self
    }

    /// Adds a source error to the chain.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Arc::new(source));
        self
    }

    /// Returns the error kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error message, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Returns true if this error is a deadline expiry.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self.kind, ErrorKind::TimeoutExpired)
    }

    /// Returns true if the promise behind the future was abandoned.
    #[must_use]
    pub const fn is_abandoned(&self) -> bool {
        matches!(self.kind, ErrorKind::Abandoned)
    }

    /// Attempts to view the source error as a concrete type.
    #[must_use]
    pub fn downcast_ref<E: std::error::Error + 'static>(&self) -> Option<&E> {
        self.source.as_deref().and_then(|e| e.downcast_ref::<E>())
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Error");
        s.field("kind", &self.kind);
        if let Some(msg) = &self.message {
            s.field("message", msg);
        }
        if let Some(source) = &self.source {
            s.field("source", &format_args!("{source}"));
        }
        s.finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(msg) = &self.message {
            write!(f, ": {msg}")?;
        } else if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as _)
    }
}

/// Contract violations reported by a [`Promise`](crate::Promise).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PromiseError {
    /// The promise already holds an outcome.
    #[error("promise has already been fulfilled")]
    AlreadyFulfilled,
}

/// A specialized Result type whose error is a future's [`Error`].
pub type Result<T> = core::result::Result<T, Error>;
