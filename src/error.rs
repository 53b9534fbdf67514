//! Persistence Failure
//!
//! TigerStyle: One error kind for the persistence boundary.
//!
//! A `PersistenceError` says "storing scan findings failed". It carries a
//! message that stands on its own and, when the failure came from a lower
//! layer (I/O, serialization, HTTP), that layer's error as its cause.
//!
//! The error is a plain value: it does not log, retry, or exit. Callers
//! propagate it with `?` and decide what to do at the top of the run.
//!
//! ```text
//! PersistenceError("failed to upload finding")
//!   └── source: io::Error(TimedOut, "network timeout")
//! ```

use std::error::Error as StdError;
use std::fmt::Write as _;

// =============================================================================
// Types
// =============================================================================

/// Boxed lower-layer error kept as the cause of a persistence failure.
pub type BoxedCause = Box<dyn StdError + Send + Sync + 'static>;

/// Result alias for persistence operations.
pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Persisting scan-result data failed.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct PersistenceError {
    /// Human-readable description of the failure
    message: String,
    /// Originating error, absent when the failure is local
    #[source]
    source: Option<BoxedCause>,
}

impl PersistenceError {
    /// Create a failure that originates locally (no cause).
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Create a failure caused by a lower-layer error.
    ///
    /// The cause is kept as given and can be recovered with
    /// [`PersistenceError::cause`] and `downcast_ref`.
    pub fn with_cause<E>(message: impl Into<String>, cause: E) -> Self
    where
        E: Into<BoxedCause>,
    {
        Self {
            message: message.into(),
            source: Some(cause.into()),
        }
    }

    /// The failure message, without any cause text.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The originating error, if any.
    pub fn cause(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.source.as_deref()
    }

    /// Check whether a cause is attached.
    pub fn has_cause(&self) -> bool {
        self.source.is_some()
    }

    /// Iterate over this error and every transitive source, outermost first.
    pub fn chain(&self) -> impl Iterator<Item = &(dyn StdError + 'static)> {
        std::iter::successors(Some(self as &(dyn StdError + 'static)), |e| (*e).source())
    }

    /// Render the message followed by one `caused by:` line per cause.
    pub fn report(&self) -> String {
        let mut out = self.message.clone();
        for cause in self.chain().skip(1) {
            // Writing to a String cannot fail.
            let _ = write!(out, "\n  caused by: {cause}");
        }
        out
    }
}

// =============================================================================
// Context
// =============================================================================

/// Wrap lower-layer errors as persistence failures.
pub trait PersistenceContext<T> {
    /// Convert the error into a `PersistenceError` with `message`, keeping
    /// the original error as cause.
    fn persistence_context(self, message: impl Into<String>) -> PersistenceResult<T>;

    /// Like `persistence_context`, but builds the message only on failure.
    fn with_persistence_context<F, M>(self, message: F) -> PersistenceResult<T>
    where
        F: FnOnce() -> M,
        M: Into<String>;
}

impl<T, E> PersistenceContext<T> for Result<T, E>
where
    E: StdError + Send + Sync + 'static,
{
    fn persistence_context(self, message: impl Into<String>) -> PersistenceResult<T> {
        self.map_err(|e| PersistenceError::with_cause(message, e))
    }

    fn with_persistence_context<F, M>(self, message: F) -> PersistenceResult<T>
    where
        F: FnOnce() -> M,
        M: Into<String>,
    {
        self.map_err(|e| PersistenceError::with_cause(message(), e))
    }
}

// =============================================================================
// Tests
// =============================================================================
