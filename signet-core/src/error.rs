//! Error Taxonomy
//!
//! Every failure the bridge can surface is a variant of [`SignalError`].
//! The core never catches and suppresses: all errors propagate upward to
//! whatever boundary the host UI runtime provides, and no retries are
//! performed anywhere in this crate.

use std::sync::Arc;

use thiserror::Error;

use crate::store::AtomId;

/// Errors surfaced by signal handles and the store contract.
///
/// `Propagated` carries its message behind an `Arc` so that re-throwing the
/// same failure from multiple render passes yields errors that compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignalError {
    /// Write attempted through a handle whose atom exposes no write operation.
    #[error("atom is not writable")]
    NotWritable,

    /// Write attempted with a non-empty path. Whole-value replacement is the
    /// only supported write; a partial update is never silently applied.
    #[error("updating a sub-path is not supported")]
    UnsupportedSubPathWrite,

    /// The atom's own computation failed, either synchronously at read time
    /// or as the rejection of a pending asynchronous value.
    #[error("{0}")]
    Propagated(Arc<str>),

    /// The store reported neither a value, a pending computation, nor an
    /// error for a read. This is an internal invariant violation, not a
    /// recoverable condition. In practice it means the atom or the store
    /// behind a handle was dropped while the handle was still in use.
    #[error("no value, pending computation, or error for atom {0:?}")]
    MissingValue(AtomId),
}

impl SignalError {
    /// Build a `Propagated` error from any message-like input.
    pub fn propagated(message: impl Into<Arc<str>>) -> Self {
        Self::Propagated(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn propagated_errors_compare_equal() {
        let a = SignalError::propagated("boom");
        let b = a.clone();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "boom");
    }

    #[test]
    fn display_strings() {
        assert_eq!(SignalError::NotWritable.to_string(), "atom is not writable");
        assert_eq!(
            SignalError::UnsupportedSubPathWrite.to_string(),
            "updating a sub-path is not supported"
        );
    }
}
