//! Error type shared by every collection in the crate.

use thiserror::Error;

/// Result type for collection operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Why an operation did not complete.
///
/// A failed call leaves the collection exactly as it was before the call,
/// including after `Internal`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Error {
    /// The collection had no elements.
    #[error("collection is empty")]
    Empty,

    /// The key or value is not present.
    #[error("key or value not found")]
    NotFound,

    /// The key or value is already present.
    #[error("duplicate key or value")]
    Duplicate,

    /// An argument or capacity is outside of its allowed range.
    #[error("invalid argument or capacity")]
    Invalid,

    /// A buffer could not be allocated.
    #[error("allocation failed")]
    Alloc,

    /// An index is out of bounds.
    #[error("index out of range")]
    Range,

    /// An internal invariant was found broken; the call was abandoned.
    #[error("internal invariant violated: {0}")]
    Internal(&'static str),
}

impl From<std::collections::TryReserveError> for Error {
    fn from(_: std::collections::TryReserveError) -> Self {
        Error::Alloc
    }
}
