//! Decode Error Types
//!
//! Every variant here is fatal: an operation that cannot be decoded would
//! otherwise be persisted as a partially-consistent graph.

use derive_more::{Display, Error};

/// A decode error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for decode operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// A value encoding that this indexer cannot represent.
    #[display("unsupported property value: {_0}")]
    UnsupportedValue(#[error(not(source))] &'static str),
    /// The decoded value kind does not fit the field it was assigned to.
    #[display("{class}.{field}: expected {expected}, found {found}")]
    TypeMismatch {
        class: &'static str,
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },
    /// Both branches of an "exactly one of" pair were supplied.
    #[display("{class}: both {first} and {second} supplied")]
    AmbiguousVariant {
        class: &'static str,
        first: &'static str,
        second: &'static str,
    },
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
