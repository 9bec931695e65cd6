//! Materializer Error Types
//!
//! Everything surfaced here is fatal to the run: the batch is rolled back and
//! processing has to stop. Unknown classes never reach this module, they are
//! logged and skipped where they are found.

use cdmirror_schema::{ClassId, EntityId};
use derive_more::{Display, Error};

/// A materializer error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for materializer operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies why a batch could not be applied.
///
/// ### Integrity Errors
/// - [`ErrorKind::EntityNotFound`]
/// - [`ErrorKind::TemplateMissing`]
/// - [`ErrorKind::UnknownLocalEntity`]
/// - [`ErrorKind::ClassMismatch`]
/// - [`ErrorKind::InvalidFailedIndex`]
/// - [`ErrorKind::InvalidTimestamp`]
///
/// ### Dependency Errors
/// - [`ErrorKind::Decode`]
/// - [`ErrorKind::Store`]
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Operation records could not be decoded into typed properties.
    #[display("could not decode operation")]
    Decode,
    /// A read or write against the mirror database failed.
    #[display("store operation failed")]
    Store,
    /// A referenced entity has no row in its class table.
    #[display("{class} entity {id} not found")]
    EntityNotFound { class: &'static str, id: EntityId },
    /// The id-0 template of a class is absent; run the bootstrap first.
    #[display("{_0}(0) template not found")]
    TemplateMissing(#[error(not(source))] &'static str),
    /// A batch-local index points past the batch's creations.
    #[display("batch-local entity {_0} was never created in this batch")]
    UnknownLocalEntity(#[error(not(source))] u32),
    /// A reference resolved to an entity of another class.
    #[display("entity {id} has class id {found}, expected {expected}")]
    ClassMismatch { id: EntityId, expected: &'static str, found: ClassId },
    #[display("failed operation index {failed_at} out of range for {operations} operations")]
    InvalidFailedIndex { failed_at: usize, operations: usize },
    #[display("block timestamp {_0}ms is out of range")]
    InvalidTimestamp(#[error(not(source))] i64),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Store)
    }
}
