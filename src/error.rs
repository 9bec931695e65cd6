//! CLI Error Types

use derive_more::{Display, Error};

/// A CLI error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for CLI commands.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("could not load configuration")]
    Config,
    #[display("could not open the mirror database")]
    Database,
    #[display("could not read input")]
    Read,
    /// A line of the input stream is not a valid chain input.
    #[display("malformed input on line {_0}")]
    Malformed(#[error(not(source))] usize),
    /// Applying the input on this line failed; nothing from it was stored.
    #[display("failed to apply input on line {_0}")]
    Apply(#[error(not(source))] usize),
    #[display("failed to seed templates")]
    Bootstrap,
    #[display("failed to read mirror status")]
    Status,
}
