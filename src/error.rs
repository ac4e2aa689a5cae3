//! Error type shared by the generator, the front-end and the results table.

use std::fmt;
use std::io;

use crate::smtlib::FrontEndError;

/// Errors raised by `eqbench` operations.
///
/// An undefined metric is not an error: the analyzer reports it as a missing
/// value in its [`Measurement`][crate::analyzer::Measurement].
#[derive(Debug)]
pub enum Error {
    /// Malformed or out-of-range parameters. Raised before any output is produced.
    InvalidArgument(String),
    /// Internal bookkeeping could not be satisfied. Indicates a defect in the
    /// bounds derivation; the run must stop.
    InvariantViolation(String),
    /// File I/O error.
    Io(io::Error),
    /// The formula could not be read or normalized.
    FrontEnd(FrontEndError),
    /// A results table row could not be read back.
    Table(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<FrontEndError> for Error {
    fn from(e: FrontEndError) -> Self {
        Error::FrontEnd(e)
    }
}

impl From<fmt::Error> for Error {
    fn from(_: fmt::Error) -> Self {
        Error::Io(io::Error::new(io::ErrorKind::Other, "formatting failed"))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            Error::InvariantViolation(msg) => write!(f, "Invariant violation: {}", msg),
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::FrontEnd(e) => write!(f, "Front-end error: {}", e),
            Error::Table(msg) => write!(f, "Results table error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::FrontEnd(e) => Some(e),
            _ => None,
        }
    }
}
