//! Error types for circuit synthesis.

use thiserror::Error;

/// Errors that can occur during circuit synthesis.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Attempted to invert zero.
    #[error("division by zero")]
    DivisionByZero,

    /// A constraint was not satisfied by the witness.
    #[error("unsatisfied constraint: {message}")]
    UnsatisfiedConstraint {
        /// Which constraint failed.
        message: &'static str,
    },

    /// Witness data was malformed or inconsistent.
    #[error("malformed witness: {message}")]
    MalformedWitness {
        /// What was wrong with the witness.
        message: &'static str,
    },

    /// A gadget was invoked with parameters it does not support.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(&'static str),
}

impl Error {
    /// Whether this error came from a failed constraint rather than a
    /// synthesis defect.
    pub fn is_unsatisfied(&self) -> bool {
        matches!(self, Error::UnsatisfiedConstraint { .. })
    }
}

/// Result type for synthesis operations.
pub type Result<T> = core::result::Result<T, Error>;
