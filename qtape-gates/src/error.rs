//! Error types for the gate rule table

use qtape_core::TapeError;
use thiserror::Error;

/// Errors raised while looking up gate matrices, generators or inverses
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GateError {
    /// Gate has no closed-form inverse (state preparations)
    #[error("The {gate} operation has no inverse")]
    NoInverse { gate: String },

    /// Gate is not a unitary with a fixed matrix (state preparations)
    #[error("The {gate} operation has no unitary matrix")]
    NoMatrix { gate: String },

    /// An angle parameter held an array value
    #[error("The {gate} gate expects scalar parameters")]
    NonScalarParameter { gate: String },

    /// Observable cannot be diagonalized by a fixed gate sequence
    #[error("No diagonalizing gates known for observable {0}")]
    NotDiagonalizable(String),

    /// Error building the replacement operation
    #[error(transparent)]
    Tape(#[from] TapeError),
}

/// Type alias for results of rule-table lookups
pub type Result<T> = std::result::Result<T, GateError>;
