//! Error types for state vector operations

use qtape_gates::GateError;
use thiserror::Error;

/// Errors that can occur during state vector operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StateError {
    /// Wire index outside the state
    #[error("Invalid wire index {index} for {num_qubits}-wire state")]
    InvalidWireIndex { index: usize, num_qubits: usize },

    /// Same wire listed twice for one matrix
    #[error("Wire {0} listed twice")]
    DuplicateWire(usize),

    /// Wire count above the supported maximum
    #[error("Cannot allocate a {num_qubits}-wire state: at most {max} wires are supported")]
    TooManyQubits { num_qubits: usize, max: usize },

    /// State not normalized
    #[error("State vector not normalized, norm = {norm}")]
    NotNormalized { norm: f64 },

    /// Dimension mismatch
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Basis state entries must be 0 or 1
    #[error("Basis state entries must be 0 or 1")]
    InvalidBasisState,

    /// Gate lookup failed
    #[error(transparent)]
    Gate(#[from] GateError),
}

/// Result type for state vector operations
pub type Result<T> = std::result::Result<T, StateError>;
