//! Error types for the reference device and the Jacobian engine

use qtape_core::{ReturnType, TapeError};
use qtape_gates::GateError;
use qtape_state::StateError;
use thiserror::Error;

/// Result type for gradient computations
pub type Result<T> = std::result::Result<T, GradientError>;

/// Errors raised while computing a Jacobian
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GradientError {
    /// A gate with a differentiated parameter has no generator
    #[error("The {gate} gate is not currently supported with the reversible gradient method")]
    UnsupportedGate { gate: String },

    /// A measurement other than an expectation value is present
    #[error("{kind} is not supported with the reversible gradient method")]
    UnsupportedMeasurement { kind: ReturnType },

    /// Analytic differentiation forced on a parameter that only supports
    /// finite differences
    #[error("Parameter {index} ({gate}) cannot be differentiated analytically")]
    AnalyticUnavailable { index: usize, gate: String },

    /// Sampled outputs have no derivative
    #[error("Circuits that include sampling can not be differentiated")]
    SampleNotDifferentiable,

    /// The device cannot hand over its final state
    #[error("Device '{device}' does not expose its state vector")]
    MissingState { device: String },

    /// Jacobian options rejected
    #[error("Invalid Jacobian options: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Tape(#[from] TapeError),

    #[error(transparent)]
    Gate(#[from] GateError),

    #[error(transparent)]
    State(#[from] StateError),
}
