//! Error types for tape recording and device execution

use crate::Wire;
use thiserror::Error;

/// Errors raised by a device while executing a tape
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DeviceError {
    /// Operation or measurement addresses a wire the device does not have
    #[error("Invalid wire {wire}: device '{device}' has only {num_wires} wires")]
    InvalidWire {
        device: String,
        wire: usize,
        num_wires: usize,
    },

    /// Device configuration rejected
    #[error("Invalid device configuration: {0}")]
    InvalidConfig(String),

    /// State preparation placed after other operations or with a bad vector
    #[error("Cannot apply {gate}: {reason}")]
    StatePreparation { gate: String, reason: String },

    /// Observable cannot be evaluated for the requested return type
    #[error("Observable {observable} is not supported for {return_type}")]
    UnsupportedObservable {
        observable: String,
        return_type: String,
    },

    /// Generic failure inside the simulation backend
    #[error("Simulation failed: {0}")]
    Simulation(String),
}

impl DeviceError {
    /// Create an invalid wire error
    pub fn invalid_wire(device: impl Into<String>, wire: usize, num_wires: usize) -> Self {
        Self::InvalidWire {
            device: device.into(),
            wire,
            num_wires,
        }
    }
}

/// Errors that can occur while building or executing a tape
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TapeError {
    /// Gate applied to the wrong number of wires
    #[error("Gate '{gate}' requires {expected} wires, but {actual} were provided")]
    InvalidWireCount {
        gate: String,
        expected: usize,
        actual: usize,
    },

    /// Gate constructed with the wrong number of parameters
    #[error("Gate '{gate}' takes {expected} parameters, but {actual} were provided")]
    InvalidParameterCount {
        gate: String,
        expected: usize,
        actual: usize,
    },

    /// Duplicate wire in an operation or observable
    #[error("Duplicate wire {0} in operation")]
    DuplicateWire(Wire),

    /// Trainable index outside the flat parameter range
    #[error("Trainable parameter index {index} is out of range: tape has {num_params} parameters")]
    TrainableIndexOutOfRange { index: usize, num_params: usize },

    /// Parameter override with the wrong number of values
    #[error("Expected {expected} parameter values, but {actual} were provided")]
    ParameterCountMismatch { expected: usize, actual: usize },

    /// Scalar substitution or training requested for an array-valued parameter
    #[error("Parameter {index} is array-valued and cannot be substituted or trained")]
    NonScalarParameter { index: usize },

    /// A recording was opened while another one was active
    #[error("Nested recording is not supported: a tape is already being recorded on this thread")]
    NestedRecording,

    /// Malformed observable
    #[error("Invalid observable: {0}")]
    InvalidObservable(String),

    /// Error propagated unchanged from the device
    #[error(transparent)]
    Device(#[from] DeviceError),
}

impl TapeError {
    /// Create an invalid wire count error
    pub fn invalid_wire_count(gate: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::InvalidWireCount {
            gate: gate.into(),
            expected,
            actual,
        }
    }

    /// Create an invalid parameter count error
    pub fn invalid_parameter_count(
        gate: impl Into<String>,
        expected: usize,
        actual: usize,
    ) -> Self {
        Self::InvalidParameterCount {
            gate: gate.into(),
            expected,
            actual,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_wire_count_error() {
        let err = TapeError::invalid_wire_count("CNOT", 2, 1);
        let msg = format!("{}", err);
        assert!(msg.contains("CNOT"));
        assert!(msg.contains("2"));
        assert!(msg.contains("1"));
    }

    #[test]
    fn test_trainable_out_of_range_error() {
        let err = TapeError::TrainableIndexOutOfRange {
            index: 5,
            num_params: 3,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("5"));
        assert!(msg.contains("3 parameters"));
    }

    #[test]
    fn test_device_error_is_transparent() {
        let err: TapeError = DeviceError::invalid_wire("default.qubit", 4, 2).into();
        assert_eq!(
            err.to_string(),
            "Invalid wire 4: device 'default.qubit' has only 2 wires"
        );
    }
}
