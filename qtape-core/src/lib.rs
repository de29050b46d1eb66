//! Core types for recording and replaying differentiable quantum circuits
//!
//! This crate provides the building blocks that the rest of the workspace
//! layers on top of:
//! - [`Operation`]: a parameterized gate from a closed set of [`GateKind`]s
//! - [`Observable`] and [`Measurement`]: terminal readouts of a circuit
//! - [`Tape`]: an ordered, replayable record of operations and measurements
//!   with flat parameter indexing and trainability bookkeeping
//! - [`Device`]: the execution contract a simulation backend implements
//!
//! # Example
//! ```
//! use qtape_core::{expval, Observable, Operation, Tape};
//!
//! let tape = Tape::record(|| {
//!     Operation::ry(1.623, 0).queue();
//!     expval(Observable::pauli_x(0)).queue();
//! })
//! .unwrap();
//!
//! assert_eq!(tape.num_params(), 1);
//! assert_eq!(tape.measurements().len(), 1);
//! ```

pub mod device;
pub mod error;
pub mod measurement;
pub mod observable;
pub mod operation;
pub mod queuing;
pub mod tape;
pub mod wire;

// Re-exports for convenience
pub use device::Device;
pub use error::{DeviceError, TapeError};
pub use measurement::{
    expval, flatten_results, probs, sample, var, Measurement, MeasurementResult, ReturnType,
};
pub use num_complex::Complex64;
pub use observable::Observable;
pub use operation::{GateKind, GradMethod, Operation, Param, ParamValue};
pub use queuing::is_recording;
pub use tape::{ParamInfo, ParameterOverride, Tape};
pub use wire::Wire;

/// Type alias for results in qtape
pub type Result<T> = std::result::Result<T, TapeError>;
