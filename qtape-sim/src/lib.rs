//! Reference device and Jacobian engine for qtape
//!
//! This crate executes [`Tape`](qtape_core::Tape)s and differentiates them.
//!
//! # Features
//!
//! - **Reference device**: [`DefaultQubit`], a dense state-vector simulator
//!   with optional shot sampling
//! - **Reversible gradients**: every analytic Jacobian column from a single
//!   forward execution
//! - **Finite differences**: forward or central stencils for gates without a
//!   generator
//!
//! # Example
//!
//! ```
//! use qtape_core::{expval, Observable, Operation, Param, Tape};
//! use qtape_sim::{DefaultQubit, Differentiable, JacobianOptions};
//!
//! let mut tape = Tape::record(|| {
//!     Operation::rx(Param::fixed(0.31), 0).queue();
//!     Operation::ry(0.5, 0).queue();
//!     expval(Observable::pauli_z(0)).queue();
//! })
//! .unwrap();
//!
//! let mut dev = DefaultQubit::new(1).unwrap();
//! let analytic = tape.jacobian(&mut dev, &JacobianOptions::analytic()).unwrap();
//! let numeric = tape.jacobian(&mut dev, &JacobianOptions::numeric()).unwrap();
//! assert_eq!(analytic.shape(), (1, 1));
//! assert!((analytic[(0, 0)] - numeric[(0, 0)]).abs() < 1e-6);
//! ```

pub mod config;
pub mod device;
pub mod error;
pub mod gradient;

pub use config::DeviceConfig;
pub use device::DefaultQubit;
pub use error::{GradientError, Result};
pub use gradient::{
    matrix_elem, Differentiable, FiniteDifferenceOrder, Jacobian, JacobianMethod,
    JacobianOptions, NumericOptions,
};
