//! Gate rule table for qtape
//!
//! This crate answers every per-gate question the simulator and the gradient
//! engine need:
//!
//! - [`matrix`]: the unitary of an [`Operation`](qtape_core::Operation)
//! - [`generator`]: the Hermitian generator and its coefficient
//! - [`inverse`]: the closed-form inverse operation
//! - [`analytic_support`]: whether the reversible method can differentiate it
//! - [`decomposition`]: `Rot` split into single-axis rotations
//! - [`observable_matrix`] and [`diagonalizing_gates`] for measurements
//!
//! Fixed gate matrices are compile-time constants in [`matrices`].
//!
//! # Example
//!
//! ```
//! use qtape_core::{GateKind, Operation};
//! use qtape_gates::{generator, inverse};
//!
//! let op = Operation::rx(0.4, 0);
//! let inv = inverse(&op).unwrap();
//! assert_eq!(inv.scalar(0), Some(-0.4));
//!
//! let gen = generator(GateKind::RX).unwrap();
//! assert_eq!(gen.coefficient, -0.5);
//! ```

pub mod error;
pub mod matrices;
pub mod rules;

pub use error::GateError;
pub use rules::{
    analytic_support, decomposition, diagonalizing_gates, generator, inverse, matrix,
    observable_matrix, AnalyticSupport, Generator,
};
