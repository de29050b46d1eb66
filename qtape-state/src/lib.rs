//! State vector simulation for qtape
//!
//! [`DenseState`] holds the full amplitude vector of a circuit. It is used by
//! the reference device to run tapes and by the reversible gradient engine,
//! which keeps two such vectors and walks them backwards through a tape.

pub mod dense_state;
pub mod error;
pub mod kernels;

pub use dense_state::DenseState;
pub use error::{Result, StateError};
