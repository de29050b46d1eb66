//! Observables measured at the end of a tape
//!
//! Single-wire Pauli-type observables, arbitrary Hermitian matrices over a set
//! of wires, and tensor products of those acting on disjoint wires.

use crate::wire::check_distinct;
use crate::{Result, TapeError, Wire};
use num_complex::Complex64;
use std::fmt;

/// Observable measured by a terminal [`Measurement`](crate::Measurement)
///
/// # Example
/// ```
/// use qtape_core::{Observable, Wire};
///
/// let obs = Observable::pauli_x(0).tensor(Observable::pauli_z(1)).unwrap();
/// assert_eq!(obs.wires(), vec![Wire::new(0), Wire::new(1)]);
/// assert_eq!(format!("{}", obs), "PauliX(w0) @ PauliZ(w1)");
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Observable {
    Identity(Wire),
    PauliX(Wire),
    PauliY(Wire),
    PauliZ(Wire),
    Hadamard(Wire),
    /// Hermitian matrix in row-major order; `wires[0]` is the most
    /// significant bit of the row index
    Hermitian {
        matrix: Vec<Complex64>,
        wires: Vec<Wire>,
    },
    /// Tensor product of factors on disjoint wires
    Tensor(Vec<Observable>),
}

impl Observable {
    /// Largest wire count a [`Observable::Hermitian`] matrix may span
    pub const MAX_HERMITIAN_WIRES: usize = 16;

    pub fn identity(wire: impl Into<Wire>) -> Self {
        Observable::Identity(wire.into())
    }

    pub fn pauli_x(wire: impl Into<Wire>) -> Self {
        Observable::PauliX(wire.into())
    }

    pub fn pauli_y(wire: impl Into<Wire>) -> Self {
        Observable::PauliY(wire.into())
    }

    pub fn pauli_z(wire: impl Into<Wire>) -> Self {
        Observable::PauliZ(wire.into())
    }

    pub fn hadamard(wire: impl Into<Wire>) -> Self {
        Observable::Hadamard(wire.into())
    }

    /// Hermitian observable over `wires`
    ///
    /// # Errors
    /// Returns error if the matrix is not `2^k × 2^k` for `k = wires.len()`,
    /// is not Hermitian, or the wires repeat or exceed
    /// [`Observable::MAX_HERMITIAN_WIRES`].
    pub fn hermitian(matrix: Vec<Complex64>, wires: &[Wire]) -> Result<Self> {
        if wires.is_empty() {
            return Err(TapeError::InvalidObservable(
                "Hermitian observable needs at least one wire".to_string(),
            ));
        }
        if let Some(wire) = check_distinct(wires) {
            return Err(TapeError::DuplicateWire(wire));
        }
        if wires.len() > Self::MAX_HERMITIAN_WIRES {
            return Err(TapeError::InvalidObservable(format!(
                "Hermitian observable spans {} wires, at most {} are supported",
                wires.len(),
                Self::MAX_HERMITIAN_WIRES
            )));
        }
        let dim = 1usize << wires.len();
        if matrix.len() != dim * dim {
            return Err(TapeError::InvalidObservable(format!(
                "expected a {}x{} matrix for {} wires, got {} entries",
                dim,
                dim,
                wires.len(),
                matrix.len()
            )));
        }
        for r in 0..dim {
            for c in r..dim {
                if (matrix[r * dim + c] - matrix[c * dim + r].conj()).norm() > 1e-10 {
                    return Err(TapeError::InvalidObservable(
                        "observable must be Hermitian".to_string(),
                    ));
                }
            }
        }
        Ok(Observable::Hermitian {
            matrix,
            wires: wires.to_vec(),
        })
    }

    /// Tensor product `self ⊗ other`, flattening nested products
    ///
    /// # Errors
    /// Returns error if the factors share a wire.
    pub fn tensor(self, other: Observable) -> Result<Self> {
        let mut factors = self.into_factors();
        factors.extend(other.into_factors());
        let wires: Vec<Wire> = factors.iter().flat_map(|f| f.wires()).collect();
        if let Some(wire) = check_distinct(&wires) {
            return Err(TapeError::DuplicateWire(wire));
        }
        Ok(Observable::Tensor(factors))
    }

    fn into_factors(self) -> Vec<Observable> {
        match self {
            Observable::Tensor(factors) => factors,
            other => vec![other],
        }
    }

    /// Wires the observable acts on, in factor order
    pub fn wires(&self) -> Vec<Wire> {
        match self {
            Observable::Identity(w)
            | Observable::PauliX(w)
            | Observable::PauliY(w)
            | Observable::PauliZ(w)
            | Observable::Hadamard(w) => vec![*w],
            Observable::Hermitian { wires, .. } => wires.clone(),
            Observable::Tensor(factors) => factors.iter().flat_map(|f| f.wires()).collect(),
        }
    }

    /// Name as used in error messages
    pub fn name(&self) -> &'static str {
        match self {
            Observable::Identity(_) => "Identity",
            Observable::PauliX(_) => "PauliX",
            Observable::PauliY(_) => "PauliY",
            Observable::PauliZ(_) => "PauliZ",
            Observable::Hadamard(_) => "Hadamard",
            Observable::Hermitian { .. } => "Hermitian",
            Observable::Tensor(_) => "Tensor",
        }
    }

    /// Whether every factor has eigenvalues ±1 (or 1) and a known diagonalizing basis change
    pub fn is_pauli_type(&self) -> bool {
        match self {
            Observable::Hermitian { .. } => false,
            Observable::Tensor(factors) => factors.iter().all(Observable::is_pauli_type),
            _ => true,
        }
    }
}

impl fmt::Display for Observable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Observable::Tensor(factors) => {
                for (i, factor) in factors.iter().enumerate() {
                    if i > 0 {
                        write!(f, " @ ")?;
                    }
                    write!(f, "{}", factor)?;
                }
                Ok(())
            }
            other => {
                write!(f, "{}(", other.name())?;
                for (i, w) in other.wires().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", w)?;
                }
                write!(f, ")")
            }
        }
    }
}
