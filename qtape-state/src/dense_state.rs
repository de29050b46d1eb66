//! Dense state vector
//!
//! Stores all `2^n` amplitudes of an `n`-wire state and provides the
//! operations the reference device and the reversible gradient engine need:
//! gate and observable application, inner products, expectation values,
//! variances and marginal probabilities.

use crate::error::{Result, StateError};
use crate::kernels::{apply_matrix, local_offsets};
use num_complex::Complex64;
use qtape_core::{GateKind, Observable, Operation};
use std::fmt;

/// Dense quantum state over `num_qubits` wires
///
/// Amplitude `i` belongs to the basis state whose bit `q` is the value of
/// wire `q`.
///
/// # Example
///
/// ```
/// use qtape_core::{Observable, Operation};
/// use qtape_state::DenseState;
///
/// let mut state = DenseState::new(2).unwrap();
/// state.apply_operation(&Operation::hadamard(0)).unwrap();
///
/// assert!(state.is_normalized(1e-10));
/// assert!(state.expectation(&Observable::pauli_x(0)).unwrap() > 0.999);
/// ```
#[derive(Clone, PartialEq)]
pub struct DenseState {
    num_qubits: usize,
    amplitudes: Vec<Complex64>,
}

impl DenseState {
    /// Largest supported wire count
    pub const MAX_QUBITS: usize = 30;

    /// Create a new dense state initialized to |0...0⟩
    ///
    /// # Errors
    /// Returns error if `num_qubits` exceeds [`DenseState::MAX_QUBITS`].
    pub fn new(num_qubits: usize) -> Result<Self> {
        if num_qubits > Self::MAX_QUBITS {
            return Err(StateError::TooManyQubits {
                num_qubits,
                max: Self::MAX_QUBITS,
            });
        }
        let mut amplitudes = vec![Complex64::new(0.0, 0.0); 1 << num_qubits];
        amplitudes[0] = Complex64::new(1.0, 0.0);
        Ok(Self {
            num_qubits,
            amplitudes,
        })
    }

    /// Create a dense state from amplitude data
    ///
    /// The amplitudes are taken as given; no normalization is enforced, so
    /// unnormalized vectors such as `O|ψ⟩` can be represented.
    ///
    /// # Errors
    /// Returns error if the length is not `2^num_qubits`.
    pub fn from_amplitudes(num_qubits: usize, amplitudes: &[Complex64]) -> Result<Self> {
        if num_qubits > Self::MAX_QUBITS {
            return Err(StateError::TooManyQubits {
                num_qubits,
                max: Self::MAX_QUBITS,
            });
        }
        let expected = 1usize << num_qubits;
        if amplitudes.len() != expected {
            return Err(StateError::DimensionMismatch {
                expected,
                actual: amplitudes.len(),
            });
        }
        Ok(Self {
            num_qubits,
            amplitudes: amplitudes.to_vec(),
        })
    }

    #[inline]
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Get the state dimension (2^num_qubits)
    #[inline]
    pub fn dimension(&self) -> usize {
        self.amplitudes.len()
    }

    #[inline]
    pub fn amplitudes(&self) -> &[Complex64] {
        &self.amplitudes
    }

    pub fn norm(&self) -> f64 {
        self.amplitudes
            .iter()
            .map(Complex64::norm_sqr)
            .sum::<f64>()
            .sqrt()
    }

    pub fn is_normalized(&self, epsilon: f64) -> bool {
        (self.norm() - 1.0).abs() < epsilon
    }

    /// Reset to |0...0⟩
    pub fn reset(&mut self) {
        self.amplitudes.fill(Complex64::new(0.0, 0.0));
        self.amplitudes[0] = Complex64::new(1.0, 0.0);
    }

    fn check_wires(&self, wires: &[usize]) -> Result<()> {
        for (i, &w) in wires.iter().enumerate() {
            if w >= self.num_qubits {
                return Err(StateError::InvalidWireIndex {
                    index: w,
                    num_qubits: self.num_qubits,
                });
            }
            if wires[..i].contains(&w) {
                return Err(StateError::DuplicateWire(w));
            }
        }
        Ok(())
    }

    /// Apply a row-major matrix over `wires`, `wires[0]` most significant
    ///
    /// # Errors
    /// Returns error for invalid or repeated wires or a mis-sized matrix.
    pub fn apply_matrix(&mut self, matrix: &[Complex64], wires: &[usize]) -> Result<()> {
        self.check_wires(wires)?;
        let sub = 1usize << wires.len();
        if matrix.len() != sub * sub {
            return Err(StateError::DimensionMismatch {
                expected: sub * sub,
                actual: matrix.len(),
            });
        }
        apply_matrix(&mut self.amplitudes, matrix, wires, self.num_qubits);
        Ok(())
    }

    /// Apply a gate or state preparation
    pub fn apply_operation(&mut self, op: &Operation) -> Result<()> {
        if op.kind().is_state_preparation() {
            return self.prepare(op);
        }
        let wires: Vec<usize> = op.wires().iter().map(|w| w.index()).collect();
        let matrix = qtape_gates::matrix(op)?;
        self.apply_matrix(&matrix, &wires)
    }

    /// Overwrite the state with the one `op` prepares
    ///
    /// Wires not named by `op` are left in |0⟩.
    fn prepare(&mut self, op: &Operation) -> Result<()> {
        let wires: Vec<usize> = op.wires().iter().map(|w| w.index()).collect();
        self.check_wires(&wires)?;
        let offsets = local_offsets(&wires);
        let values = op.params()[0].as_array().unwrap_or(&[]);

        let mut amplitudes = vec![Complex64::new(0.0, 0.0); self.dimension()];
        match op.kind() {
            GateKind::QubitStateVector => {
                if values.len() != offsets.len() {
                    return Err(StateError::DimensionMismatch {
                        expected: offsets.len(),
                        actual: values.len(),
                    });
                }
                let norm = values.iter().map(Complex64::norm_sqr).sum::<f64>().sqrt();
                if (norm - 1.0).abs() > 1e-10 {
                    return Err(StateError::NotNormalized { norm });
                }
                for (&offset, &value) in offsets.iter().zip(values) {
                    amplitudes[offset] = value;
                }
            }
            _ => {
                if values.len() != wires.len() {
                    return Err(StateError::DimensionMismatch {
                        expected: wires.len(),
                        actual: values.len(),
                    });
                }
                let mut index = 0;
                for (&w, bit) in wires.iter().zip(values) {
                    match (bit.re, bit.im) {
                        (b, i) if b == 0.0 && i == 0.0 => {}
                        (b, i) if b == 1.0 && i == 0.0 => index |= 1 << w,
                        _ => return Err(StateError::InvalidBasisState),
                    }
                }
                amplitudes[index] = Complex64::new(1.0, 0.0);
            }
        }
        self.amplitudes = amplitudes;
        Ok(())
    }

    /// Replace `|ψ⟩` with `O|ψ⟩` (not normalized)
    pub fn apply_observable(&mut self, obs: &Observable) -> Result<()> {
        match obs {
            Observable::Identity(w) => self.check_wires(&[w.index()]),
            Observable::Tensor(factors) => {
                for factor in factors {
                    self.apply_observable(factor)?;
                }
                Ok(())
            }
            _ => {
                let wires: Vec<usize> = obs.wires().iter().map(|w| w.index()).collect();
                self.apply_matrix(&qtape_gates::observable_matrix(obs), &wires)
            }
        }
    }

    /// Compute the inner product with another state: ⟨self|other⟩
    ///
    /// # Errors
    /// Returns error if states have different dimensions
    pub fn inner_product(&self, other: &DenseState) -> Result<Complex64> {
        if self.dimension() != other.dimension() {
            return Err(StateError::DimensionMismatch {
                expected: self.dimension(),
                actual: other.dimension(),
            });
        }

        Ok(self
            .amplitudes
            .iter()
            .zip(other.amplitudes.iter())
            .map(|(a, b)| a.conj() * b)
            .sum())
    }

    /// ⟨ψ|O|ψ⟩
    pub fn expectation(&self, obs: &Observable) -> Result<f64> {
        let mut applied = self.clone();
        applied.apply_observable(obs)?;
        Ok(self.inner_product(&applied)?.re)
    }

    /// ⟨ψ|O²|ψ⟩ − ⟨ψ|O|ψ⟩²
    pub fn variance(&self, obs: &Observable) -> Result<f64> {
        let mut applied = self.clone();
        applied.apply_observable(obs)?;
        let mean = self.inner_product(&applied)?.re;
        let second = applied.inner_product(&applied)?.re;
        Ok(second - mean * mean)
    }

    /// Probabilities of every computational basis state of `wires`
    ///
    /// Entry `l` has `wires[0]` as its most significant bit.
    pub fn marginal_probabilities(&self, wires: &[usize]) -> Result<Vec<f64>> {
        self.check_wires(wires)?;
        let k = wires.len();
        let mut probabilities = vec![0.0; 1 << k];
        for (index, amp) in self.amplitudes.iter().enumerate() {
            let local = wires
                .iter()
                .enumerate()
                .fold(0usize, |acc, (j, &w)| acc | (index >> w & 1) << (k - 1 - j));
            probabilities[local] += amp.norm_sqr();
        }
        Ok(probabilities)
    }
}

/// Index selected by `random_value` from a cumulative walk over `probabilities`
pub fn pick(probabilities: &[f64], random_value: f64) -> usize {
    let mut cumulative = 0.0;
    for (i, p) in probabilities.iter().enumerate() {
        cumulative += p;
        if random_value < cumulative {
            return i;
        }
    }
    // rounding left the draw past the total
    probabilities
        .iter()
        .rposition(|&p| p > 0.0)
        .unwrap_or(0)
}

impl fmt::Debug for DenseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DenseState")
            .field("num_qubits", &self.num_qubits)
            .field("dimension", &self.dimension())
            .field("norm", &self.norm())
            .finish()
    }
}
