//! Per-gate rule table
//!
//! One dispatch point per question the gradient engine asks about a gate:
//! its unitary, its generator, its closed-form inverse, whether the
//! reversible method handles it, and how to split it into simpler gates.

use crate::error::{GateError, Result};
use crate::matrices::{self, to_dense};
use num_complex::Complex64;
use qtape_core::{GateKind, Observable, Operation, Param};
use std::f64::consts::FRAC_PI_2;

/// Hermitian generator of a one-parameter gate family
///
/// The gate equals `exp(i·coefficient·θ·matrix)`, so
/// `∂⟨O⟩/∂θ = −2·coefficient·Im⟨bra|matrix|ket⟩`.
#[derive(Debug, Clone, PartialEq)]
pub struct Generator {
    /// Row-major matrix over the gate's wires
    pub matrix: Vec<Complex64>,
    pub coefficient: f64,
}

/// How the reversible method treats a gate's parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyticSupport {
    /// Generator available
    Supported,
    /// Split into supported gates with [`decomposition`] first
    Decomposed,
    /// Only finite differences apply
    Unsupported,
}

fn angles<const N: usize>(op: &Operation) -> Result<[f64; N]> {
    let mut out = [0.0; N];
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = op.scalar(i).ok_or_else(|| GateError::NonScalarParameter {
            gate: op.name().to_string(),
        })?;
    }
    Ok(out)
}

/// Unitary of `op` in row-major order, `wires[0]` most significant
///
/// # Errors
/// Returns [`GateError::NoMatrix`] for state preparations.
pub fn matrix(op: &Operation) -> Result<Vec<Complex64>> {
    let dense = match op.kind() {
        GateKind::Identity => to_dense(&matrices::IDENTITY),
        GateKind::Hadamard => to_dense(&matrices::HADAMARD),
        GateKind::PauliX => to_dense(&matrices::PAULI_X),
        GateKind::PauliY => to_dense(&matrices::PAULI_Y),
        GateKind::PauliZ => to_dense(&matrices::PAULI_Z),
        GateKind::S => to_dense(&matrices::S_GATE),
        GateKind::Sdg => to_dense(&matrices::S_GATE_DAGGER),
        GateKind::T => to_dense(&matrices::T_GATE),
        GateKind::Tdg => to_dense(&matrices::T_GATE_DAGGER),
        GateKind::SX => to_dense(&matrices::SX_GATE),
        GateKind::SXdg => to_dense(&matrices::SX_GATE_DAGGER),
        GateKind::CNOT => to_dense(&matrices::CNOT),
        GateKind::CZ => to_dense(&matrices::CZ),
        GateKind::SWAP => to_dense(&matrices::SWAP),
        GateKind::RX => to_dense(&matrices::rotation_x(angles::<1>(op)?[0])),
        GateKind::RY => to_dense(&matrices::rotation_y(angles::<1>(op)?[0])),
        GateKind::RZ => to_dense(&matrices::rotation_z(angles::<1>(op)?[0])),
        GateKind::PhaseShift => to_dense(&matrices::phase(angles::<1>(op)?[0])),
        GateKind::U1 => to_dense(&matrices::u1(angles::<1>(op)?[0])),
        GateKind::U2 => {
            let [phi, lambda] = angles::<2>(op)?;
            to_dense(&matrices::u2(phi, lambda))
        }
        GateKind::U3 => {
            let [theta, phi, lambda] = angles::<3>(op)?;
            to_dense(&matrices::u3(theta, phi, lambda))
        }
        GateKind::Rot => {
            let [phi, theta, omega] = angles::<3>(op)?;
            to_dense(&matrices::rot(phi, theta, omega))
        }
        GateKind::CRX => {
            to_dense(&matrices::controlled(&matrices::rotation_x(angles::<1>(op)?[0])))
        }
        GateKind::CRY => {
            to_dense(&matrices::controlled(&matrices::rotation_y(angles::<1>(op)?[0])))
        }
        GateKind::CRZ => {
            to_dense(&matrices::controlled(&matrices::rotation_z(angles::<1>(op)?[0])))
        }
        GateKind::CRot => {
            let [phi, theta, omega] = angles::<3>(op)?;
            to_dense(&matrices::controlled(&matrices::rot(phi, theta, omega)))
        }
        GateKind::QubitStateVector | GateKind::BasisState => {
            return Err(GateError::NoMatrix {
                gate: op.name().to_string(),
            })
        }
    };
    Ok(dense)
}

/// Generator of a one-parameter gate family, if it has one
pub fn generator(kind: GateKind) -> Option<Generator> {
    let controlled = |p: &[[Complex64; 2]; 2]| {
        matrices::kron(&to_dense(&matrices::PROJECTOR_ONE), 2, &to_dense(p), 2)
    };
    let (matrix, coefficient) = match kind {
        GateKind::RX => (to_dense(&matrices::PAULI_X), -0.5),
        GateKind::RY => (to_dense(&matrices::PAULI_Y), -0.5),
        GateKind::RZ => (to_dense(&matrices::PAULI_Z), -0.5),
        GateKind::PhaseShift | GateKind::U1 => (to_dense(&matrices::PROJECTOR_ONE), 1.0),
        GateKind::CRX => (controlled(&matrices::PAULI_X), -0.5),
        GateKind::CRY => (controlled(&matrices::PAULI_Y), -0.5),
        GateKind::CRZ => (controlled(&matrices::PAULI_Z), -0.5),
        _ => return None,
    };
    Some(Generator {
        matrix,
        coefficient,
    })
}

/// Reversible-method treatment of `kind`
///
/// Gates without parameters report `Supported`: undoing them needs only
/// their inverse.
pub fn analytic_support(kind: GateKind) -> AnalyticSupport {
    match kind {
        GateKind::Rot => AnalyticSupport::Decomposed,
        GateKind::CRX
        | GateKind::CRY
        | GateKind::CRZ
        | GateKind::CRot
        | GateKind::PhaseShift
        | GateKind::U1
        | GateKind::U2
        | GateKind::U3
        | GateKind::QubitStateVector
        | GateKind::BasisState => AnalyticSupport::Unsupported,
        _ => AnalyticSupport::Supported,
    }
}

fn with_kind(kind: GateKind, params: Vec<Param>, op: &Operation) -> Result<Operation> {
    Ok(Operation::new(kind, params, op.wires())?)
}

/// Closed-form inverse of `op`
///
/// # Errors
/// Returns [`GateError::NoInverse`] for state preparations.
pub fn inverse(op: &Operation) -> Result<Operation> {
    let kind = op.kind();
    if kind.is_self_inverse() {
        return Ok(op.clone());
    }
    match kind {
        GateKind::S => with_kind(GateKind::Sdg, vec![], op),
        GateKind::Sdg => with_kind(GateKind::S, vec![], op),
        GateKind::T => with_kind(GateKind::Tdg, vec![], op),
        GateKind::Tdg => with_kind(GateKind::T, vec![], op),
        GateKind::SX => with_kind(GateKind::SXdg, vec![], op),
        GateKind::SXdg => with_kind(GateKind::SX, vec![], op),
        GateKind::RX
        | GateKind::RY
        | GateKind::RZ
        | GateKind::PhaseShift
        | GateKind::U1
        | GateKind::CRX
        | GateKind::CRY
        | GateKind::CRZ => {
            let [theta] = angles::<1>(op)?;
            Ok(op.with_scalars(&[-theta])?)
        }
        GateKind::Rot | GateKind::CRot => {
            let [phi, theta, omega] = angles::<3>(op)?;
            Ok(op.with_scalars(&[-omega, -theta, -phi])?)
        }
        GateKind::U2 => {
            let [phi, lambda] = angles::<2>(op)?;
            let params = [-FRAC_PI_2, -lambda, -phi].map(Param::fixed);
            with_kind(GateKind::U3, params.to_vec(), op)
        }
        GateKind::U3 => {
            let [theta, phi, lambda] = angles::<3>(op)?;
            Ok(op.with_scalars(&[-theta, -lambda, -phi])?)
        }
        _ => Err(GateError::NoInverse {
            gate: op.name().to_string(),
        }),
    }
}

/// Split `op` into gates the reversible method differentiates directly
///
/// `Rot(φ,θ,ω)` becomes `RZ(φ) → RY(θ) → RZ(ω)` in application order, each
/// carrying the matching parameter. Other gates return `None`.
pub fn decomposition(op: &Operation) -> Option<Vec<Operation>> {
    if op.kind() != GateKind::Rot {
        return None;
    }
    let params = op.params();
    let wires = op.wires();
    [GateKind::RZ, GateKind::RY, GateKind::RZ]
        .into_iter()
        .zip(params.iter().cloned())
        .map(|(kind, param)| Operation::new(kind, vec![param], wires).ok())
        .collect()
}

/// Dense matrix of `obs` over `obs.wires()`, first wire most significant
pub fn observable_matrix(obs: &Observable) -> Vec<Complex64> {
    match obs {
        Observable::Identity(_) => to_dense(&matrices::IDENTITY),
        Observable::PauliX(_) => to_dense(&matrices::PAULI_X),
        Observable::PauliY(_) => to_dense(&matrices::PAULI_Y),
        Observable::PauliZ(_) => to_dense(&matrices::PAULI_Z),
        Observable::Hadamard(_) => to_dense(&matrices::HADAMARD),
        Observable::Hermitian { matrix, .. } => matrix.clone(),
        Observable::Tensor(factors) => {
            let mut acc = vec![matrices::ONE];
            let mut dim = 1;
            for factor in factors {
                let fdim = 1usize << factor.wires().len();
                acc = matrices::kron(&acc, dim, &observable_matrix(factor), fdim);
                dim *= fdim;
            }
            acc
        }
    }
}

/// Gates rotating the eigenbasis of a Pauli-type `obs` onto the computational basis
///
/// # Errors
/// Returns [`GateError::NotDiagonalizable`] for Hermitian factors.
pub fn diagonalizing_gates(obs: &Observable) -> Result<Vec<Operation>> {
    let gates = match obs {
        Observable::Identity(_) | Observable::PauliZ(_) => vec![],
        Observable::PauliX(w) => vec![Operation::hadamard(*w)],
        Observable::PauliY(w) => vec![
            Operation::new(GateKind::Sdg, vec![], &[*w])?,
            Operation::hadamard(*w),
        ],
        Observable::Hadamard(w) => vec![Operation::ry(-std::f64::consts::FRAC_PI_4, *w)],
        Observable::Hermitian { .. } => {
            return Err(GateError::NotDiagonalizable(obs.to_string()))
        }
        Observable::Tensor(factors) => {
            let mut gates = Vec::new();
            for factor in factors {
                gates.extend(diagonalizing_gates(factor)?);
            }
            gates
        }
    };
    Ok(gates)
}
