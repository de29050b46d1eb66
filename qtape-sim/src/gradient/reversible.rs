//! Reversible (adjoint) Jacobian columns
//!
//! One forward execution produces the final state `|ψ⟩`. For every
//! expectation `⟨O⟩` the engine keeps `|bra⟩ = O|ψ⟩` next to `|ket⟩ = |ψ⟩`
//! and walks the operations backwards. At a differentiated gate with
//! generator `G` and coefficient `c` it adds `−2c·Im⟨bra|G|ket⟩` to the
//! matching cell, then undoes the gate on both vectors with its closed-form
//! inverse.

use super::Jacobian;
use crate::error::{GradientError, Result};
use num_complex::Complex64;
use qtape_core::{Device, Observable, Operation, ReturnType, Tape};
use qtape_gates::{analytic_support, decomposition, generator, inverse, AnalyticSupport};
use qtape_state::DenseState;
use std::collections::BTreeMap;

/// `⟨vec1|O|vec2⟩` over an `num_wires`-wire register
///
/// Neither vector needs to be normalized.
///
/// # Example
/// ```
/// use num_complex::Complex64;
/// use qtape_core::Observable;
/// use qtape_sim::matrix_elem;
///
/// let plus = [Complex64::new(1.0, 0.0), Complex64::new(1.0, 0.0)];
/// let i = [Complex64::new(1.0, 0.0), Complex64::new(0.0, 1.0)];
/// let elem = matrix_elem(&plus, &Observable::pauli_z(0), &i, 1).unwrap();
/// assert_eq!(elem, Complex64::new(1.0, -1.0));
/// ```
pub fn matrix_elem(
    vec1: &[Complex64],
    obs: &Observable,
    vec2: &[Complex64],
    num_wires: usize,
) -> Result<Complex64> {
    let bra = DenseState::from_amplitudes(num_wires, vec1)?;
    let mut ket = DenseState::from_amplitudes(num_wires, vec2)?;
    ket.apply_observable(obs)?;
    Ok(bra.inner_product(&ket)?)
}

/// Reject tapes the reversible method cannot handle
///
/// Runs before any execution. Measurements are checked first, so a variance
/// or probability fails the call even when every gate is supported.
pub(crate) fn check_preconditions(tape: &Tape, indices: &[usize]) -> Result<()> {
    for m in tape.measurements() {
        if m.return_type() != ReturnType::Expectation {
            return Err(GradientError::UnsupportedMeasurement {
                kind: m.return_type(),
            });
        }
    }
    for &index in indices {
        let info = tape.par_info()[index];
        let op = &tape.operations()[info.op_index];
        if analytic_support(op.kind()) == AnalyticSupport::Unsupported {
            return Err(GradientError::UnsupportedGate {
                gate: op.name().to_string(),
            });
        }
    }
    Ok(())
}

/// Operation sequence with each differentiated parameter tagged by its column
///
/// `Rot` gates carrying a differentiated angle are replaced by their
/// single-axis factors so every angle has its own generator.
fn expand(tape: &Tape, columns: &[(usize, usize)]) -> Vec<(Operation, Option<usize>)> {
    let column_of: BTreeMap<usize, usize> = columns.iter().map(|&(col, idx)| (idx, col)).collect();
    let mut expanded = Vec::with_capacity(tape.operations().len());
    let mut first = 0;
    for op in tape.operations() {
        let tagged = (0..op.num_params()).any(|p| column_of.contains_key(&(first + p)));
        match decomposition(op).filter(|_| tagged) {
            Some(parts) => {
                for (p, part) in parts.into_iter().enumerate() {
                    expanded.push((part, column_of.get(&(first + p)).copied()));
                }
            }
            None => {
                let own = (op.num_params() > 0)
                    .then(|| column_of.get(&first).copied())
                    .flatten();
                expanded.push((op.clone(), own));
            }
        }
        first += op.num_params();
    }
    expanded
}

fn wire_indices(op: &Operation) -> Vec<usize> {
    op.wires().iter().map(|w| w.index()).collect()
}

/// Fill `(column, flat index)` pairs of `jac` with one device execution
///
/// Callers run [`check_preconditions`] first.
pub(crate) fn fill_columns(
    tape: &Tape,
    device: &mut dyn Device,
    columns: &[(usize, usize)],
    jac: &mut Jacobian,
) -> Result<()> {
    if columns.is_empty() {
        return Ok(());
    }

    tape.execute_device(device)?;
    let state = device.state().ok_or_else(|| GradientError::MissingState {
        device: device.name().to_string(),
    })?;
    let mut ket = DenseState::from_amplitudes(device.num_wires(), state)?;

    let mut bras = Vec::with_capacity(tape.measurements().len());
    for m in tape.measurements() {
        let mut bra = ket.clone();
        if let Some(obs) = m.observable() {
            bra.apply_observable(obs)?;
        }
        bras.push(bra);
    }

    let expanded = expand(tape, columns);
    let Some(earliest) = expanded.iter().position(|(_, col)| col.is_some()) else {
        return Ok(());
    };
    tracing::debug!(
        operations = expanded.len() - earliest,
        measurements = bras.len(),
        "backward sweep"
    );

    for (op, column) in expanded[earliest..].iter().rev() {
        let wires = wire_indices(op);

        if let Some(col) = *column {
            let gen = generator(op.kind()).ok_or_else(|| GradientError::UnsupportedGate {
                gate: op.name().to_string(),
            })?;
            let mut generated = ket.clone();
            generated.apply_matrix(&gen.matrix, &wires)?;
            for (row, bra) in bras.iter().enumerate() {
                let elem = bra.inner_product(&generated)?;
                jac[(row, col)] += -2.0 * gen.coefficient * elem.im;
            }
            tracing::trace!(op = %op, column = col, "accumulated derivative");
        }

        let undo = qtape_gates::matrix(&inverse(op)?)?;
        ket.apply_matrix(&undo, &wires)?;
        for bra in &mut bras {
            bra.apply_matrix(&undo, &wires)?;
        }
        tracing::trace!(op = %op, "undone");
    }
    Ok(())
}
