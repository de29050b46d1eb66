//! Finite difference Jacobian columns
//!
//! Shifts one flat-indexed parameter at a time through the tape's scoped
//! substitution, so the stored values are back in place after every
//! evaluation, also when the device fails.

use super::Jacobian;
use crate::error::{GradientError, Result};
use qtape_core::{flatten_results, Device, Tape, TapeError};

/// Finite difference stencil
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FiniteDifferenceOrder {
    /// Forward difference: f'(x) ≈ [f(x+h) - f(x)] / h
    Forward,
    /// Central difference: f'(x) ≈ [f(x+h) - f(x-h)] / (2h)
    #[default]
    Central,
}

/// Configuration for finite difference columns
#[derive(Debug, Clone, PartialEq)]
pub struct NumericOptions {
    /// Shift size
    pub step: f64,
    /// Stencil to use
    pub order: FiniteDifferenceOrder,
}

impl Default for NumericOptions {
    fn default() -> Self {
        Self {
            step: 1e-7,
            order: FiniteDifferenceOrder::Central,
        }
    }
}

impl NumericOptions {
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !(self.step.is_finite() && self.step > 0.0) {
            return Err(format!("step must be finite and > 0, got {}", self.step));
        }
        Ok(())
    }
}

fn evaluate(
    tape: &mut Tape,
    device: &mut dyn Device,
    index: usize,
    value: f64,
) -> Result<Vec<f64>> {
    let shifted = tape.substitute(&[(index, value)])?;
    Ok(flatten_results(&shifted.execute_device(device)?))
}

/// Fill `(column, flat index)` pairs of `jac` by finite differences
///
/// Central differences cost two executions per column; forward differences
/// one per column plus one shared unshifted run.
pub(crate) fn fill_columns(
    tape: &mut Tape,
    device: &mut dyn Device,
    columns: &[(usize, usize)],
    options: &NumericOptions,
    jac: &mut Jacobian,
) -> Result<()> {
    if columns.is_empty() {
        return Ok(());
    }
    let h = options.step;

    let base = match options.order {
        FiniteDifferenceOrder::Forward => Some(flatten_results(&tape.execute_device(device)?)),
        FiniteDifferenceOrder::Central => None,
    };

    for &(col, index) in columns {
        let info = tape.par_info()[index];
        let theta = tape.operations()[info.op_index]
            .scalar(info.param_index)
            .ok_or(GradientError::Tape(TapeError::NonScalarParameter { index }))?;

        let plus = evaluate(tape, device, index, theta + h)?;
        let minus;
        let (reference, denominator): (&[f64], f64) = match &base {
            Some(base) => (base, h),
            None => {
                minus = evaluate(tape, device, index, theta - h)?;
                (&minus, 2.0 * h)
            }
        };

        for (row, (p, r)) in plus.iter().zip(reference).enumerate().take(jac.rows()) {
            jac[(row, col)] = (p - r) / denominator;
        }
    }
    Ok(())
}
