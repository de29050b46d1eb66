//! Jacobians of tape outputs with respect to trainable parameters
//!
//! Each trainable parameter gets one column, resolved to a method first:
//! - Reversible (adjoint) sweep for parameters with a known generator
//! - Finite differences for everything else, or on request
//! - A zero column for parameters that cannot be differentiated
//!
//! All analytic columns share a single forward execution.

pub mod numeric;
pub mod reversible;

pub use numeric::{FiniteDifferenceOrder, NumericOptions};
pub use reversible::matrix_elem;

use crate::error::{GradientError, Result};
use qtape_core::{Device, GradMethod, ReturnType, Tape};
use std::fmt;
use std::ops::{Index, IndexMut};

/// How Jacobian columns are computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JacobianMethod {
    /// Finite differences for every column
    Numeric,
    /// Reversible sweep for every column; parameters that only support
    /// finite differences are an error
    Analytic,
    /// Reversible sweep where available, finite differences otherwise
    #[default]
    Best,
}

/// Configuration for [`Differentiable::jacobian`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JacobianOptions {
    pub method: JacobianMethod,
    /// Used by every numeric column
    pub numeric: NumericOptions,
}

impl JacobianOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Finite differences only
    pub fn numeric() -> Self {
        Self::default().with_method(JacobianMethod::Numeric)
    }

    /// Reversible sweep only
    pub fn analytic() -> Self {
        Self::default().with_method(JacobianMethod::Analytic)
    }

    pub fn with_method(mut self, method: JacobianMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_step(mut self, step: f64) -> Self {
        self.numeric.step = step;
        self
    }

    pub fn with_order(mut self, order: FiniteDifferenceOrder) -> Self {
        self.numeric.order = order;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.numeric.validate().map_err(GradientError::InvalidConfig)
    }
}

/// Row-major matrix of partial derivatives
///
/// Rows follow the flattened tape outputs, columns the trainable parameters
/// in ascending flat-index order.
#[derive(Debug, Clone, PartialEq)]
pub struct Jacobian {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Jacobian {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        (row < self.rows && col < self.cols).then(|| self.data[row * self.cols + col])
    }

    /// Derivatives of one output
    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    /// Derivatives with respect to one trainable parameter
    pub fn column(&self, col: usize) -> Vec<f64> {
        (0..self.rows).map(|row| self[(row, col)]).collect()
    }

    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }
}

impl Index<(usize, usize)> for Jacobian {
    type Output = f64;

    fn index(&self, (row, col): (usize, usize)) -> &f64 {
        assert!(col < self.cols, "column {} out of range for {} columns", col, self.cols);
        &self.data[row * self.cols + col]
    }
}

impl IndexMut<(usize, usize)> for Jacobian {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut f64 {
        assert!(col < self.cols, "column {} out of range for {} columns", col, self.cols);
        &mut self.data[row * self.cols + col]
    }
}

impl fmt::Display for Jacobian {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.rows {
            let cells: Vec<String> = self.row(row).iter().map(|v| format!("{:.6}", v)).collect();
            writeln!(f, "[{}]", cells.join(", "))?;
        }
        Ok(())
    }
}

/// Objects whose outputs can be differentiated on a device
pub trait Differentiable {
    /// Jacobian of the flattened outputs with respect to the trainable
    /// parameters
    ///
    /// # Errors
    /// Returns [`GradientError`] for invalid options, sampled outputs,
    /// analytic columns the reversible sweep cannot handle, or device failures.
    fn jacobian(&mut self, device: &mut dyn Device, options: &JacobianOptions) -> Result<Jacobian>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Zero,
    Numeric,
    Analytic,
}

fn resolve(tape: &Tape, index: usize, method: JacobianMethod) -> Result<Column> {
    let info = tape.par_info()[index];
    match (info.grad_method, method) {
        (None, _) => Ok(Column::Zero),
        (Some(GradMethod::Analytic), JacobianMethod::Numeric) => Ok(Column::Numeric),
        (Some(GradMethod::Analytic), _) => Ok(Column::Analytic),
        (Some(GradMethod::Numeric), JacobianMethod::Analytic) => {
            Err(GradientError::AnalyticUnavailable {
                index,
                gate: tape.operations()[info.op_index].name().to_string(),
            })
        }
        (Some(GradMethod::Numeric), _) => Ok(Column::Numeric),
    }
}

impl Differentiable for Tape {
    /// # Example
    /// ```
    /// use qtape_core::{expval, Observable, Operation, Tape};
    /// use qtape_sim::{DefaultQubit, Differentiable, JacobianOptions};
    ///
    /// let mut tape = Tape::new(
    ///     vec![Operation::ry(1.623, 0)],
    ///     vec![expval(Observable::pauli_x(0))],
    /// );
    /// let mut dev = DefaultQubit::new(1).unwrap();
    /// let jac = tape.jacobian(&mut dev, &JacobianOptions::default()).unwrap();
    /// assert!((jac[(0, 0)] - 1.623f64.cos()).abs() < 1e-10);
    /// ```
    #[tracing::instrument(skip_all, fields(device = device.name(), method = ?options.method))]
    fn jacobian(&mut self, device: &mut dyn Device, options: &JacobianOptions) -> Result<Jacobian> {
        options.validate()?;

        let trainable: Vec<usize> = self.trainable_params().iter().copied().collect();
        let mut numeric_cols = Vec::new();
        let mut analytic_cols = Vec::new();
        for (col, &index) in trainable.iter().enumerate() {
            match resolve(self, index, options.method)? {
                Column::Zero => {}
                Column::Numeric => numeric_cols.push((col, index)),
                Column::Analytic => analytic_cols.push((col, index)),
            }
        }

        if !analytic_cols.is_empty() {
            let indices: Vec<usize> = analytic_cols.iter().map(|&(_, index)| index).collect();
            reversible::check_preconditions(self, &indices)?;
        }
        let has_sample = self
            .measurements()
            .iter()
            .any(|m| m.return_type() == ReturnType::Sample);
        let rows = match self.output_dim() {
            Some(rows) if !has_sample => rows,
            _ => return Err(GradientError::SampleNotDifferentiable),
        };

        tracing::debug!(
            rows,
            cols = trainable.len(),
            numeric = numeric_cols.len(),
            analytic = analytic_cols.len(),
            "computing jacobian"
        );

        let mut jac = Jacobian::zeros(rows, trainable.len());
        numeric::fill_columns(self, device, &numeric_cols, &options.numeric, &mut jac)?;
        reversible::fill_columns(self, device, &analytic_cols, &mut jac)?;
        Ok(jac)
    }
}
