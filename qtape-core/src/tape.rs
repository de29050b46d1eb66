//! Recorded, replayable quantum tapes
//!
//! A [`Tape`] owns the operations and measurements queued during a recording
//! and keeps a flat index over every gate parameter. Indices count parameters
//! in operation order, then position within the operation; the trainable set
//! is a subset of those indices.

use crate::queuing::RecordingGuard;
use crate::{
    Device, GradMethod, Measurement, MeasurementResult, Operation, ParamValue, Result, TapeError,
    Wire,
};
use std::cell::OnceCell;
use std::collections::BTreeSet;
use std::fmt;
use std::ops::Deref;

/// Location and differentiation method of one flat-indexed parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamInfo {
    /// Index of the owning operation
    pub op_index: usize,
    /// Position of the parameter within that operation
    pub param_index: usize,
    /// Method the Jacobian will use; `None` if the parameter is not trainable
    /// or cannot be differentiated at all
    pub grad_method: Option<GradMethod>,
}

/// An ordered record of operations and terminal measurements
///
/// # Example
/// ```
/// use qtape_core::{expval, Observable, Operation, Param, Tape};
///
/// let mut tape = Tape::record(|| {
///     Operation::rx(Param::fixed(0.31), 0).queue();
///     Operation::ry(0.5, 0).queue();
///     Operation::rz(0.1, 0).queue();
///     expval(Observable::pauli_z(0)).queue();
/// })
/// .unwrap();
///
/// assert_eq!(tape.num_params(), 3);
/// assert_eq!(tape.trainable_params().iter().copied().collect::<Vec<_>>(), vec![1, 2]);
///
/// tape.set_trainable_params([0, 2]).unwrap();
/// assert_eq!(tape.num_trainable(), 2);
/// assert!(tape.set_trainable_params([3]).is_err());
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tape {
    operations: Vec<Operation>,
    measurements: Vec<Measurement>,
    trainable: BTreeSet<usize>,
    #[cfg_attr(feature = "serde", serde(skip))]
    par_info: OnceCell<Vec<ParamInfo>>,
}

impl Tape {
    /// Build a tape directly from its parts
    ///
    /// Every scalar parameter with `requires_grad` set starts out trainable.
    pub fn new(operations: Vec<Operation>, measurements: Vec<Measurement>) -> Self {
        let mut trainable = BTreeSet::new();
        let mut index = 0;
        for op in &operations {
            for param in op.params() {
                if param.is_numeric() && param.requires_grad() {
                    trainable.insert(index);
                }
                index += 1;
            }
        }

        let tape = Self {
            operations,
            measurements,
            trainable,
            par_info: OnceCell::new(),
        };
        tracing::debug!(
            operations = tape.operations.len(),
            measurements = tape.measurements.len(),
            params = tape.num_params(),
            trainable = tape.trainable.len(),
            "tape finalized"
        );
        tape
    }

    /// Record every operation and measurement queued while `f` runs
    ///
    /// The recording context is cleared when this returns, also if `f`
    /// panics.
    ///
    /// # Errors
    /// Returns [`TapeError::NestedRecording`] if a recording is already
    /// active on this thread.
    pub fn record<F: FnOnce()>(f: F) -> Result<Self> {
        let guard = RecordingGuard::begin()?;
        f();
        let recorded = guard.finish();
        Ok(Self::new(recorded.operations, recorded.measurements))
    }

    #[inline]
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    #[inline]
    pub fn measurements(&self) -> &[Measurement] {
        &self.measurements
    }

    /// Flat parameter table, one entry per parameter of every operation
    pub fn par_info(&self) -> &[ParamInfo] {
        self.par_info.get_or_init(|| {
            let mut info = Vec::new();
            for (op_index, op) in self.operations.iter().enumerate() {
                for (param_index, param) in op.params().iter().enumerate() {
                    let grad_method = if param.is_numeric()
                        && self.trainable.contains(&info.len())
                    {
                        op.kind().grad_method()
                    } else {
                        None
                    };
                    info.push(ParamInfo {
                        op_index,
                        param_index,
                        grad_method,
                    });
                }
            }
            info
        })
    }

    /// Total number of gate parameters, trainable or not
    pub fn num_params(&self) -> usize {
        self.operations.iter().map(Operation::num_params).sum()
    }

    #[inline]
    pub fn trainable_params(&self) -> &BTreeSet<usize> {
        &self.trainable
    }

    #[inline]
    pub fn num_trainable(&self) -> usize {
        self.trainable.len()
    }

    /// Replace the trainable set
    ///
    /// # Errors
    /// Returns [`TapeError::TrainableIndexOutOfRange`] for any index that
    /// does not name a parameter and [`TapeError::NonScalarParameter`] for an
    /// array-valued one. The set is left unchanged in both cases.
    pub fn set_trainable_params<I>(&mut self, indices: I) -> Result<()>
    where
        I: IntoIterator<Item = usize>,
    {
        let trainable: BTreeSet<usize> = indices.into_iter().collect();
        let updates: Vec<(usize, f64)> = trainable.iter().map(|&i| (i, 0.0)).collect();
        self.check_scalar_updates(&updates)?;
        self.trainable = trainable;
        self.par_info.take();
        Ok(())
    }

    /// Method the Jacobian uses for flat parameter `index`
    pub fn grad_method(&self, index: usize) -> Option<GradMethod> {
        self.par_info().get(index).and_then(|info| info.grad_method)
    }

    /// Current parameter values in flat order
    pub fn get_parameters(&self, trainable_only: bool) -> Vec<ParamValue> {
        let mut values = Vec::new();
        let mut index = 0;
        for op in &self.operations {
            for param in op.params() {
                if !trainable_only || self.trainable.contains(&index) {
                    values.push(param.value().clone());
                }
                index += 1;
            }
        }
        values
    }

    /// Permanently overwrite scalar parameters
    ///
    /// With `trainable_only`, `values` maps onto the trainable set in
    /// ascending index order; otherwise onto every parameter.
    ///
    /// # Errors
    /// Returns error on a length mismatch or when a targeted parameter is
    /// array-valued. Nothing is written on error.
    pub fn set_parameters(&mut self, values: &[f64], trainable_only: bool) -> Result<()> {
        let indices: Vec<usize> = if trainable_only {
            self.trainable.iter().copied().collect()
        } else {
            (0..self.num_params()).collect()
        };
        if values.len() != indices.len() {
            return Err(TapeError::ParameterCountMismatch {
                expected: indices.len(),
                actual: values.len(),
            });
        }
        let updates: Vec<(usize, f64)> = indices.into_iter().zip(values.iter().copied()).collect();
        self.check_scalar_updates(&updates)?;
        for &(index, value) in &updates {
            self.write_scalar(index, value);
        }
        Ok(())
    }

    /// Temporarily substitute scalar parameters by flat index
    ///
    /// The returned guard dereferences to the tape; the previous values come
    /// back when it is dropped, whatever happens in between.
    ///
    /// # Errors
    /// Returns error if an index is out of range or array-valued. Nothing is
    /// written on error.
    pub fn substitute(&mut self, updates: &[(usize, f64)]) -> Result<ParameterOverride<'_>> {
        self.check_scalar_updates(updates)?;
        let mut saved = Vec::with_capacity(updates.len());
        for &(index, value) in updates {
            let info = self.par_info()[index];
            if let Some(old) = self.operations[info.op_index].scalar(info.param_index) {
                saved.push((index, old));
            }
            self.write_scalar(index, value);
        }
        Ok(ParameterOverride { tape: self, saved })
    }

    /// Execute on `device`, optionally overriding the trainable parameters
    ///
    /// Overrides map onto the trainable set in ascending index order and are
    /// undone before this returns, on success and on failure.
    ///
    /// # Errors
    /// Returns [`TapeError::ParameterCountMismatch`] if the override length
    /// differs from the number of trainable parameters, or the device error.
    pub fn execute(
        &mut self,
        device: &mut dyn Device,
        params: Option<&[f64]>,
    ) -> Result<Vec<MeasurementResult>> {
        let Some(values) = params else {
            return self.execute_device(device);
        };
        if values.len() != self.trainable.len() {
            return Err(TapeError::ParameterCountMismatch {
                expected: self.trainable.len(),
                actual: values.len(),
            });
        }
        let updates: Vec<(usize, f64)> = self
            .trainable
            .iter()
            .copied()
            .zip(values.iter().copied())
            .collect();
        let tape = self.substitute(&updates)?;
        tape.execute_device(device)
    }

    /// Run the tape as currently stored
    ///
    /// Every device execution goes through here.
    pub fn execute_device(&self, device: &mut dyn Device) -> Result<Vec<MeasurementResult>> {
        tracing::debug!(
            device = device.name(),
            operations = self.operations.len(),
            measurements = self.measurements.len(),
            "executing tape"
        );
        let results = device.execute(&self.operations, &self.measurements)?;
        if results.len() != self.measurements.len() {
            return Err(crate::DeviceError::Simulation(format!(
                "device '{}' returned {} results for {} measurements",
                device.name(),
                results.len(),
                self.measurements.len()
            ))
            .into());
        }
        Ok(results)
    }

    /// Distinct wires touched by operations or measurements, ascending
    pub fn wires(&self) -> Vec<Wire> {
        let wires: BTreeSet<Wire> = self
            .operations
            .iter()
            .flat_map(|op| op.wires().iter().copied())
            .chain(
                self.measurements
                    .iter()
                    .flat_map(|m| m.wires().iter().copied()),
            )
            .collect();
        wires.into_iter().collect()
    }

    pub fn num_wires(&self) -> usize {
        self.wires().len()
    }

    /// Length of the flattened result vector, `None` if any measurement
    /// samples
    pub fn output_dim(&self) -> Option<usize> {
        self.measurements.iter().map(Measurement::output_dim).sum()
    }

    fn check_scalar_updates(&self, updates: &[(usize, f64)]) -> Result<()> {
        let num_params = self.num_params();
        for &(index, _) in updates {
            let Some(info) = self.par_info().get(index) else {
                return Err(TapeError::TrainableIndexOutOfRange { index, num_params });
            };
            if self.operations[info.op_index]
                .scalar(info.param_index)
                .is_none()
            {
                return Err(TapeError::NonScalarParameter { index });
            }
        }
        Ok(())
    }

    fn write_scalar(&mut self, index: usize, value: f64) -> bool {
        let info = self.par_info()[index];
        self.operations[info.op_index].set_scalar(info.param_index, value)
    }
}

impl fmt::Display for Tape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Tape: {} operations, {} measurements, {} parameters ({} trainable)",
            self.operations.len(),
            self.measurements.len(),
            self.num_params(),
            self.trainable.len()
        )?;
        for op in &self.operations {
            writeln!(f, "  {}", op)?;
        }
        for m in &self.measurements {
            writeln!(f, "  {}", m)?;
        }
        Ok(())
    }
}

/// Scoped parameter substitution on a [`Tape`]
///
/// Created by [`Tape::substitute`]. Restores the substituted values on drop.
#[derive(Debug)]
pub struct ParameterOverride<'a> {
    tape: &'a mut Tape,
    saved: Vec<(usize, f64)>,
}

impl Deref for ParameterOverride<'_> {
    type Target = Tape;

    fn deref(&self) -> &Tape {
        self.tape
    }
}

impl Drop for ParameterOverride<'_> {
    fn drop(&mut self) {
        // reverse order so a repeated index ends at its first saved value
        for (index, value) in self.saved.drain(..).rev() {
            self.tape.write_scalar(index, value);
        }
    }
}
