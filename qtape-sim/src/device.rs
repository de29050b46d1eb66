//! Reference state-vector device

use crate::config::DeviceConfig;
use num_complex::Complex64;
use qtape_core::{
    Device, DeviceError, Measurement, MeasurementResult, Observable, Operation, ReturnType,
};
use qtape_state::dense_state::pick;
use qtape_state::{DenseState, StateError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Dense state-vector simulator implementing the [`Device`] contract
///
/// Every call to [`Device::execute`] starts from |0...0⟩, applies the
/// operations in order and evaluates each measurement on the final state,
/// which stays readable through [`Device::state`] until the next call.
///
/// # Example
///
/// ```
/// use qtape_core::{expval, Device, Observable, Operation};
/// use qtape_sim::DefaultQubit;
///
/// let mut dev = DefaultQubit::new(1).unwrap();
/// let results = dev
///     .execute(&[Operation::rx(0.3, 0)], &[expval(Observable::pauli_z(0))])
///     .unwrap();
/// assert!((results[0].as_scalar().unwrap() - 0.3f64.cos()).abs() < 1e-12);
/// ```
#[derive(Debug)]
pub struct DefaultQubit {
    num_wires: usize,
    config: DeviceConfig,
    state: DenseState,
    rng: StdRng,
    executions: usize,
}

impl DefaultQubit {
    pub const NAME: &'static str = "default.qubit";

    /// Analytic device over `num_wires` wires
    pub fn new(num_wires: usize) -> Result<Self, DeviceError> {
        Self::with_config(num_wires, DeviceConfig::default())
    }

    /// Device with explicit shots and seed
    ///
    /// # Errors
    /// Returns [`DeviceError::InvalidConfig`] if the configuration does not
    /// validate or the wire count is too large to simulate.
    pub fn with_config(num_wires: usize, config: DeviceConfig) -> Result<Self, DeviceError> {
        config.validate().map_err(DeviceError::InvalidConfig)?;
        let state =
            DenseState::new(num_wires).map_err(|e| DeviceError::InvalidConfig(e.to_string()))?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            num_wires,
            config,
            state,
            rng,
            executions: 0,
        })
    }

    #[inline]
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Number of completed calls to [`Device::execute`]
    #[inline]
    pub fn executions(&self) -> usize {
        self.executions
    }

    fn check_wires(&self, wires: impl IntoIterator<Item = usize>) -> Result<(), DeviceError> {
        for wire in wires {
            if wire >= self.num_wires {
                return Err(DeviceError::invalid_wire(Self::NAME, wire, self.num_wires));
            }
        }
        Ok(())
    }

    fn apply(&mut self, index: usize, op: &Operation) -> Result<(), DeviceError> {
        if op.kind().is_state_preparation() && index > 0 {
            return Err(DeviceError::StatePreparation {
                gate: op.name().to_string(),
                reason: format!("it must be the first operation, found at position {}", index),
            });
        }
        tracing::trace!(index, op = %op, "applying operation");
        self.state.apply_operation(op).map_err(|e| {
            if op.kind().is_state_preparation() {
                DeviceError::StatePreparation {
                    gate: op.name().to_string(),
                    reason: e.to_string(),
                }
            } else {
                simulation_error(e)
            }
        })
    }

    fn measure(&mut self, m: &Measurement) -> Result<MeasurementResult, DeviceError> {
        let shots = self.config.shots;
        let wires: Vec<usize> = m.wires().iter().map(|w| w.index()).collect();
        match (m.return_type(), m.observable()) {
            (ReturnType::Probability, _) => {
                let exact = self
                    .state
                    .marginal_probabilities(&wires)
                    .map_err(simulation_error)?;
                let probabilities = match shots {
                    None => exact,
                    Some(shots) => {
                        let mut counts = vec![0.0; exact.len()];
                        for _ in 0..shots {
                            counts[pick(&exact, self.rng.gen::<f64>())] += 1.0;
                        }
                        counts.iter().map(|c| c / shots as f64).collect()
                    }
                };
                Ok(MeasurementResult::Probabilities(probabilities))
            }
            (ReturnType::Sample, Some(obs)) => {
                let shots = shots.ok_or_else(|| {
                    DeviceError::InvalidConfig(
                        "sample measurements require a shot count".to_string(),
                    )
                })?;
                Ok(MeasurementResult::Samples(self.sample(obs, ReturnType::Sample, shots)?))
            }
            (ReturnType::Expectation, Some(obs)) => {
                let value = match shots {
                    Some(shots) if obs.is_pauli_type() => {
                        let samples = self.sample(obs, ReturnType::Expectation, shots)?;
                        samples.iter().sum::<f64>() / shots as f64
                    }
                    _ => self.state.expectation(obs).map_err(simulation_error)?,
                };
                Ok(MeasurementResult::Scalar(value))
            }
            (ReturnType::Variance, Some(obs)) => {
                let value = match shots {
                    Some(shots) if obs.is_pauli_type() => {
                        let samples = self.sample(obs, ReturnType::Variance, shots)?;
                        let mean = samples.iter().sum::<f64>() / shots as f64;
                        let second = samples.iter().map(|s| s * s).sum::<f64>() / shots as f64;
                        second - mean * mean
                    }
                    _ => self.state.variance(obs).map_err(simulation_error)?,
                };
                Ok(MeasurementResult::Scalar(value))
            }
            (return_type, None) => Err(DeviceError::Simulation(format!(
                "{} measurement without an observable",
                return_type
            ))),
        }
    }

    /// Eigenvalue of `obs` observed in each of `shots` draws
    fn sample(
        &mut self,
        obs: &Observable,
        return_type: ReturnType,
        shots: usize,
    ) -> Result<Vec<f64>, DeviceError> {
        let unsupported = || DeviceError::UnsupportedObservable {
            observable: obs.to_string(),
            return_type: return_type.to_string(),
        };
        if !obs.is_pauli_type() {
            return Err(unsupported());
        }

        let mut rotated = self.state.clone();
        for gate in qtape_gates::diagonalizing_gates(obs).map_err(|_| unsupported())? {
            rotated.apply_operation(&gate).map_err(simulation_error)?;
        }
        let wires: Vec<usize> = obs.wires().iter().map(|w| w.index()).collect();
        let probabilities = rotated
            .marginal_probabilities(&wires)
            .map_err(simulation_error)?;

        let counted = counted_factors(obs);
        let k = counted.len();
        let eigenvalue = |local: usize| {
            counted
                .iter()
                .enumerate()
                .filter(|&(j, &counts)| counts && (local >> (k - 1 - j)) & 1 == 1)
                .fold(1.0, |acc, _| -acc)
        };
        Ok((0..shots)
            .map(|_| eigenvalue(pick(&probabilities, self.rng.gen::<f64>())))
            .collect())
    }
}

/// Per wire of `obs`, whether its factor flips sign on |1⟩
fn counted_factors(obs: &Observable) -> Vec<bool> {
    match obs {
        Observable::Identity(_) => vec![false],
        Observable::Tensor(factors) => factors.iter().flat_map(counted_factors).collect(),
        _ => vec![true; obs.wires().len()],
    }
}

fn simulation_error(e: StateError) -> DeviceError {
    DeviceError::Simulation(e.to_string())
}

impl Device for DefaultQubit {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn num_wires(&self) -> usize {
        self.num_wires
    }

    fn execute(
        &mut self,
        operations: &[Operation],
        measurements: &[Measurement],
    ) -> Result<Vec<MeasurementResult>, DeviceError> {
        self.check_wires(
            operations
                .iter()
                .flat_map(|op| op.wires().iter().map(|w| w.index())),
        )?;
        self.check_wires(
            measurements
                .iter()
                .flat_map(|m| m.wires().iter().map(|w| w.index())),
        )?;

        tracing::debug!(
            device = Self::NAME,
            operations = operations.len(),
            measurements = measurements.len(),
            shots = ?self.config.shots,
            "executing"
        );

        self.state.reset();
        for (index, op) in operations.iter().enumerate() {
            self.apply(index, op)?;
        }
        let results = measurements
            .iter()
            .map(|m| self.measure(m))
            .collect::<Result<Vec<_>, _>>()?;
        self.executions += 1;
        Ok(results)
    }

    fn state(&self) -> Option<&[Complex64]> {
        Some(self.state.amplitudes())
    }
}
