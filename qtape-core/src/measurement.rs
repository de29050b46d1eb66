//! Terminal measurements and their results

use crate::{queuing, Observable, Wire};
use std::fmt;

/// Kind of readout a measurement requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ReturnType {
    Expectation,
    Variance,
    Probability,
    Sample,
}

impl fmt::Display for ReturnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReturnType::Expectation => "Expectation",
            ReturnType::Variance => "Variance",
            ReturnType::Probability => "Probability",
            ReturnType::Sample => "Sample",
        };
        f.write_str(name)
    }
}

/// A terminal readout request
///
/// Built with [`expval`], [`var`], [`sample`] or [`probs`]; call
/// [`Measurement::queue`] to add it to the active recording.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Measurement {
    return_type: ReturnType,
    observable: Option<Observable>,
    wires: Vec<Wire>,
}

impl Measurement {
    #[inline]
    pub fn return_type(&self) -> ReturnType {
        self.return_type
    }

    /// Measured observable; `None` for probabilities
    #[inline]
    pub fn observable(&self) -> Option<&Observable> {
        self.observable.as_ref()
    }

    #[inline]
    pub fn wires(&self) -> &[Wire] {
        &self.wires
    }

    /// Number of real numbers this measurement contributes to a flattened
    /// result, or `None` for samples whose size depends on the shot count
    pub fn output_dim(&self) -> Option<usize> {
        match self.return_type {
            ReturnType::Expectation | ReturnType::Variance => Some(1),
            ReturnType::Probability => Some(1usize << self.wires.len()),
            ReturnType::Sample => None,
        }
    }

    /// Append this measurement to the active recording, if any
    pub fn queue(self) {
        queuing::push_measurement(self);
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.return_type {
            ReturnType::Expectation => "expval",
            ReturnType::Variance => "var",
            ReturnType::Probability => "probs",
            ReturnType::Sample => "sample",
        };
        match &self.observable {
            Some(obs) => write!(f, "{}({})", tag, obs),
            None => {
                write!(f, "{}(", tag)?;
                for (i, w) in self.wires.iter().enumerate() {
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

fn with_observable(return_type: ReturnType, observable: Observable) -> Measurement {
    let wires = observable.wires();
    Measurement {
        return_type,
        observable: Some(observable),
        wires,
    }
}

/// Expectation value of `observable`
pub fn expval(observable: Observable) -> Measurement {
    with_observable(ReturnType::Expectation, observable)
}

/// Variance of `observable`
pub fn var(observable: Observable) -> Measurement {
    with_observable(ReturnType::Variance, observable)
}

/// Per-shot eigenvalue samples of `observable`
pub fn sample(observable: Observable) -> Measurement {
    with_observable(ReturnType::Sample, observable)
}

/// Computational-basis probabilities over `wires`, `wires[0]` most significant
pub fn probs<W: Into<Wire> + Copy>(wires: &[W]) -> Measurement {
    Measurement {
        return_type: ReturnType::Probability,
        observable: None,
        wires: wires.iter().map(|&w| w.into()).collect(),
    }
}

/// Result of one measurement, in queued order
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MeasurementResult {
    /// Expectation value or variance
    Scalar(f64),
    /// Probability of each basis state of the measured wires
    Probabilities(Vec<f64>),
    /// Eigenvalue observed in each shot
    Samples(Vec<f64>),
}

impl MeasurementResult {
    /// Scalar value, if this is an expectation or variance
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            MeasurementResult::Scalar(v) => Some(*v),
            _ => None,
        }
    }

    /// All contained values as a slice
    pub fn values(&self) -> &[f64] {
        match self {
            MeasurementResult::Scalar(v) => std::slice::from_ref(v),
            MeasurementResult::Probabilities(v) | MeasurementResult::Samples(v) => v,
        }
    }
}

/// Concatenate results into one real vector
pub fn flatten_results(results: &[MeasurementResult]) -> Vec<f64> {
    results
        .iter()
        .flat_map(|r| r.values().iter().copied())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expval_takes_observable_wires() {
        let m = expval(Observable::pauli_z(3));
        assert_eq!(m.return_type(), ReturnType::Expectation);
        assert_eq!(m.wires(), &[Wire::new(3)]);
        assert_eq!(m.output_dim(), Some(1));
    }

    #[test]
    fn test_probs_output_dim() {
        let m = probs(&[0usize, 1]);
        assert!(m.observable().is_none());
        assert_eq!(m.output_dim(), Some(4));
        assert_eq!(format!("{}", m), "probs(w0, w1)");
    }

    #[test]
    fn test_sample_has_no_fixed_dim() {
        assert_eq!(sample(Observable::pauli_x(0)).output_dim(), None);
    }

    #[test]
    fn test_flatten_results() {
        let results = vec![
            MeasurementResult::Scalar(0.5),
            MeasurementResult::Probabilities(vec![0.25, 0.75]),
        ];
        assert_eq!(flatten_results(&results), vec![0.5, 0.25, 0.75]);
        assert_eq!(results[0].as_scalar(), Some(0.5));
        assert_eq!(results[1].as_scalar(), None);
    }
}
