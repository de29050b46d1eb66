//! Device execution contract
//!
//! A device evolves a state under a list of operations and evaluates the
//! requested measurements. The tape never owns a device; it is borrowed for
//! each call.

use crate::{DeviceError, Measurement, MeasurementResult, Operation};
use num_complex::Complex64;

/// Simulation backend consumed by [`Tape`](crate::Tape)
pub trait Device {
    /// Short device name (e.g. "default.qubit")
    fn name(&self) -> &str;

    /// Number of wires the device simulates
    fn num_wires(&self) -> usize;

    /// Run `operations` from the initial state and evaluate `measurements`
    ///
    /// Must return exactly one result per measurement, in order.
    fn execute(
        &mut self,
        operations: &[Operation],
        measurements: &[Measurement],
    ) -> Result<Vec<MeasurementResult>, DeviceError>;

    /// Full state vector after the last [`Device::execute`]
    ///
    /// Amplitude `i` belongs to the basis state whose bit `k` is the value of
    /// wire `k`. Devices that cannot expose a state return `None`.
    fn state(&self) -> Option<&[Complex64]>;
}

impl<D: Device + ?Sized> Device for &mut D {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn num_wires(&self) -> usize {
        (**self).num_wires()
    }

    fn execute(
        &mut self,
        operations: &[Operation],
        measurements: &[Measurement],
    ) -> Result<Vec<MeasurementResult>, DeviceError> {
        (**self).execute(operations, measurements)
    }

    fn state(&self) -> Option<&[Complex64]> {
        (**self).state()
    }
}
