//! Quantum operation definitions
//!
//! The supported gate set is closed: every gate is a [`GateKind`] variant with
//! a fixed wire count, a fixed parameter count and a declared differentiation
//! method. An [`Operation`] pairs a kind with concrete parameters and wires.

use crate::wire::check_distinct;
use crate::{queuing, Result, TapeError, Wire};
use num_complex::Complex64;
use smallvec::SmallVec;
use std::fmt;

/// Differentiation method a gate declares for its parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GradMethod {
    /// Closed-form generator is known
    Analytic,
    /// Only finite differences apply
    Numeric,
}

/// Closed set of gate types a tape can record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GateKind {
    Identity,
    Hadamard,
    PauliX,
    PauliY,
    PauliZ,
    S,
    Sdg,
    T,
    Tdg,
    SX,
    SXdg,
    CNOT,
    CZ,
    SWAP,
    RX,
    RY,
    RZ,
    PhaseShift,
    /// Euler rotation `Rot(φ, θ, ω) = RZ(ω)·RY(θ)·RZ(φ)`
    Rot,
    CRX,
    CRY,
    CRZ,
    CRot,
    U1,
    U2,
    U3,
    /// Prepares an arbitrary state vector on its wires
    QubitStateVector,
    /// Prepares a computational basis state on its wires
    BasisState,
}

impl GateKind {
    /// All gate kinds, in declaration order
    pub const ALL: [GateKind; 28] = [
        GateKind::Identity,
        GateKind::Hadamard,
        GateKind::PauliX,
        GateKind::PauliY,
        GateKind::PauliZ,
        GateKind::S,
        GateKind::Sdg,
        GateKind::T,
        GateKind::Tdg,
        GateKind::SX,
        GateKind::SXdg,
        GateKind::CNOT,
        GateKind::CZ,
        GateKind::SWAP,
        GateKind::RX,
        GateKind::RY,
        GateKind::RZ,
        GateKind::PhaseShift,
        GateKind::Rot,
        GateKind::CRX,
        GateKind::CRY,
        GateKind::CRZ,
        GateKind::CRot,
        GateKind::U1,
        GateKind::U2,
        GateKind::U3,
        GateKind::QubitStateVector,
        GateKind::BasisState,
    ];

    /// The name of the gate (e.g., "RX", "CNOT")
    pub fn name(self) -> &'static str {
        match self {
            GateKind::Identity => "Identity",
            GateKind::Hadamard => "Hadamard",
            GateKind::PauliX => "PauliX",
            GateKind::PauliY => "PauliY",
            GateKind::PauliZ => "PauliZ",
            GateKind::S => "S",
            GateKind::Sdg => "Sdg",
            GateKind::T => "T",
            GateKind::Tdg => "Tdg",
            GateKind::SX => "SX",
            GateKind::SXdg => "SXdg",
            GateKind::CNOT => "CNOT",
            GateKind::CZ => "CZ",
            GateKind::SWAP => "SWAP",
            GateKind::RX => "RX",
            GateKind::RY => "RY",
            GateKind::RZ => "RZ",
            GateKind::PhaseShift => "PhaseShift",
            GateKind::Rot => "Rot",
            GateKind::CRX => "CRX",
            GateKind::CRY => "CRY",
            GateKind::CRZ => "CRZ",
            GateKind::CRot => "CRot",
            GateKind::U1 => "U1",
            GateKind::U2 => "U2",
            GateKind::U3 => "U3",
            GateKind::QubitStateVector => "QubitStateVector",
            GateKind::BasisState => "BasisState",
        }
    }

    /// Number of wires the gate acts on
    ///
    /// `None` for state preparations, which accept any number of wires.
    pub fn num_wires(self) -> Option<usize> {
        match self {
            GateKind::QubitStateVector | GateKind::BasisState => None,
            GateKind::CNOT
            | GateKind::CZ
            | GateKind::SWAP
            | GateKind::CRX
            | GateKind::CRY
            | GateKind::CRZ
            | GateKind::CRot => Some(2),
            _ => Some(1),
        }
    }

    /// Number of parameters the gate takes
    pub fn num_params(self) -> usize {
        match self {
            GateKind::RX
            | GateKind::RY
            | GateKind::RZ
            | GateKind::PhaseShift
            | GateKind::CRX
            | GateKind::CRY
            | GateKind::CRZ
            | GateKind::U1
            | GateKind::QubitStateVector
            | GateKind::BasisState => 1,
            GateKind::U2 => 2,
            GateKind::Rot | GateKind::CRot | GateKind::U3 => 3,
            _ => 0,
        }
    }

    /// Declared differentiation method for the gate's parameters
    ///
    /// `None` for gates without differentiable parameters.
    pub fn grad_method(self) -> Option<GradMethod> {
        match self {
            GateKind::RX
            | GateKind::RY
            | GateKind::RZ
            | GateKind::PhaseShift
            | GateKind::Rot
            | GateKind::CRX
            | GateKind::CRY
            | GateKind::CRZ
            | GateKind::CRot
            | GateKind::U1 => Some(GradMethod::Analytic),
            // no single-generator form
            GateKind::U2 | GateKind::U3 => Some(GradMethod::Numeric),
            _ => None,
        }
    }

    /// Whether the gate prepares a state rather than evolving one
    pub fn is_state_preparation(self) -> bool {
        matches!(self, GateKind::QubitStateVector | GateKind::BasisState)
    }

    /// Whether the gate is its own inverse
    pub fn is_self_inverse(self) -> bool {
        matches!(
            self,
            GateKind::Identity
                | GateKind::Hadamard
                | GateKind::PauliX
                | GateKind::PauliY
                | GateKind::PauliZ
                | GateKind::CNOT
                | GateKind::CZ
                | GateKind::SWAP
        )
    }
}

impl fmt::Display for GateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Value carried by a gate parameter
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ParamValue {
    /// Real angle
    Scalar(f64),
    /// State or basis vector (never differentiable)
    Array(Vec<Complex64>),
}

/// A gate parameter with its trainability flag
///
/// # Example
/// ```
/// use qtape_core::Param;
///
/// let theta: Param = 0.5.into();
/// assert!(theta.requires_grad());
///
/// let fixed = Param::fixed(0.31);
/// assert!(!fixed.requires_grad());
/// assert_eq!(fixed.as_scalar(), Some(0.31));
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Param {
    value: ParamValue,
    requires_grad: bool,
}

impl Param {
    /// Trainable scalar parameter
    pub fn new(value: f64) -> Self {
        Self {
            value: ParamValue::Scalar(value),
            requires_grad: true,
        }
    }

    /// Scalar parameter marked non-trainable at construction time
    pub fn fixed(value: f64) -> Self {
        Self {
            value: ParamValue::Scalar(value),
            requires_grad: false,
        }
    }

    /// Array-valued parameter (state vectors, basis states)
    pub fn array(values: Vec<Complex64>) -> Self {
        Self {
            value: ParamValue::Array(values),
            requires_grad: false,
        }
    }

    #[inline]
    pub fn value(&self) -> &ParamValue {
        &self.value
    }

    #[inline]
    pub fn requires_grad(&self) -> bool {
        self.requires_grad
    }

    /// Scalar value, or `None` for arrays
    #[inline]
    pub fn as_scalar(&self) -> Option<f64> {
        match self.value {
            ParamValue::Scalar(v) => Some(v),
            ParamValue::Array(_) => None,
        }
    }

    /// Array value, or `None` for scalars
    #[inline]
    pub fn as_array(&self) -> Option<&[Complex64]> {
        match &self.value {
            ParamValue::Array(v) => Some(v),
            ParamValue::Scalar(_) => None,
        }
    }

    /// Whether the parameter can enter a Jacobian at all
    #[inline]
    pub fn is_numeric(&self) -> bool {
        matches!(self.value, ParamValue::Scalar(_))
    }

    pub(crate) fn set_scalar(&mut self, value: f64) -> bool {
        match &mut self.value {
            ParamValue::Scalar(v) => {
                *v = value;
                true
            }
            ParamValue::Array(_) => false,
        }
    }
}

impl From<f64> for Param {
    fn from(value: f64) -> Self {
        Param::new(value)
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            ParamValue::Scalar(v) => write!(f, "{}", v),
            ParamValue::Array(v) => write!(f, "[{} amplitudes]", v.len()),
        }
    }
}

/// A gate applied to specific wires with concrete parameters
///
/// # Example
/// ```
/// use qtape_core::{GateKind, Operation, Param, Wire};
///
/// let op = Operation::new(GateKind::CRX, vec![Param::new(0.5)], &[Wire::new(0), Wire::new(1)])
///     .unwrap();
/// assert_eq!(op.name(), "CRX");
/// assert_eq!(op.num_params(), 1);
///
/// let bad = Operation::new(GateKind::CNOT, vec![], &[Wire::new(0)]);
/// assert!(bad.is_err());
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Operation {
    kind: GateKind,
    params: SmallVec<[Param; 3]>,
    wires: SmallVec<[Wire; 2]>, // Most gates are 1-2 wires
}

impl Operation {
    /// Create a new operation
    ///
    /// # Errors
    /// Returns error if:
    /// - Wire count doesn't match the gate
    /// - Parameter count doesn't match the gate
    /// - Duplicate wires specified
    pub fn new(kind: GateKind, params: Vec<Param>, wires: &[Wire]) -> Result<Self> {
        if let Some(expected) = kind.num_wires() {
            if wires.len() != expected {
                return Err(TapeError::invalid_wire_count(
                    kind.name(),
                    expected,
                    wires.len(),
                ));
            }
        } else if wires.is_empty() {
            return Err(TapeError::invalid_wire_count(kind.name(), 1, 0));
        }

        if params.len() != kind.num_params() {
            return Err(TapeError::invalid_parameter_count(
                kind.name(),
                kind.num_params(),
                params.len(),
            ));
        }

        if let Some(wire) = check_distinct(wires) {
            return Err(TapeError::DuplicateWire(wire));
        }

        Ok(Self {
            kind,
            params: params.into_iter().collect(),
            wires: SmallVec::from_slice(wires),
        })
    }

    /// Internal constructor for shapes known to be valid
    fn fixed_shape(kind: GateKind, params: SmallVec<[Param; 3]>, wires: &[Wire]) -> Self {
        debug_assert_eq!(params.len(), kind.num_params());
        Self {
            kind,
            params,
            wires: SmallVec::from_slice(wires),
        }
    }

    fn single(kind: GateKind, wire: impl Into<Wire>) -> Self {
        Self::fixed_shape(kind, SmallVec::new(), &[wire.into()])
    }

    fn rotation(kind: GateKind, angle: impl Into<Param>, wire: impl Into<Wire>) -> Self {
        let mut params = SmallVec::new();
        params.push(angle.into());
        Self::fixed_shape(kind, params, &[wire.into()])
    }

    fn two_wire(
        kind: GateKind,
        params: SmallVec<[Param; 3]>,
        a: impl Into<Wire>,
        b: impl Into<Wire>,
    ) -> Result<Self> {
        let wires = [a.into(), b.into()];
        if wires[0] == wires[1] {
            return Err(TapeError::DuplicateWire(wires[0]));
        }
        Ok(Self::fixed_shape(kind, params, &wires))
    }

    pub fn identity(wire: impl Into<Wire>) -> Self {
        Self::single(GateKind::Identity, wire)
    }

    pub fn hadamard(wire: impl Into<Wire>) -> Self {
        Self::single(GateKind::Hadamard, wire)
    }

    pub fn pauli_x(wire: impl Into<Wire>) -> Self {
        Self::single(GateKind::PauliX, wire)
    }

    pub fn pauli_y(wire: impl Into<Wire>) -> Self {
        Self::single(GateKind::PauliY, wire)
    }

    pub fn pauli_z(wire: impl Into<Wire>) -> Self {
        Self::single(GateKind::PauliZ, wire)
    }

    pub fn s(wire: impl Into<Wire>) -> Self {
        Self::single(GateKind::S, wire)
    }

    pub fn t(wire: impl Into<Wire>) -> Self {
        Self::single(GateKind::T, wire)
    }

    pub fn sx(wire: impl Into<Wire>) -> Self {
        Self::single(GateKind::SX, wire)
    }

    pub fn rx(theta: impl Into<Param>, wire: impl Into<Wire>) -> Self {
        Self::rotation(GateKind::RX, theta, wire)
    }

    pub fn ry(theta: impl Into<Param>, wire: impl Into<Wire>) -> Self {
        Self::rotation(GateKind::RY, theta, wire)
    }

    pub fn rz(theta: impl Into<Param>, wire: impl Into<Wire>) -> Self {
        Self::rotation(GateKind::RZ, theta, wire)
    }

    pub fn phase_shift(phi: impl Into<Param>, wire: impl Into<Wire>) -> Self {
        Self::rotation(GateKind::PhaseShift, phi, wire)
    }

    pub fn u1(lambda: impl Into<Param>, wire: impl Into<Wire>) -> Self {
        Self::rotation(GateKind::U1, lambda, wire)
    }

    pub fn u2(phi: impl Into<Param>, lambda: impl Into<Param>, wire: impl Into<Wire>) -> Self {
        let params = smallvec::smallvec![phi.into(), lambda.into()];
        Self::fixed_shape(GateKind::U2, params, &[wire.into()])
    }

    pub fn u3(
        theta: impl Into<Param>,
        phi: impl Into<Param>,
        lambda: impl Into<Param>,
        wire: impl Into<Wire>,
    ) -> Self {
        let params = smallvec::smallvec![theta.into(), phi.into(), lambda.into()];
        Self::fixed_shape(GateKind::U3, params, &[wire.into()])
    }

    /// Euler rotation `RZ(omega)·RY(theta)·RZ(phi)`
    pub fn rot(
        phi: impl Into<Param>,
        theta: impl Into<Param>,
        omega: impl Into<Param>,
        wire: impl Into<Wire>,
    ) -> Self {
        let params = smallvec::smallvec![phi.into(), theta.into(), omega.into()];
        Self::fixed_shape(GateKind::Rot, params, &[wire.into()])
    }

    /// Controlled-NOT
    ///
    /// # Panics
    /// Panics if `control == target`; use [`Operation::new`] for a fallible
    /// constructor.
    pub fn cnot(control: impl Into<Wire>, target: impl Into<Wire>) -> Self {
        Self::two_wire(GateKind::CNOT, SmallVec::new(), control, target)
            .unwrap_or_else(|e| panic!("{}", e))
    }

    /// Controlled-Z
    ///
    /// # Panics
    /// Panics if both wires coincide.
    pub fn cz(a: impl Into<Wire>, b: impl Into<Wire>) -> Self {
        Self::two_wire(GateKind::CZ, SmallVec::new(), a, b).unwrap_or_else(|e| panic!("{}", e))
    }

    /// SWAP
    ///
    /// # Panics
    /// Panics if both wires coincide.
    pub fn swap(a: impl Into<Wire>, b: impl Into<Wire>) -> Self {
        Self::two_wire(GateKind::SWAP, SmallVec::new(), a, b).unwrap_or_else(|e| panic!("{}", e))
    }

    /// Controlled rotation of kind `CRX`, `CRY` or `CRZ`
    ///
    /// # Errors
    /// Returns error if `kind` is not a one-parameter two-wire gate or the
    /// wires coincide.
    pub fn controlled_rotation(
        kind: GateKind,
        theta: impl Into<Param>,
        control: impl Into<Wire>,
        target: impl Into<Wire>,
    ) -> Result<Self> {
        Self::new(kind, vec![theta.into()], &[control.into(), target.into()])
    }

    /// Controlled Euler rotation
    ///
    /// # Errors
    /// Returns error if both wires coincide.
    pub fn crot(
        phi: impl Into<Param>,
        theta: impl Into<Param>,
        omega: impl Into<Param>,
        control: impl Into<Wire>,
        target: impl Into<Wire>,
    ) -> Result<Self> {
        let params = smallvec::smallvec![phi.into(), theta.into(), omega.into()];
        Self::two_wire(GateKind::CRot, params, control, target)
    }

    /// Prepare `amplitudes` on `wires`
    ///
    /// # Errors
    /// Returns error for duplicate or missing wires.
    pub fn qubit_state_vector(amplitudes: Vec<Complex64>, wires: &[Wire]) -> Result<Self> {
        Self::new(GateKind::QubitStateVector, vec![Param::array(amplitudes)], wires)
    }

    /// Prepare the basis state given by `bits` (one 0/1 entry per wire)
    ///
    /// # Errors
    /// Returns error for duplicate or missing wires.
    pub fn basis_state(bits: &[u8], wires: &[Wire]) -> Result<Self> {
        let values = bits
            .iter()
            .map(|&b| Complex64::new(f64::from(b), 0.0))
            .collect();
        Self::new(GateKind::BasisState, vec![Param::array(values)], wires)
    }

    /// Append this operation to the active recording, if any
    ///
    /// Outside a recording this is a no-op.
    pub fn queue(self) {
        queuing::push_operation(self);
    }

    #[inline]
    pub fn kind(&self) -> GateKind {
        self.kind
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    #[inline]
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    #[inline]
    pub fn num_params(&self) -> usize {
        self.params.len()
    }

    /// Scalar value of parameter `position`, if it is a scalar
    #[inline]
    pub fn scalar(&self, position: usize) -> Option<f64> {
        self.params.get(position).and_then(Param::as_scalar)
    }

    /// All parameters as scalars, or `None` if any is array-valued
    pub fn scalars(&self) -> Option<SmallVec<[f64; 3]>> {
        self.params.iter().map(Param::as_scalar).collect()
    }

    #[inline]
    pub fn wires(&self) -> &[Wire] {
        &self.wires
    }

    #[inline]
    pub fn num_wires(&self) -> usize {
        self.wires.len()
    }

    /// Same gate and wires, new scalar parameters
    ///
    /// Trainability flags are carried over position by position.
    pub fn with_scalars(&self, values: &[f64]) -> Result<Self> {
        if values.len() != self.params.len() {
            return Err(TapeError::invalid_parameter_count(
                self.name(),
                self.params.len(),
                values.len(),
            ));
        }
        let params = self
            .params
            .iter()
            .zip(values)
            .map(|(p, &v)| Param {
                value: ParamValue::Scalar(v),
                requires_grad: p.requires_grad,
            })
            .collect();
        Ok(Self::fixed_shape(self.kind, params, &self.wires))
    }

    /// Overwrite a scalar parameter in place
    ///
    /// Returns `false` if the parameter is array-valued.
    pub(crate) fn set_scalar(&mut self, position: usize, value: f64) -> bool {
        self.params
            .get_mut(position)
            .map_or(false, |p| p.set_scalar(value))
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind.name())?;
        if !self.params.is_empty() {
            write!(f, "(")?;
            for (i, p) in self.params.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", p)?;
            }
            write!(f, ")")?;
        }
        write!(f, " [")?;
        for (i, w) in self.wires.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", w)?;
        }
        write!(f, "]")
    }
}
