//! Wire addressing

use std::fmt;

/// Type-safe identifier for a wire (qubit line) of a circuit
///
/// # Example
/// ```
/// use qtape_core::Wire;
///
/// let w0 = Wire::new(0);
/// let w1: Wire = 1.into();
/// assert!(w0 < w1);
/// ```
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Wire(usize);

impl Wire {
    /// Create a new wire identifier
    #[inline]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Get the underlying index
    #[inline]
    pub const fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for Wire {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "w{}", self.0)
    }
}

impl From<usize> for Wire {
    #[inline]
    fn from(index: usize) -> Self {
        Self::new(index)
    }
}

impl From<Wire> for usize {
    #[inline]
    fn from(wire: Wire) -> Self {
        wire.index()
    }
}

/// Fail on the first wire that appears twice
pub(crate) fn check_distinct(wires: &[Wire]) -> Option<Wire> {
    for i in 0..wires.len() {
        for j in (i + 1)..wires.len() {
            if wires[i] == wires[j] {
                return Some(wires[i]);
            }
        }
    }
    None
}
