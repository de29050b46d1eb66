//! Gate matrices
//!
//! Fixed gates are compile-time constants; parameterized gates are generated
//! on demand. Two-wire matrices index rows as `2·a + b` where `a` is the
//! first wire of the operation (the control, for controlled gates).

use num_complex::Complex64;

// Compile-time constant helpers
pub(crate) const ZERO: Complex64 = Complex64::new(0.0, 0.0);
pub(crate) const ONE: Complex64 = Complex64::new(1.0, 0.0);
const I: Complex64 = Complex64::new(0.0, 1.0);
const NEG_I: Complex64 = Complex64::new(0.0, -1.0);
const NEG_ONE: Complex64 = Complex64::new(-1.0, 0.0);

const INV_SQRT2: f64 = std::f64::consts::FRAC_1_SQRT_2;

// Single-wire gate matrices (2x2)

/// Hadamard gate matrix
/// H = 1/√2 * [[1,  1],
///             [1, -1]]
pub const HADAMARD: [[Complex64; 2]; 2] = [
    [
        Complex64::new(INV_SQRT2, 0.0),
        Complex64::new(INV_SQRT2, 0.0),
    ],
    [
        Complex64::new(INV_SQRT2, 0.0),
        Complex64::new(-INV_SQRT2, 0.0),
    ],
];

/// X = [[0, 1],
///      [1, 0]]
pub const PAULI_X: [[Complex64; 2]; 2] = [[ZERO, ONE], [ONE, ZERO]];

/// Y = [[0, -i],
///      [i,  0]]
pub const PAULI_Y: [[Complex64; 2]; 2] = [[ZERO, NEG_I], [I, ZERO]];

/// Z = [[1,  0],
///      [0, -1]]
pub const PAULI_Z: [[Complex64; 2]; 2] = [[ONE, ZERO], [ZERO, NEG_ONE]];

pub const IDENTITY: [[Complex64; 2]; 2] = [[ONE, ZERO], [ZERO, ONE]];

/// Projector onto |1⟩, the phase-shift generator
pub const PROJECTOR_ONE: [[Complex64; 2]; 2] = [[ZERO, ZERO], [ZERO, ONE]];

/// S = [[1, 0],
///      [0, i]]
pub const S_GATE: [[Complex64; 2]; 2] = [[ONE, ZERO], [ZERO, I]];

/// S† = [[1,  0],
///       [0, -i]]
pub const S_GATE_DAGGER: [[Complex64; 2]; 2] = [[ONE, ZERO], [ZERO, NEG_I]];

/// T = [[1, 0],
///      [0, e^(iπ/4)]]
pub const T_GATE: [[Complex64; 2]; 2] = [
    [ONE, ZERO],
    [ZERO, Complex64::new(INV_SQRT2, INV_SQRT2)],
];

/// T† = [[1, 0],
///       [0, e^(-iπ/4)]]
pub const T_GATE_DAGGER: [[Complex64; 2]; 2] = [
    [ONE, ZERO],
    [ZERO, Complex64::new(INV_SQRT2, -INV_SQRT2)],
];

/// SX = 1/2 * [[1+i, 1-i],
///             [1-i, 1+i]]
pub const SX_GATE: [[Complex64; 2]; 2] = [
    [Complex64::new(0.5, 0.5), Complex64::new(0.5, -0.5)],
    [Complex64::new(0.5, -0.5), Complex64::new(0.5, 0.5)],
];

/// SX† = 1/2 * [[1-i, 1+i],
///              [1+i, 1-i]]
pub const SX_GATE_DAGGER: [[Complex64; 2]; 2] = [
    [Complex64::new(0.5, -0.5), Complex64::new(0.5, 0.5)],
    [Complex64::new(0.5, 0.5), Complex64::new(0.5, -0.5)],
];

// Two-wire gate matrices (4x4)

pub const CNOT: [[Complex64; 4]; 4] = [
    [ONE, ZERO, ZERO, ZERO],
    [ZERO, ONE, ZERO, ZERO],
    [ZERO, ZERO, ZERO, ONE],
    [ZERO, ZERO, ONE, ZERO],
];

pub const CZ: [[Complex64; 4]; 4] = [
    [ONE, ZERO, ZERO, ZERO],
    [ZERO, ONE, ZERO, ZERO],
    [ZERO, ZERO, ONE, ZERO],
    [ZERO, ZERO, ZERO, NEG_ONE],
];

pub const SWAP: [[Complex64; 4]; 4] = [
    [ONE, ZERO, ZERO, ZERO],
    [ZERO, ZERO, ONE, ZERO],
    [ZERO, ONE, ZERO, ZERO],
    [ZERO, ZERO, ZERO, ONE],
];

// Parameterized gate matrix generators

/// RX(θ) = [[cos(θ/2),    -i·sin(θ/2)],
///          [-i·sin(θ/2),  cos(θ/2)]]
#[inline]
pub fn rotation_x(theta: f64) -> [[Complex64; 2]; 2] {
    let (sin_val, cos_val) = (theta / 2.0).sin_cos();
    [
        [Complex64::new(cos_val, 0.0), Complex64::new(0.0, -sin_val)],
        [Complex64::new(0.0, -sin_val), Complex64::new(cos_val, 0.0)],
    ]
}

/// RY(θ) = [[cos(θ/2),  -sin(θ/2)],
///          [sin(θ/2),   cos(θ/2)]]
#[inline]
pub fn rotation_y(theta: f64) -> [[Complex64; 2]; 2] {
    let (sin_val, cos_val) = (theta / 2.0).sin_cos();
    [
        [Complex64::new(cos_val, 0.0), Complex64::new(-sin_val, 0.0)],
        [Complex64::new(sin_val, 0.0), Complex64::new(cos_val, 0.0)],
    ]
}

/// RZ(θ) = [[e^(-iθ/2),  0       ],
///          [0,          e^(iθ/2)]]
#[inline]
pub fn rotation_z(theta: f64) -> [[Complex64; 2]; 2] {
    let (sin_val, cos_val) = (theta / 2.0).sin_cos();
    [
        [Complex64::new(cos_val, -sin_val), ZERO],
        [ZERO, Complex64::new(cos_val, sin_val)],
    ]
}

/// P(θ) = [[1, 0     ],
///         [0, e^(iθ)]]
#[inline]
pub fn phase(theta: f64) -> [[Complex64; 2]; 2] {
    [[ONE, ZERO], [ZERO, Complex64::from_polar(1.0, theta)]]
}

/// U1(λ) is the phase gate P(λ)
#[inline]
pub fn u1(lambda: f64) -> [[Complex64; 2]; 2] {
    phase(lambda)
}

/// U2(φ,λ) = 1/√2 * [[1,        -e^(iλ)    ],
///                   [e^(iφ),    e^(i(φ+λ))]]
#[inline]
pub fn u2(phi: f64, lambda: f64) -> [[Complex64; 2]; 2] {
    u3(std::f64::consts::FRAC_PI_2, phi, lambda)
}

/// U3(θ,φ,λ) = [[cos(θ/2),              -e^(iλ)·sin(θ/2)    ],
///              [e^(iφ)·sin(θ/2),        e^(i(φ+λ))·cos(θ/2)]]
#[inline]
pub fn u3(theta: f64, phi: f64, lambda: f64) -> [[Complex64; 2]; 2] {
    let (sin_val, cos_val) = (theta / 2.0).sin_cos();
    let e_phi = Complex64::from_polar(1.0, phi);
    let e_lambda = Complex64::from_polar(1.0, lambda);
    let e_phi_lambda = Complex64::from_polar(1.0, phi + lambda);

    [
        [Complex64::new(cos_val, 0.0), -e_lambda * sin_val],
        [e_phi * sin_val, e_phi_lambda * cos_val],
    ]
}

/// Rot(φ,θ,ω) = RZ(ω)·RY(θ)·RZ(φ)
#[inline]
pub fn rot(phi: f64, theta: f64, omega: f64) -> [[Complex64; 2]; 2] {
    mult_2x2(&rotation_z(omega), &mult_2x2(&rotation_y(theta), &rotation_z(phi)))
}

/// Controlled version of a single-wire unitary, control on the first wire
#[inline]
pub fn controlled(u: &[[Complex64; 2]; 2]) -> [[Complex64; 4]; 4] {
    [
        [ONE, ZERO, ZERO, ZERO],
        [ZERO, ONE, ZERO, ZERO],
        [ZERO, ZERO, u[0][0], u[0][1]],
        [ZERO, ZERO, u[1][0], u[1][1]],
    ]
}

/// Product of two 2x2 matrices
#[inline]
pub fn mult_2x2(a: &[[Complex64; 2]; 2], b: &[[Complex64; 2]; 2]) -> [[Complex64; 2]; 2] {
    let mut result = [[ZERO; 2]; 2];
    for i in 0..2 {
        for j in 0..2 {
            for k in 0..2 {
                result[i][j] += a[i][k] * b[k][j];
            }
        }
    }
    result
}

/// Flatten a fixed-size matrix into row-major order
pub fn to_dense<const N: usize>(m: &[[Complex64; N]; N]) -> Vec<Complex64> {
    m.iter().flatten().copied().collect()
}

/// Kronecker product of row-major square matrices of dimension `da` and `db`
pub fn kron(a: &[Complex64], da: usize, b: &[Complex64], db: usize) -> Vec<Complex64> {
    let dim = da * db;
    let mut result = vec![ZERO; dim * dim];
    for ar in 0..da {
        for ac in 0..da {
            let av = a[ar * da + ac];
            if av == ZERO {
                continue;
            }
            for br in 0..db {
                for bc in 0..db {
                    result[(ar * db + br) * dim + ac * db + bc] = av * b[br * db + bc];
                }
            }
        }
    }
    result
}

/// Conjugate transpose of a row-major square matrix
pub fn dagger(m: &[Complex64], dim: usize) -> Vec<Complex64> {
    let mut result = vec![ZERO; dim * dim];
    for r in 0..dim {
        for c in 0..dim {
            result[c * dim + r] = m[r * dim + c].conj();
        }
    }
    result
}

/// Product of two row-major square matrices
pub fn matmul(a: &[Complex64], b: &[Complex64], dim: usize) -> Vec<Complex64> {
    let mut result = vec![ZERO; dim * dim];
    for i in 0..dim {
        for k in 0..dim {
            let aik = a[i * dim + k];
            if aik == ZERO {
                continue;
            }
            for j in 0..dim {
                result[i * dim + j] += aik * b[k * dim + j];
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn assert_matrix_eq(a: &[[Complex64; 2]; 2], b: &[[Complex64; 2]; 2]) {
        for i in 0..2 {
            for j in 0..2 {
                assert_relative_eq!(a[i][j].re, b[i][j].re, epsilon = 1e-10);
                assert_relative_eq!(a[i][j].im, b[i][j].im, epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn test_pauli_x_squaring() {
        // X² = I
        assert_matrix_eq(&mult_2x2(&PAULI_X, &PAULI_X), &IDENTITY);
    }

    #[test]
    fn test_hadamard_self_inverse() {
        assert_matrix_eq(&mult_2x2(&HADAMARD, &HADAMARD), &IDENTITY);
    }

    #[test]
    fn test_s_and_t_squaring() {
        // S² = Z, T² = S
        assert_matrix_eq(&mult_2x2(&S_GATE, &S_GATE), &PAULI_Z);
        assert_matrix_eq(&mult_2x2(&T_GATE, &T_GATE), &S_GATE);
    }

    #[test]
    fn test_dagger_constants() {
        assert_matrix_eq(&mult_2x2(&S_GATE, &S_GATE_DAGGER), &IDENTITY);
        assert_matrix_eq(&mult_2x2(&T_GATE, &T_GATE_DAGGER), &IDENTITY);
        assert_matrix_eq(&mult_2x2(&SX_GATE, &SX_GATE_DAGGER), &IDENTITY);
        assert_matrix_eq(&mult_2x2(&SX_GATE, &SX_GATE), &PAULI_X);
    }

    #[test]
    fn test_rotation_x_pi_is_x_up_to_phase() {
        // RX(π) = -iX
        let rx = rotation_x(PI);
        assert_relative_eq!(rx[0][1].im, -1.0, epsilon = 1e-10);
        assert_relative_eq!(rx[0][0].norm(), 0.0, epsilon = 1e-10);
    }

    #[test]
    fn test_rot_reduces_to_rotations() {
        assert_matrix_eq(&rot(0.0, 0.7, 0.0), &rotation_y(0.7));
        assert_matrix_eq(&rot(0.3, 0.0, 0.4), &rotation_z(0.7));
    }

    #[test]
    fn test_u2_is_u3_at_half_pi() {
        assert_matrix_eq(&u2(0.2, 0.9), &u3(PI / 2.0, 0.2, 0.9));
        assert_relative_eq!(u2(0.0, 0.0)[0][0].re, INV_SQRT2, epsilon = 1e-12);
    }

    #[test]
    fn test_kron_dimension_and_order() {
        let xz = kron(&to_dense(&PAULI_X), 2, &to_dense(&PAULI_Z), 2);
        assert_eq!(xz.len(), 16);
        // X⊗Z maps |00⟩ to |10⟩ with +1, |01⟩ to |11⟩ with -1
        assert_eq!(xz[2 * 4], ONE);
        assert_eq!(xz[3 * 4 + 1], NEG_ONE);
    }

    #[test]
    fn test_controlled_embeds_target_block() {
        let cx = to_dense(&controlled(&PAULI_X));
        assert_eq!(cx, to_dense(&CNOT));
    }

    #[test]
    fn test_dagger_and_matmul() {
        let u = to_dense(&rot(0.1, 0.2, 0.3));
        let product = matmul(&dagger(&u, 2), &u, 2);
        let eye = to_dense(&IDENTITY);
        for (a, b) in product.iter().zip(&eye) {
            assert_relative_eq!(a.re, b.re, epsilon = 1e-12);
            assert_relative_eq!(a.im, b.im, epsilon = 1e-12);
        }
    }
}
