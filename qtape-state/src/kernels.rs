//! Gate application kernels
//!
//! Wire `q` of an `n`-wire state is bit `q` of the amplitude index. A
//! matrix acting on wires `[w0, w1, ..]` reads its local row index with
//! `w0` as the most significant bit.

use num_complex::Complex64;

/// Apply a single-wire gate using scalar operations
///
/// Amplitudes are processed in pairs `(i, j)` that differ only in bit `qubit`.
pub fn apply_gate_scalar(
    state: &mut [Complex64],
    matrix: &[[Complex64; 2]; 2],
    qubit: usize,
    num_qubits: usize,
) {
    let dimension = 1 << num_qubits;
    let qubit_mask = 1 << qubit;

    let m00 = matrix[0][0];
    let m01 = matrix[0][1];
    let m10 = matrix[1][0];
    let m11 = matrix[1][1];

    for i in 0..dimension {
        if i & qubit_mask != 0 {
            continue;
        }

        let j = i | qubit_mask;

        let amp0 = state[i];
        let amp1 = state[j];

        state[i] = m00 * amp0 + m01 * amp1;
        state[j] = m10 * amp0 + m11 * amp1;
    }
}

/// Global index offset of each local basis state of `wires`
pub fn local_offsets(wires: &[usize]) -> Vec<usize> {
    let k = wires.len();
    (0..1usize << k)
        .map(|local| {
            wires
                .iter()
                .enumerate()
                .filter(|(j, _)| local >> (k - 1 - j) & 1 == 1)
                .fold(0, |acc, (_, &w)| acc | 1 << w)
        })
        .collect()
}

/// Apply a row-major `2^k × 2^k` matrix to `wires`
///
/// Callers guarantee the wires are distinct and in range and the matrix has
/// the right size. The matrix need not be unitary.
pub fn apply_matrix(
    state: &mut [Complex64],
    matrix: &[Complex64],
    wires: &[usize],
    num_qubits: usize,
) {
    if let [qubit] = wires {
        let m = [[matrix[0], matrix[1]], [matrix[2], matrix[3]]];
        apply_gate_scalar(state, &m, *qubit, num_qubits);
        return;
    }

    let dimension = 1usize << num_qubits;
    let sub = 1usize << wires.len();
    let mask = wires.iter().fold(0usize, |acc, &w| acc | 1 << w);
    let offsets = local_offsets(wires);
    let mut gathered = vec![Complex64::new(0.0, 0.0); sub];

    for base in 0..dimension {
        if base & mask != 0 {
            continue;
        }
        for (slot, &offset) in gathered.iter_mut().zip(&offsets) {
            *slot = state[base | offset];
        }
        for (row, &offset) in offsets.iter().enumerate() {
            state[base | offset] = matrix[row * sub..(row + 1) * sub]
                .iter()
                .zip(&gathered)
                .map(|(m, a)| m * a)
                .sum();
        }
    }
}
