//! Entanglement detection for two- and three-qubit pure states.
//!
//! Two qubits: Schmidt decomposition of the amplitude matrix. Three qubits:
//! the five local-unitary invariants `I1..I5` and their combinations
//! `J1..J5`, which vanish in a pattern that identifies which qubits share
//! entanglement.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::linalg::round_to;
use crate::state::StateVector;

/// Decimal places kept before deciding whether an invariant vanishes.
pub const DETECTION_DECIMALS: usize = 6;

fn vanishes(x: f64) -> bool {
    round_to(x, DETECTION_DECIMALS) == 0.0
}

/// Schmidt coefficients of a two-qubit pure state, largest first.
pub fn schmidt_coefficients(state: &StateVector) -> SimResult<[f64; 2]> {
    if state.qubit_count() != 2 {
        return Err(SimError::Dimension(format!(
            "Schmidt decomposition needs 2 qubits, got {}",
            state.qubit_count()
        )));
    }
    let a = state.amplitudes();
    // Singular values of M = [[a0, a1], [a2, a3]] from the eigenvalues of MM†.
    let trace: f64 = a.iter().map(|x| x.norm_sqr()).sum();
    let det: Complex64 = a[0] * a[3] - a[1] * a[2];
    let discriminant = (trace * trace - 4.0 * det.norm_sqr()).max(0.0).sqrt();
    let high = ((trace + discriminant) / 2.0).max(0.0).sqrt();
    let low = ((trace - discriminant) / 2.0).max(0.0).sqrt();
    Ok([high, low])
}

/// True if a two-qubit pure state is entangled.
///
/// The state is a product state exactly when one Schmidt coefficient rounds
/// to 1 and every other one rounds to 0.
pub fn detect_bipartite(state: &StateVector) -> SimResult<bool> {
    let coefficients = schmidt_coefficients(state)?;
    tracing::info!(?coefficients, "Schmidt coefficients");
    let rounded: Vec<f64> = coefficients
        .iter()
        .map(|&c| round_to(c, DETECTION_DECIMALS))
        .collect();
    let ones = rounded.iter().filter(|&&c| c == 1.0).count();
    let zeros = rounded.iter().filter(|&&c| c == 0.0).count();
    Ok(!(ones == 1 && zeros == rounded.len() - 1))
}

/// Entanglement class of a three-qubit pure state. Qubits are register
/// indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Entanglement {
    /// Product of three single-qubit states.
    FullySeparable,
    /// Exactly one pair is entangled, the third qubit is separable.
    Bipartite(usize, usize),
    /// Genuine three-way entanglement (GHZ, W, ...).
    Tripartite(usize, usize, usize),
}

impl Entanglement {
    pub fn is_entangled(&self) -> bool {
        !matches!(self, Entanglement::FullySeparable)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Entanglement::FullySeparable => "fully_separable",
            Entanglement::Bipartite(..) => "bipartite",
            Entanglement::Tripartite(..) => "tripartite",
        }
    }

    /// Register indices of the entangled qubits.
    pub fn qubits(&self) -> Vec<usize> {
        match *self {
            Entanglement::FullySeparable => Vec::new(),
            Entanglement::Bipartite(a, b) => vec![a, b],
            Entanglement::Tripartite(a, b, c) => vec![a, b, c],
        }
    }
}

impl std::fmt::Display for Entanglement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.kind())
    }
}

/// Local-unitary invariants of a three-qubit state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Invariants {
    pub i: [f64; 5],
    pub j: [f64; 5],
}

/// Compute `I1..I5` and `J1..J5` for qubits `[a, b, c]` of a 3-qubit state.
pub fn invariants(state: &StateVector, qubits: [usize; 3]) -> SimResult<Invariants> {
    if state.qubit_count() != 3 {
        return Err(SimError::Dimension(format!(
            "tripartite detection needs 3 qubits, got {}",
            state.qubit_count()
        )));
    }
    let [a, b, c] = qubits;
    let rho_a = state.density_matrix_of(&[a])?;
    let rho_b = state.density_matrix_of(&[b])?;
    let rho_c = state.density_matrix_of(&[c])?;
    let rho_ab = state.density_matrix_of(&[a, b])?;

    let i1 = rho_a.mul(&rho_a)?.trace()?.re;
    let i2 = rho_b.mul(&rho_b)?.trace()?.re;
    let i3 = rho_c.mul(&rho_c)?.trace()?.re;
    let i4 = rho_a.kron(&rho_b).mul(&rho_ab)?.trace()?.re;
    let i5 = hyperdeterminant(state, qubits).norm_sqr();

    let root5 = i5.sqrt();
    let j1 = 0.25 * (1.0 + i1 - i2 - i3 - 2.0 * root5);
    let j2 = 0.25 * (1.0 - i1 + i2 - i3 - 2.0 * root5);
    let j3 = 0.25 * (1.0 - i1 - i2 + i3 - 2.0 * root5);
    let j4 = root5;
    let j5 = 0.25 * (3.0 - 3.0 * i1 - 3.0 * i2 - i3 + 4.0 * i4 - 2.0 * root5);

    Ok(Invariants {
        i: [i1, i2, i3, i4, i5],
        j: [j1, j2, j3, j4, j5],
    })
}

/// Cayley hyperdeterminant of the 2×2×2 amplitude tensor.
fn hyperdeterminant(state: &StateVector, qubits: [usize; 3]) -> Complex64 {
    let n = state.qubit_count();
    let amp = |i: usize, j: usize, k: usize| -> Complex64 {
        let index = [i, j, k]
            .iter()
            .zip(qubits.iter())
            .filter(|(bit, _)| **bit == 1)
            .fold(0usize, |acc, (_, &q)| acc | (1 << (n - 1 - q)));
        state.amplitude(index)
    };
    let (c000, c001, c010, c011) = (amp(0, 0, 0), amp(0, 0, 1), amp(0, 1, 0), amp(0, 1, 1));
    let (c100, c101, c110, c111) = (amp(1, 0, 0), amp(1, 0, 1), amp(1, 1, 0), amp(1, 1, 1));

    c000 * c000 * c111 * c111 + c001 * c001 * c110 * c110 + c010 * c010 * c101 * c101
        + c100 * c100 * c011 * c011
        - 2.0 * c000 * c001 * c110 * c111
        - 2.0 * c000 * c010 * c101 * c111
        - 2.0 * c000 * c011 * c100 * c111
        - 2.0 * c001 * c010 * c101 * c110
        - 2.0 * c001 * c011 * c110 * c100
        - 2.0 * c010 * c011 * c101 * c100
        + 4.0 * c000 * c011 * c101 * c110
        + 4.0 * c001 * c010 * c100 * c111
}

/// Classify the entanglement between qubits `[a, b, c]` of a 3-qubit state.
pub fn detect_tripartite(state: &StateVector, qubits: [usize; 3]) -> SimResult<Entanglement> {
    let inv = invariants(state, qubits)?;
    tracing::debug!(i = ?inv.i, j = ?inv.j, "Tripartite invariants");
    let [a, b, c] = qubits;
    let zero: Vec<bool> = inv.j.iter().map(|&x| vanishes(x)).collect();
    let rest_zero = zero[3] && zero[4];

    let class = match (zero[0], zero[1], zero[2]) {
        (true, true, true) if rest_zero => Entanglement::FullySeparable,
        (false, true, true) if rest_zero => Entanglement::Bipartite(b, c),
        (true, false, true) if rest_zero => Entanglement::Bipartite(a, c),
        (true, true, false) if rest_zero => Entanglement::Bipartite(a, b),
        _ => Entanglement::Tripartite(a, b, c),
    };
    Ok(class)
}
