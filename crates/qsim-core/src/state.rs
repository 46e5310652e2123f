//! Pure-state vectors over a register of qubits.
//!
//! Basis states are labelled big-endian: qubit 0 is the leftmost bit of the
//! ket, so `|01⟩` on a two-qubit register has qubit 1 set.

use num_complex::Complex64;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::linalg::{format_complex, round_to, Matrix, ONE, ZERO};

/// Allowed deviation from unit norm when importing amplitudes.
pub const NORM_TOLERANCE: f64 = 1e-9;

/// State vector of `2^n` complex amplitudes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawStateVector")]
pub struct StateVector {
    qubits: usize,
    amplitudes: Vec<Complex64>,
}

#[derive(Deserialize)]
struct RawStateVector {
    qubits: usize,
    amplitudes: Vec<Complex64>,
}

impl TryFrom<RawStateVector> for StateVector {
    type Error = SimError;

    fn try_from(raw: RawStateVector) -> SimResult<Self> {
        let state = Self::from_amplitudes(raw.amplitudes)?;
        if state.qubits != raw.qubits {
            return Err(SimError::Dimension(format!(
                "{} amplitudes do not describe {} qubits",
                state.amplitudes.len(),
                raw.qubits
            )));
        }
        Ok(state)
    }
}

impl StateVector {
    /// The all-zero state `|0…0⟩` on `qubits` qubits.
    pub fn zero(qubits: usize) -> Self {
        let mut amplitudes = vec![ZERO; 1 << qubits];
        amplitudes[0] = ONE;
        Self { qubits, amplitudes }
    }

    /// Wrap explicit amplitudes. The length must be a power of two and the
    /// vector must be normalised.
    pub fn from_amplitudes(amplitudes: Vec<Complex64>) -> SimResult<Self> {
        let len = amplitudes.len();
        if len < 2 || !len.is_power_of_two() {
            return Err(SimError::Dimension(format!(
                "state vector length {} is not a power of two",
                len
            )));
        }
        let state = Self {
            qubits: len.trailing_zeros() as usize,
            amplitudes,
        };
        let norm = state.norm();
        if (norm - 1.0).abs() > NORM_TOLERANCE {
            return Err(SimError::Dimension(format!("state vector norm is {}", norm)));
        }
        Ok(state)
    }

    pub fn qubit_count(&self) -> usize {
        self.qubits
    }

    pub fn amplitudes(&self) -> &[Complex64] {
        &self.amplitudes
    }

    /// Amplitude of basis state `index`.
    pub fn amplitude(&self, index: usize) -> Complex64 {
        self.amplitudes[index]
    }

    /// Amplitude addressed by one bit per qubit, qubit 0 first.
    pub fn amplitude_of_bits(&self, bits: &[u8]) -> SimResult<Complex64> {
        if bits.len() != self.qubits {
            return Err(SimError::Dimension(format!(
                "expected {} bits, got {}",
                self.qubits,
                bits.len()
            )));
        }
        let index = bits.iter().fold(0usize, |acc, &b| (acc << 1) | usize::from(b != 0));
        Ok(self.amplitudes[index])
    }

    /// Euclidean norm.
    pub fn norm(&self) -> f64 {
        self.amplitudes.iter().map(|a| a.norm_sqr()).sum::<f64>().sqrt()
    }

    /// Inner product `⟨self|other⟩`.
    pub fn inner(&self, other: &StateVector) -> SimResult<Complex64> {
        if self.qubits != other.qubits {
            return Err(SimError::Dimension(format!(
                "inner product of {}- and {}-qubit states",
                self.qubits, other.qubits
            )));
        }
        Ok(self
            .amplitudes
            .iter()
            .zip(&other.amplitudes)
            .map(|(a, b)| a.conj() * b)
            .sum())
    }

    fn mask(&self, qubit: usize) -> usize {
        1 << (self.qubits - 1 - qubit)
    }

    fn check_targets(&self, targets: &[usize]) -> SimResult<()> {
        for (i, &t) in targets.iter().enumerate() {
            if t >= self.qubits {
                return Err(SimError::Dimension(format!(
                    "qubit index {} out of range for {} qubits",
                    t, self.qubits
                )));
            }
            if targets[..i].contains(&t) {
                return Err(SimError::InvalidOperation(format!("qubit index {} repeated", t)));
            }
        }
        Ok(())
    }

    /// Visit every block of basis indices that differ only in `targets`.
    ///
    /// Within a block, position `s` holds the index whose target bits spell
    /// `s` with `targets[0]` as the most significant bit.
    fn for_each_block(&self, targets: &[usize], mut visit: impl FnMut(&[usize])) {
        let k = targets.len();
        let masks: Vec<usize> = targets.iter().map(|&t| self.mask(t)).collect();
        let all = masks.iter().fold(0, |acc, m| acc | m);
        let offsets: Vec<usize> = (0..1usize << k)
            .map(|sub| {
                masks
                    .iter()
                    .enumerate()
                    .filter(|(j, _)| sub & (1 << (k - 1 - *j)) != 0)
                    .fold(0, |acc, (_, m)| acc | m)
            })
            .collect();
        let mut block = vec![0usize; offsets.len()];
        for base in (0..self.amplitudes.len()).filter(|b| b & all == 0) {
            for (slot, offset) in block.iter_mut().zip(&offsets) {
                *slot = base | offset;
            }
            visit(&block);
        }
    }

    /// Apply a `2^k × 2^k` unitary to the qubits at `targets`, in that order.
    pub fn apply(&mut self, matrix: &Matrix, targets: &[usize]) -> SimResult<()> {
        self.check_targets(targets)?;
        let dim = 1usize << targets.len();
        if matrix.rows() != dim || matrix.cols() != dim {
            return Err(SimError::Dimension(format!(
                "{}x{} matrix applied to {} qubit(s)",
                matrix.rows(),
                matrix.cols(),
                targets.len()
            )));
        }
        let mut updates: Vec<(usize, Complex64)> = Vec::with_capacity(self.amplitudes.len());
        self.for_each_block(targets, |block| {
            for (r, &out_index) in block.iter().enumerate() {
                let value: Complex64 = block
                    .iter()
                    .enumerate()
                    .map(|(c, &in_index)| matrix.get(r, c) * self.amplitudes[in_index])
                    .sum();
                updates.push((out_index, value));
            }
        });
        for (index, value) in updates {
            self.amplitudes[index] = value;
        }
        Ok(())
    }

    /// Probability that measuring `qubit` yields 1.
    pub fn probability_one(&self, qubit: usize) -> SimResult<f64> {
        self.check_targets(&[qubit])?;
        let mask = self.mask(qubit);
        Ok(self
            .amplitudes
            .iter()
            .enumerate()
            .filter(|(i, _)| i & mask != 0)
            .map(|(_, a)| a.norm_sqr())
            .sum())
    }

    /// Measure `qubit` in the computational basis, collapsing the state.
    pub fn measure<R: Rng>(&mut self, qubit: usize, rng: &mut R) -> SimResult<bool> {
        let p_one = self.probability_one(qubit)?.clamp(0.0, 1.0);
        let outcome = rng.gen::<f64>() < p_one;
        let kept = if outcome { p_one } else { 1.0 - p_one };
        let scale = 1.0 / kept.sqrt();
        let mask = self.mask(qubit);
        for (i, a) in self.amplitudes.iter_mut().enumerate() {
            if (i & mask != 0) == outcome {
                *a *= scale;
            } else {
                *a = ZERO;
            }
        }
        Ok(outcome)
    }

    /// Reduced density matrix over `qubits` (in the given order), tracing
    /// out the rest. An empty slice selects the whole register.
    pub fn density_matrix_of(&self, qubits: &[usize]) -> SimResult<Matrix> {
        let all: Vec<usize>;
        let targets = if qubits.is_empty() {
            all = (0..self.qubits).collect();
            &all[..]
        } else {
            qubits
        };
        self.check_targets(targets)?;
        let dim = 1usize << targets.len();
        let mut rho = Matrix::zeros(dim, dim);
        self.for_each_block(targets, |block| {
            for (r, &i) in block.iter().enumerate() {
                let a = self.amplitudes[i];
                if a == ZERO {
                    continue;
                }
                for (c, &j) in block.iter().enumerate() {
                    let value = rho.get(r, c) + a * self.amplitudes[j].conj();
                    rho.set(r, c, value);
                }
            }
        });
        Ok(rho)
    }

    /// Bloch vector `(x, y, z)` of a single qubit.
    pub fn bloch_vector_of(&self, qubit: usize) -> SimResult<[f64; 3]> {
        let rho = self.density_matrix_of(&[qubit])?;
        let x = 2.0 * rho.get(0, 1).re;
        let y = 2.0 * rho.get(1, 0).im;
        let z = (rho.get(0, 0) - rho.get(1, 1)).re;
        Ok([x, y, z])
    }

    /// Ket notation, e.g. `0.7071|00⟩ + 0.7071|11⟩`.
    pub fn dirac_notation(&self, decimals: usize) -> String {
        let mut out = String::new();
        for (index, &a) in self.amplitudes.iter().enumerate() {
            let re = round_to(a.re, decimals);
            let im = round_to(a.im, decimals);
            if re == 0.0 && im == 0.0 {
                continue;
            }
            let ket = format!("|{:0width$b}⟩", index, width = self.qubits);
            let (negative, coefficient) = if im == 0.0 {
                (re < 0.0, format_complex(Complex64::new(re.abs(), 0.0), decimals))
            } else if re == 0.0 {
                (im < 0.0, format_complex(Complex64::new(0.0, im.abs()), decimals))
            } else {
                (false, format!("({})", format_complex(Complex64::new(re, im), decimals)))
            };
            if out.is_empty() {
                if negative {
                    out.push('-');
                }
            } else {
                out.push_str(if negative { " - " } else { " + " });
            }
            out.push_str(&coefficient);
            out.push_str(&ket);
        }
        if out.is_empty() {
            out.push('0');
        }
        out
    }
}
