//! Qubits, registers, gates and operations.

use std::f64::consts::{FRAC_1_SQRT_2, PI};
use std::fmt;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::linalg::{Matrix, ONE, ZERO};

/// Tolerance used when validating user-supplied unitaries.
pub const UNITARY_TOLERANCE: f64 = 1e-8;

/// A named qubit and its position in the register.
///
/// Index 0 is the most significant bit of a basis-state label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Qubit {
    pub index: usize,
    pub name: String,
}

impl fmt::Display for Qubit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Ordered set of uniquely named qubits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Register {
    qubits: Vec<Qubit>,
}

impl Register {
    /// Create a register from qubit names in layout order.
    pub fn new(names: &[&str]) -> SimResult<Self> {
        if names.is_empty() {
            return Err(SimError::InvalidRegister("register has no qubits".to_string()));
        }
        let mut qubits: Vec<Qubit> = Vec::with_capacity(names.len());
        for (index, name) in names.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(SimError::InvalidRegister(format!("qubit {} has an empty name", index)));
            }
            if qubits.iter().any(|q| q.name == *name) {
                return Err(SimError::InvalidRegister(format!("duplicate qubit name '{}'", name)));
            }
            qubits.push(Qubit {
                index,
                name: name.to_string(),
            });
        }
        Ok(Self { qubits })
    }

    /// Look up a qubit by name.
    pub fn qubit(&self, name: &str) -> SimResult<Qubit> {
        self.qubits
            .iter()
            .find(|q| q.name == name)
            .cloned()
            .ok_or_else(|| SimError::UnknownQubit(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.qubits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.qubits.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Qubit> {
        self.qubits.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.qubits.iter().map(|q| q.name.as_str()).collect()
    }
}

/// Quantum gates supported by the simulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gate {
    /// Hadamard.
    H,
    /// Pauli X (NOT).
    X,
    /// Pauli Y.
    Y,
    /// Pauli Z.
    Z,
    /// Phase gate, `Z**0.5`.
    S,
    /// π/8 gate, `Z**0.25`.
    T,
    /// `X**t`.
    XPow(f64),
    /// `Z**t`.
    ZPow(f64),
    /// Controlled NOT, control first.
    Cnot,
    /// Controlled Z.
    Cz,
    /// Arbitrary unitary on `log2(dim)` qubits.
    Unitary { matrix: Matrix, label: String },
    /// Computational basis measurement.
    Measure,
}

impl Gate {
    /// Build a custom unitary gate. The matrix must be square, of power-of-two
    /// dimension and unitary.
    pub fn unitary(matrix: Matrix, label: impl Into<String>) -> SimResult<Self> {
        let label = label.into();
        if !matrix.is_square() {
            return Err(SimError::Dimension(format!(
                "gate '{}' matrix is {}x{}",
                label,
                matrix.rows(),
                matrix.cols()
            )));
        }
        if matrix.rows() < 2 || !matrix.rows().is_power_of_two() {
            return Err(SimError::Dimension(format!(
                "gate '{}' dimension {} is not a power of two",
                label,
                matrix.rows()
            )));
        }
        if !matrix.is_unitary(UNITARY_TOLERANCE) {
            return Err(SimError::NotUnitary(label));
        }
        Ok(Gate::Unitary { matrix, label })
    }

    /// Raise `X` or `T` to a real power, the way the teleportation setup does.
    pub fn pow(&self, exponent: f64) -> SimResult<Self> {
        match self {
            Gate::X => Ok(Gate::XPow(exponent)),
            Gate::XPow(t) => Ok(Gate::XPow(t * exponent)),
            Gate::Z => Ok(Gate::ZPow(exponent)),
            Gate::S => Ok(Gate::ZPow(0.5 * exponent)),
            Gate::T => Ok(Gate::ZPow(0.25 * exponent)),
            Gate::ZPow(t) => Ok(Gate::ZPow(t * exponent)),
            other => Err(SimError::InvalidOperation(format!(
                "gate {} cannot be raised to a power",
                other.symbol()
            ))),
        }
    }

    /// Number of qubits the gate acts on.
    pub fn arity(&self) -> usize {
        match self {
            Gate::Cnot | Gate::Cz => 2,
            Gate::Unitary { matrix, .. } => matrix.rows().trailing_zeros() as usize,
            _ => 1,
        }
    }

    /// Unitary matrix of the gate, `None` for measurement.
    pub fn matrix(&self) -> Option<Matrix> {
        let c = |re: f64, im: f64| Complex64::new(re, im);
        let rows = match self {
            Gate::H => vec![
                vec![c(FRAC_1_SQRT_2, 0.0), c(FRAC_1_SQRT_2, 0.0)],
                vec![c(FRAC_1_SQRT_2, 0.0), c(-FRAC_1_SQRT_2, 0.0)],
            ],
            Gate::X => vec![vec![ZERO, ONE], vec![ONE, ZERO]],
            Gate::Y => vec![vec![ZERO, c(0.0, -1.0)], vec![c(0.0, 1.0), ZERO]],
            Gate::Z => vec![vec![ONE, ZERO], vec![ZERO, c(-1.0, 0.0)]],
            Gate::S => vec![vec![ONE, ZERO], vec![ZERO, c(0.0, 1.0)]],
            Gate::T => vec![vec![ONE, ZERO], vec![ZERO, Complex64::from_polar(1.0, PI / 4.0)]],
            Gate::XPow(t) => {
                let phase = Complex64::from_polar(1.0, PI * t);
                let plus = (ONE + phase) * 0.5;
                let minus = (ONE - phase) * 0.5;
                vec![vec![plus, minus], vec![minus, plus]]
            }
            Gate::ZPow(t) => vec![vec![ONE, ZERO], vec![ZERO, Complex64::from_polar(1.0, PI * t)]],
            Gate::Cnot => vec![
                vec![ONE, ZERO, ZERO, ZERO],
                vec![ZERO, ONE, ZERO, ZERO],
                vec![ZERO, ZERO, ZERO, ONE],
                vec![ZERO, ZERO, ONE, ZERO],
            ],
            Gate::Cz => vec![
                vec![ONE, ZERO, ZERO, ZERO],
                vec![ZERO, ONE, ZERO, ZERO],
                vec![ZERO, ZERO, ONE, ZERO],
                vec![ZERO, ZERO, ZERO, c(-1.0, 0.0)],
            ],
            Gate::Unitary { matrix, .. } => return Some(matrix.clone()),
            Gate::Measure => return None,
        };
        Matrix::from_rows(rows).ok()
    }

    /// Short label used in logs and circuit diagrams.
    pub fn symbol(&self) -> String {
        match self {
            Gate::H => "H".to_string(),
            Gate::X => "X".to_string(),
            Gate::Y => "Y".to_string(),
            Gate::Z => "Z".to_string(),
            Gate::S => "S".to_string(),
            Gate::T => "T".to_string(),
            Gate::XPow(t) => format!("X^{}", trim_float(*t)),
            Gate::ZPow(t) => format!("Z^{}", trim_float(*t)),
            Gate::Cnot => "CNOT".to_string(),
            Gate::Cz => "CZ".to_string(),
            Gate::Unitary { label, .. } => label.clone(),
            Gate::Measure => "M".to_string(),
        }
    }

    /// Per-wire symbols for a diagram column, one entry per target.
    pub fn wire_symbols(&self) -> Vec<String> {
        match self {
            Gate::Cnot => vec!["@".to_string(), "X".to_string()],
            Gate::Cz => vec!["@".to_string(), "@".to_string()],
            Gate::Unitary { label, .. } => vec![label.clone(); self.arity()],
            other => vec![other.symbol()],
        }
    }

    pub fn is_measurement(&self) -> bool {
        matches!(self, Gate::Measure)
    }
}

fn trim_float(x: f64) -> String {
    let s = format!("{:.4}", x);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s.is_empty() || s == "-" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

/// A gate applied to concrete qubits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub gate: Gate,
    pub targets: Vec<Qubit>,
}

impl Operation {
    /// Bind `gate` to `targets`, checking arity and that targets are distinct.
    pub fn new(gate: Gate, targets: Vec<Qubit>) -> SimResult<Self> {
        if targets.len() != gate.arity() {
            return Err(SimError::InvalidOperation(format!(
                "{} acts on {} qubit(s), got {}",
                gate.symbol(),
                gate.arity(),
                targets.len()
            )));
        }
        for (i, q) in targets.iter().enumerate() {
            if targets[..i].contains(q) {
                return Err(SimError::InvalidOperation(format!(
                    "{} applied twice to qubit '{}'",
                    gate.symbol(),
                    q.name
                )));
            }
        }
        Ok(Self { gate, targets })
    }

    /// Register indices the operation touches.
    pub fn indices(&self) -> Vec<usize> {
        self.targets.iter().map(|q| q.index).collect()
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.targets.iter().map(|q| q.name.as_str()).collect();
        write!(f, "{}({})", self.gate.symbol(), names.join(", "))
    }
}
