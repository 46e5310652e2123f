//! Deutsch-Jozsa algorithm on two input qubits and one control qubit.
//!
//! The oracle `Uf` is given as a permutation of the eight basis states,
//! written as eight distinct digits from 1 to 8. Digit `r` names the column
//! holding the `1` in row `r` of the unitary.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entanglement::detect_tripartite;
use crate::error::{SimError, SimResult};
use crate::gate::{Gate, Qubit, Register};
use crate::linalg::{Matrix, ONE};
use crate::scenario::{History, Scenario, ScriptedStep};
use crate::state::StateVector;

/// Number of basis states the oracle permutes.
pub const ORACLE_SIZE: usize = 8;

/// Result of checking a (possibly partial) oracle digit sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OracleInput {
    /// A complete permutation.
    Acceptable,
    /// A repeat-free prefix that can still be completed.
    Intermediate,
    /// Contains a foreign character or a repeated digit.
    Invalid,
}

impl fmt::Display for OracleInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Acceptable => write!(f, "acceptable"),
            Self::Intermediate => write!(f, "intermediate"),
            Self::Invalid => write!(f, "invalid"),
        }
    }
}

/// Permutation oracle on three qubits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Oracle {
    digits: [u8; ORACLE_SIZE],
}

impl Oracle {
    /// Classify user input as it is being typed.
    pub fn validate(input: &str) -> OracleInput {
        let mut seen = [false; ORACLE_SIZE];
        let mut count = 0;
        for ch in input.chars() {
            let digit = match ch.to_digit(10) {
                Some(d @ 1..=8) => d as usize,
                _ => return OracleInput::Invalid,
            };
            if seen[digit - 1] {
                return OracleInput::Invalid;
            }
            seen[digit - 1] = true;
            count += 1;
        }
        if count == ORACLE_SIZE {
            OracleInput::Acceptable
        } else {
            OracleInput::Intermediate
        }
    }

    /// Parse a complete digit sequence.
    pub fn parse(input: &str) -> SimResult<Self> {
        match Self::validate(input) {
            OracleInput::Acceptable => {}
            OracleInput::Intermediate => {
                return Err(SimError::InvalidOracle(format!(
                    "'{}' is incomplete, {} distinct digits from 1 to 8 are needed",
                    input, ORACLE_SIZE
                )))
            }
            OracleInput::Invalid => {
                return Err(SimError::InvalidOracle(format!(
                    "'{}' must use each digit from 1 to 8 at most once",
                    input
                )))
            }
        }
        let mut digits = [0u8; ORACLE_SIZE];
        for (slot, ch) in digits.iter_mut().zip(input.chars()) {
            *slot = ch as u8 - b'0';
        }
        Ok(Self { digits })
    }

    /// The identity permutation, a constant `f(x) = 0`.
    pub fn identity() -> Self {
        Self {
            digits: [1, 2, 3, 4, 5, 6, 7, 8],
        }
    }

    pub fn digits(&self) -> &[u8; ORACLE_SIZE] {
        &self.digits
    }

    /// Permutation matrix of the oracle.
    pub fn matrix(&self) -> Matrix {
        let mut m = Matrix::zeros(ORACLE_SIZE, ORACLE_SIZE);
        for (row, &digit) in self.digits.iter().enumerate() {
            m.set(row, usize::from(digit) - 1, ONE);
        }
        m
    }

    /// The oracle as a three-qubit gate labelled `Uf`.
    pub fn gate(&self) -> SimResult<Gate> {
        Gate::unitary(self.matrix(), "Uf")
    }
}

impl fmt::Display for Oracle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for d in &self.digits {
            write!(f, "{}", d)?;
        }
        Ok(())
    }
}

impl std::str::FromStr for Oracle {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Deutsch-Jozsa: decide whether the oracle's function is constant or
/// balanced with a single query.
#[derive(Debug, Clone)]
pub struct DeutschJozsa {
    register: Register,
    oracle: Oracle,
}

impl DeutschJozsa {
    pub const NAME: &'static str = "deutsch-jozsa";

    pub fn new(oracle: Oracle) -> SimResult<Self> {
        tracing::info!(oracle = %oracle, "Deutsch-Jozsa configured");
        Ok(Self {
            register: Register::new(&["q1", "q2", "control"])?,
            oracle,
        })
    }

    pub fn oracle(&self) -> &Oracle {
        &self.oracle
    }
}

impl Scenario for DeutschJozsa {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn title(&self) -> &'static str {
        "Deutsch-Jozsa algorithm"
    }

    fn register(&self) -> &Register {
        &self.register
    }

    fn script(&self) -> SimResult<Vec<ScriptedStep>> {
        let r = &self.register;
        let hadamard = "Apply a Hadamard gate to every qubit";
        let again = "Apply the Hadamard gates again";
        let measure = "Final measurement";
        Ok(vec![
            ScriptedStep::new(r, Gate::X, &["control"], "Set the control qubit to |1>")?,
            ScriptedStep::new(r, Gate::H, &["q1"], hadamard)?,
            ScriptedStep::new(r, Gate::H, &["q2"], hadamard)?,
            ScriptedStep::new(r, Gate::H, &["control"], hadamard)?,
            ScriptedStep::new(r, self.oracle.gate()?, &["q1", "q2", "control"], "Oracle query")?,
            ScriptedStep::new(r, Gate::H, &["q1"], again)?,
            ScriptedStep::new(r, Gate::H, &["q2"], again)?,
            ScriptedStep::new(r, Gate::H, &["control"], again)?,
            ScriptedStep::new(r, Gate::Measure, &["q1"], measure)?,
            ScriptedStep::new(r, Gate::Measure, &["q2"], measure)?,
            ScriptedStep::new(r, Gate::Measure, &["control"], measure)?,
        ])
    }

    fn detect_entanglement(&self, state: &StateVector) -> SimResult<Vec<Qubit>> {
        let class = detect_tripartite(state, [0, 1, 2])?;
        if class.is_entangled() {
            tracing::info!(kind = class.kind(), "Entanglement detected");
        }
        let qubits: Vec<Qubit> = self.register.iter().cloned().collect();
        Ok(class.qubits().into_iter().map(|i| qubits[i].clone()).collect())
    }

    /// Success means the function is constant: both inputs read back 0.
    fn check_results(&self, history: &History) -> SimResult<bool> {
        let last = history
            .last
            .as_ref()
            .ok_or_else(|| SimError::Session("no steps were recorded".to_string()))?;
        let read = |name: &str| {
            last.measurements
                .get(name)
                .copied()
                .ok_or_else(|| SimError::Session(format!("qubit '{}' was never measured", name)))
        };
        Ok(!read("q1")? && !read("q2")?)
    }

    fn success_message(&self) -> &'static str {
        "The function is constant"
    }

    fn failure_message(&self) -> &'static str {
        "The function is balanced"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_states() {
        assert_eq!(Oracle::validate("12345678"), OracleInput::Acceptable);
        assert_eq!(Oracle::validate("87654321"), OracleInput::Acceptable);
        assert_eq!(Oracle::validate(""), OracleInput::Intermediate);
        assert_eq!(Oracle::validate("123"), OracleInput::Intermediate);
        assert_eq!(Oracle::validate("1231"), OracleInput::Invalid);
        assert_eq!(Oracle::validate("12345679"), OracleInput::Invalid);
        assert_eq!(Oracle::validate("0"), OracleInput::Invalid);
        assert_eq!(Oracle::validate("12a"), OracleInput::Invalid);
    }

    #[test]
    fn test_parse_rejects_partial_input() {
        assert!(matches!(Oracle::parse("1234"), Err(SimError::InvalidOracle(_))));
        assert!(matches!(Oracle::parse("11345678"), Err(SimError::InvalidOracle(_))));
        let oracle: Oracle = "21436587".parse().unwrap();
        assert_eq!(oracle.to_string(), "21436587");
    }

    #[test]
    fn test_oracle_matrix_rows() {
        let oracle = Oracle::parse("21345678").unwrap();
        let m = oracle.matrix();
        assert_eq!(m.get(0, 1), ONE);
        assert_eq!(m.get(1, 0), ONE);
        assert_eq!(m.get(2, 2), ONE);
        assert!(m.is_unitary(1e-12));
        assert_eq!(oracle.gate().unwrap().arity(), 3);
    }

    #[test]
    fn test_identity_oracle() {
        assert_eq!(Oracle::identity(), Oracle::parse("12345678").unwrap());
        assert_eq!(Oracle::identity().matrix(), Matrix::identity(8));
    }

    #[test]
    fn test_script_contains_oracle() {
        let dj = DeutschJozsa::new(Oracle::identity()).unwrap();
        let script = dj.script().unwrap();
        assert_eq!(script.len(), 11);
        assert_eq!(script[4].operation.gate.symbol(), "Uf");
        assert_eq!(script[4].operation.targets.len(), 3);
    }
}
