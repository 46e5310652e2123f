//! Quantum teleportation of a prepared message qubit from Alice to Bob.

use serde::{Deserialize, Serialize};

use crate::entanglement::detect_tripartite;
use crate::error::{SimError, SimResult};
use crate::gate::{Gate, Qubit, Register};
use crate::scenario::{History, Scenario, ScriptedStep};
use crate::state::StateVector;

/// Largest per-component difference between Bloch vectors still counted as
/// a successful teleportation.
const BLOCH_TOLERANCE: f64 = 1e-6;

/// Gate raised to `phase` to prepare the message qubit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SetupGate {
    #[default]
    X,
    T,
}

impl SetupGate {
    fn gate(self) -> Gate {
        match self {
            SetupGate::X => Gate::X,
            SetupGate::T => Gate::T,
        }
    }
}

impl std::str::FromStr for SetupGate {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "x" => Ok(SetupGate::X),
            "t" => Ok(SetupGate::T),
            other => Err(SimError::Configuration(format!(
                "setup gate must be 'x' or 't', got '{}'",
                other
            ))),
        }
    }
}

/// Teleportation of `msg` onto `bob` through a shared Bell pair.
#[derive(Debug, Clone)]
pub struct Teleportation {
    register: Register,
    setup: SetupGate,
    phase: f64,
}

impl Teleportation {
    pub const NAME: &'static str = "teleportation";

    /// `phase` is the exponent applied to the setup gate, in `[0, 1]`.
    pub fn new(setup: SetupGate, phase: f64) -> SimResult<Self> {
        if !(0.0..=1.0).contains(&phase) {
            return Err(SimError::Configuration(format!(
                "phase must be within [0, 1], got {}",
                phase
            )));
        }
        tracing::info!(setup = ?setup, phase, "Teleportation configured");
        Ok(Self {
            register: Register::new(&["msg", "alice", "bob"])?,
            setup,
            phase,
        })
    }

    pub fn setup(&self) -> SetupGate {
        self.setup
    }

    pub fn phase(&self) -> f64 {
        self.phase
    }
}

impl Scenario for Teleportation {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn title(&self) -> &'static str {
        "Quantum teleportation"
    }

    fn register(&self) -> &Register {
        &self.register
    }

    fn script(&self) -> SimResult<Vec<ScriptedStep>> {
        let r = &self.register;
        let bell = "Initialise Alice's and Bob's qubits into a Bell state";
        let superpose = "Put the teleported qubit into superposition";
        let measure = "Measure the message and Alice's qubits";
        let correct = "Apply the state correction";
        Ok(vec![
            ScriptedStep::new(
                r,
                self.setup.gate().pow(self.phase)?,
                &["msg"],
                "Set the initial value of the message qubit",
            )?,
            ScriptedStep::new(r, Gate::H, &["alice"], bell)?,
            ScriptedStep::new(r, Gate::Cnot, &["alice", "bob"], bell)?,
            ScriptedStep::new(r, Gate::Cnot, &["msg", "alice"], superpose)?,
            ScriptedStep::new(r, Gate::H, &["msg"], superpose)?,
            ScriptedStep::new(r, Gate::Measure, &["msg"], measure)?,
            ScriptedStep::new(r, Gate::Measure, &["alice"], measure)?,
            ScriptedStep::new(r, Gate::Cnot, &["alice", "bob"], correct)?,
            ScriptedStep::new(r, Gate::Cz, &["msg", "bob"], correct)?,
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

    /// The message's Bloch vector right after preparation must reappear on
    /// Bob's qubit at the end.
    fn check_results(&self, history: &History) -> SimResult<bool> {
        let msg = self.register.qubit("msg")?.index;
        let bob = self.register.qubit("bob")?.index;
        let (first, last) = match (history.bloch.first(), history.bloch.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(SimError::Session("no steps were recorded".to_string())),
        };
        Ok(first[msg]
            .iter()
            .zip(last[bob].iter())
            .all(|(a, b)| (a - b).abs() <= BLOCH_TOLERANCE))
    }

    fn success_message(&self) -> &'static str {
        "Teleportation succeeded!"
    }

    fn failure_message(&self) -> &'static str {
        "Oops, teleportation failed..."
    }
}
