//! Scenario trait: a scripted circuit with narration and a success check.

use serde::{Deserialize, Serialize};

use crate::circuit::Circuit;
use crate::error::SimResult;
use crate::gate::{Gate, Operation, Qubit, Register};
use crate::simulator::SimulationStep;
use crate::state::StateVector;

/// One operation of a scenario together with its narration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptedStep {
    pub operation: Operation,
    pub description: String,
    /// Qubit read out by this step, if any.
    pub measures: Option<Qubit>,
}

impl ScriptedStep {
    /// Build a step from qubit names. Measurement steps record their target
    /// as the measured qubit.
    pub fn new(register: &Register, gate: Gate, targets: &[&str], description: &str) -> SimResult<Self> {
        let qubits = targets
            .iter()
            .map(|name| register.qubit(name))
            .collect::<SimResult<Vec<_>>>()?;
        let measures = if gate.is_measurement() {
            qubits.first().cloned()
        } else {
            None
        };
        Ok(Self {
            operation: Operation::new(gate, qubits)?,
            description: description.to_string(),
            measures,
        })
    }
}

/// What a session has recorded by the time the script is exhausted.
#[derive(Debug, Clone, Default)]
pub struct History {
    /// Bloch vectors of every qubit (register order) after each step,
    /// rounded to 6 decimals.
    pub bloch: Vec<Vec<[f64; 3]>>,
    /// The final simulator snapshot.
    pub last: Option<SimulationStep>,
}

/// A teaching scenario that can be stepped through by a session.
pub trait Scenario: Send + Sync {
    /// Registry key, e.g. `"teleportation"`.
    fn name(&self) -> &'static str;

    /// Human readable title.
    fn title(&self) -> &'static str;

    fn register(&self) -> &Register;

    /// The ordered steps. Each becomes one moment of the circuit.
    fn script(&self) -> SimResult<Vec<ScriptedStep>>;

    /// Qubits found to be entangled in `state`.
    fn detect_entanglement(&self, state: &StateVector) -> SimResult<Vec<Qubit>>;

    /// Evaluate the outcome once the script is exhausted.
    fn check_results(&self, history: &History) -> SimResult<bool>;

    fn success_message(&self) -> &'static str;

    fn failure_message(&self) -> &'static str;

    /// Build the circuit, one moment per scripted step.
    fn circuit(&self) -> SimResult<Circuit> {
        let mut circuit = Circuit::new(self.register().clone());
        for step in self.script()? {
            circuit.push_new_moment(step.operation)?;
        }
        Ok(circuit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_step_records_measurement() {
        let reg = Register::new(&["q1", "q2"]).unwrap();
        let step = ScriptedStep::new(&reg, Gate::Measure, &["q2"], "Final measurement").unwrap();
        assert_eq!(step.measures.as_ref().map(|q| q.name.as_str()), Some("q2"));

        let step = ScriptedStep::new(&reg, Gate::Cnot, &["q1", "q2"], "Entangle").unwrap();
        assert!(step.measures.is_none());
        assert_eq!(step.operation.to_string(), "CNOT(q1, q2)");
    }

    #[test]
    fn test_scripted_step_unknown_qubit() {
        let reg = Register::new(&["q1"]).unwrap();
        assert!(ScriptedStep::new(&reg, Gate::H, &["q9"], "oops").is_err());
    }
}
