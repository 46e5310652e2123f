//! Two qubits put into a Bell state, operated on, then measured.

use crate::entanglement::detect_bipartite;
use crate::error::SimResult;
use crate::gate::{Gate, Qubit, Register};
use crate::scenario::{History, Scenario, ScriptedStep};
use crate::state::StateVector;

const PREPARE: &str = "Put the qubits into a Bell state";

/// Simple entanglement between Alice's and Bob's qubits.
#[derive(Debug, Clone)]
pub struct BellPair {
    register: Register,
}

impl BellPair {
    pub const NAME: &'static str = "bell";

    pub fn new() -> SimResult<Self> {
        Ok(Self {
            register: Register::new(&["alice", "bob"])?,
        })
    }
}

impl Scenario for BellPair {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn title(&self) -> &'static str {
        "Simple entanglement"
    }

    fn register(&self) -> &Register {
        &self.register
    }

    fn script(&self) -> SimResult<Vec<ScriptedStep>> {
        let r = &self.register;
        Ok(vec![
            ScriptedStep::new(r, Gate::H, &["alice"], PREPARE)?,
            ScriptedStep::new(r, Gate::Cnot, &["alice", "bob"], PREPARE)?,
            ScriptedStep::new(r, Gate::Z, &["alice"], "Operate on Alice's entangled qubit")?,
            ScriptedStep::new(r, Gate::Z, &["bob"], "Operate on Bob's entangled qubit")?,
            ScriptedStep::new(r, Gate::Measure, &["alice"], "Measure Alice's qubit")?,
            ScriptedStep::new(r, Gate::Measure, &["bob"], "Measure Bob's qubit")?,
        ])
    }

    fn detect_entanglement(&self, state: &StateVector) -> SimResult<Vec<Qubit>> {
        if detect_bipartite(state)? {
            Ok(self.register.iter().cloned().collect())
        } else {
            Ok(Vec::new())
        }
    }

    fn check_results(&self, _history: &History) -> SimResult<bool> {
        Ok(true)
    }

    fn success_message(&self) -> &'static str {
        "Nothing to check here ;)"
    }

    fn failure_message(&self) -> &'static str {
        "Hey, why are you even seeing this?"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_shape() {
        let bell = BellPair::new().unwrap();
        let script = bell.script().unwrap();
        assert_eq!(script.len(), 6);
        assert_eq!(script.iter().filter(|s| s.measures.is_some()).count(), 2);
        assert_eq!(bell.circuit().unwrap().len(), 6);
    }

    #[test]
    fn test_detects_bell_pair() {
        let bell = BellPair::new().unwrap();
        let mut state = StateVector::zero(2);
        assert!(bell.detect_entanglement(&state).unwrap().is_empty());

        state.apply(&Gate::H.matrix().unwrap(), &[0]).unwrap();
        state.apply(&Gate::Cnot.matrix().unwrap(), &[0, 1]).unwrap();
        let entangled = bell.detect_entanglement(&state).unwrap();
        let names: Vec<&str> = entangled.iter().map(|q| q.name.as_str()).collect();
        assert_eq!(names, vec!["alice", "bob"]);
    }
}
