//! Step-by-step execution of a scenario.
//!
//! A [`Session`] owns the scenario, its circuit and a simulator. Each call to
//! [`Session::step`] applies one scripted operation, runs entanglement
//! detection on the new state and reports what happened.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::circuit::Circuit;
use crate::error::{SimError, SimResult};
use crate::gate::Qubit;
use crate::linalg::round_to;
use crate::scenario::{History, Scenario, ScriptedStep};
use crate::simulator::{Execution, SimulationStep, Simulator};
use crate::state::StateVector;

/// Decimal places kept for recorded Bloch vectors.
pub const BLOCH_DECIMALS: usize = 6;
/// Decimal places used when logging the state vector.
pub const LOG_DECIMALS: usize = 4;

/// Bloch vector of one qubit after a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QubitBloch {
    pub name: String,
    pub vector: [f64; 3],
    pub entangled: bool,
}

/// Outcome of a measurement performed in a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Measurement {
    pub qubit: String,
    pub outcome: bool,
}

/// Everything observable after one step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepReport {
    /// Zero-based step index.
    pub index: usize,
    pub description: String,
    /// The operation applied, e.g. `CNOT(alice, bob)`.
    pub operation: String,
    pub state: StateVector,
    pub bloch: Vec<QubitBloch>,
    /// Qubits currently considered entangled, in register order.
    pub entangled: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measured: Option<Measurement>,
}

impl StepReport {
    pub fn is_entangled(&self) -> bool {
        !self.entangled.is_empty()
    }
}

/// Final judgement once the script is exhausted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub success: bool,
    pub message: String,
}

/// Results of a step that has not been recorded yet.
struct Observation {
    sim_step: SimulationStep,
    detected: Vec<Qubit>,
    vectors: Vec<[f64; 3]>,
    measured: Option<Measurement>,
}

/// A scenario being stepped through.
pub struct Session {
    scenario: Box<dyn Scenario>,
    script: Vec<ScriptedStep>,
    circuit: Circuit,
    simulator: Simulator,
    execution: Execution,
    history: History,
    entangled: BTreeSet<Qubit>,
}

impl Session {
    /// Prepare `scenario` for stepping with `simulator`.
    pub fn new(scenario: Box<dyn Scenario>, simulator: Simulator) -> SimResult<Self> {
        let script = scenario.script()?;
        let circuit = scenario.circuit()?;
        tracing::info!(
            scenario = scenario.name(),
            steps = script.len(),
            seed = ?simulator.seed(),
            "Initial quantum circuit:\n{}",
            circuit
        );
        let execution = Execution::new(&circuit);
        Ok(Self {
            scenario,
            script,
            circuit,
            simulator,
            execution,
            history: History::default(),
            entangled: BTreeSet::new(),
        })
    }

    pub fn scenario(&self) -> &dyn Scenario {
        self.scenario.as_ref()
    }

    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    pub fn script(&self) -> &[ScriptedStep] {
        &self.script
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Number of steps already taken.
    pub fn position(&self) -> usize {
        self.execution.position()
    }

    pub fn total_steps(&self) -> usize {
        self.script.len()
    }

    pub fn is_finished(&self) -> bool {
        self.execution.is_finished(&self.circuit)
    }

    /// Apply the next scripted step. Returns `Ok(None)` once the script is
    /// exhausted. On error the session stays at the step it was on.
    pub fn step(&mut self) -> SimResult<Option<StepReport>> {
        if self.is_finished() {
            return Ok(None);
        }
        tracing::info!("--- Next step ---");
        let checkpoint = self.execution.clone();
        let observed = match self.simulator.step(&self.circuit, &mut self.execution) {
            Some(step) => step.and_then(|step| self.observe(step)),
            None => return Ok(None),
        };
        match observed {
            Ok(observation) => Ok(Some(self.record(observation))),
            Err(e) => {
                self.execution = checkpoint;
                Err(e)
            }
        }
    }

    /// Everything fallible about a step, computed before any bookkeeping.
    fn observe(&self, sim_step: SimulationStep) -> SimResult<Observation> {
        let scripted = &self.script[sim_step.moment_index];
        let detected = self.scenario.detect_entanglement(&sim_step.state)?;

        let register = self.circuit.register();
        let mut vectors = Vec::with_capacity(register.len());
        for qubit in register.iter() {
            let raw = sim_step.state.bloch_vector_of(qubit.index)?;
            vectors.push(raw.map(|c| round_to(c, BLOCH_DECIMALS)));
        }

        let measured = match &scripted.measures {
            Some(q) => {
                let outcome = sim_step.measurements.get(&q.name).copied().ok_or_else(|| {
                    SimError::Session(format!("measurement of '{}' was not recorded", q.name))
                })?;
                Some(Measurement {
                    qubit: q.name.clone(),
                    outcome,
                })
            }
            None => None,
        };

        tracing::info!(state = %sim_step.state.dirac_notation(LOG_DECIMALS), "State vector for the current step");
        tracing::info!(bloch = ?vectors, "Bloch vectors for the current step");
        let density = sim_step.state.density_matrix_of(&[])?;
        tracing::info!("Density matrix for the current step:\n{}", density);

        Ok(Observation {
            sim_step,
            detected,
            vectors,
            measured,
        })
    }

    fn record(&mut self, observation: Observation) -> StepReport {
        let Observation {
            sim_step,
            detected,
            vectors,
            measured,
        } = observation;
        let scripted = &self.script[sim_step.moment_index];

        self.history.bloch.push(vectors.clone());
        self.entangled.extend(detected);
        if let Some(measured) = &scripted.measures {
            // A single qubit cannot be entangled with itself.
            if self.entangled.remove(measured) && self.entangled.len() <= 1 {
                self.entangled.clear();
            }
        }
        let entangled: Vec<String> = self.entangled.iter().map(|q| q.name.clone()).collect();
        tracing::info!(?entangled, "Qubits entangled in the current step");

        let bloch = self
            .circuit
            .register()
            .iter()
            .zip(vectors)
            .map(|(q, vector)| QubitBloch {
                name: q.name.clone(),
                vector,
                entangled: self.entangled.contains(q),
            })
            .collect();

        let report = StepReport {
            index: sim_step.moment_index,
            description: scripted.description.clone(),
            operation: scripted.operation.to_string(),
            state: sim_step.state.clone(),
            bloch,
            entangled,
            measured,
        };
        self.history.last = Some(sim_step);
        report
    }

    /// Step until the script is exhausted.
    pub fn run_to_end(&mut self) -> SimResult<Vec<StepReport>> {
        let mut reports = Vec::with_capacity(self.total_steps() - self.position());
        while let Some(report) = self.step()? {
            reports.push(report);
        }
        Ok(reports)
    }

    /// Evaluate the scenario's outcome. Only valid after the last step.
    pub fn finish(&self) -> SimResult<Verdict> {
        if !self.is_finished() {
            return Err(SimError::Session(format!(
                "scenario '{}' is at step {} of {}",
                self.scenario.name(),
                self.position(),
                self.total_steps()
            )));
        }
        let success = self.scenario.check_results(&self.history)?;
        let message = if success {
            self.scenario.success_message()
        } else {
            self.scenario.failure_message()
        };
        tracing::info!(scenario = self.scenario.name(), success, verdict = message, "Scenario finished");
        Ok(Verdict {
            success,
            message: message.to_string(),
        })
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("scenario", &self.scenario.name())
            .field("position", &self.position())
            .field("total_steps", &self.total_steps())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::{Gate, Register};
    use crate::scenarios::BellPair;

    fn bell_session(seed: u64) -> Session {
        Session::new(Box::new(BellPair::new().unwrap()), Simulator::seeded(seed)).unwrap()
    }

    #[test]
    fn test_bell_entanglement_tracking() {
        let mut session = bell_session(11);
        let first = session.step().unwrap().unwrap();
        assert_eq!(first.index, 0);
        assert!(!first.is_entangled());

        let second = session.step().unwrap().unwrap();
        assert_eq!(second.entangled, vec!["alice", "bob"]);
        assert!(second.bloch.iter().all(|b| b.entangled));

        let reports = session.run_to_end().unwrap();
        assert_eq!(reports.len(), 4);
        // Measuring Alice leaves Bob alone, so the set empties.
        let alice = &reports[2];
        assert_eq!(alice.measured.as_ref().unwrap().qubit, "alice");
        assert!(alice.entangled.is_empty());
        assert!(session.step().unwrap().is_none());
    }

    #[test]
    fn test_finish_requires_exhausted_script() {
        let mut session = bell_session(1);
        session.step().unwrap();
        assert!(matches!(session.finish(), Err(SimError::Session(_))));
        session.run_to_end().unwrap();
        let verdict = session.finish().unwrap();
        assert!(verdict.success);
        assert_eq!(verdict.message, "Nothing to check here ;)");
    }

    #[test]
    fn test_history_records_every_step() {
        let mut session = bell_session(5);
        session.run_to_end().unwrap();
        assert_eq!(session.history().bloch.len(), 6);
        assert!(session.history().last.is_some());
        assert_eq!(session.position(), session.total_steps());
    }

    #[test]
    fn test_report_serializes() {
        let mut session = bell_session(2);
        let report = session.step().unwrap().unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["operation"], "H(alice)");
        assert!(json.get("measured").is_none());
    }

    /// Reports entanglement only until the state leaves `|00⟩`, then fails.
    struct FlakyDetection {
        register: Register,
    }

    impl Scenario for FlakyDetection {
        fn name(&self) -> &'static str {
            "flaky"
        }

        fn title(&self) -> &'static str {
            "Detection that fails on the second step"
        }

        fn register(&self) -> &Register {
            &self.register
        }

        fn script(&self) -> SimResult<Vec<ScriptedStep>> {
            let r = &self.register;
            Ok(vec![
                ScriptedStep::new(r, Gate::Z, &["a"], "Leave |00⟩ alone")?,
                ScriptedStep::new(r, Gate::X, &["b"], "Flip b")?,
            ])
        }

        fn detect_entanglement(&self, state: &StateVector) -> SimResult<Vec<Qubit>> {
            if state.amplitude(0).norm() < 0.5 {
                return Err(SimError::Session("detector offline".to_string()));
            }
            Ok(Vec::new())
        }

        fn check_results(&self, _history: &History) -> SimResult<bool> {
            Ok(true)
        }

        fn success_message(&self) -> &'static str {
            "ok"
        }

        fn failure_message(&self) -> &'static str {
            "not ok"
        }
    }

    #[test]
    fn test_failed_step_leaves_session_in_place() {
        let scenario = FlakyDetection {
            register: Register::new(&["a", "b"]).unwrap(),
        };
        let mut session = Session::new(Box::new(scenario), Simulator::seeded(0)).unwrap();
        session.step().unwrap().unwrap();

        let err = session.step().unwrap_err();
        assert!(matches!(err, SimError::Session(_)));
        assert_eq!(session.position(), 1);
        assert_eq!(session.history().bloch.len(), 1);
        assert_eq!(session.history().last.as_ref().unwrap().moment_index, 0);
        assert!(!session.is_finished());

        // The same step fails again rather than being skipped.
        assert!(session.step().is_err());
        assert_eq!(session.position(), 1);
    }

    #[test]
    fn test_step_after_end_is_none() {
        let mut session = bell_session(4);
        session.run_to_end().unwrap();
        let recorded = session.history().bloch.len();
        assert!(session.step().unwrap().is_none());
        assert_eq!(session.history().bloch.len(), recorded);
    }
}
