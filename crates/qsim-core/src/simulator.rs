//! Moment-by-moment state-vector simulation.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::circuit::Circuit;
use crate::error::{SimError, SimResult};
use crate::gate::{Gate, Operation};
use crate::state::StateVector;

/// Snapshot of the simulation after a moment has been applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationStep {
    /// Index of the moment that produced this snapshot.
    pub moment_index: usize,
    /// State after the moment.
    pub state: StateVector,
    /// Every measurement taken so far, keyed by qubit name.
    pub measurements: BTreeMap<String, bool>,
}

/// State-vector simulator with its own measurement RNG.
#[derive(Debug)]
pub struct Simulator {
    rng: StdRng,
    seed: Option<u64>,
}

impl Simulator {
    /// Simulator with an entropy-seeded RNG.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            seed: None,
        }
    }

    /// Simulator whose measurement outcomes are reproducible.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed: Some(seed),
        }
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Iterate over the circuit one moment at a time.
    pub fn simulate_moment_steps<'a>(&'a mut self, circuit: &'a Circuit) -> MomentSteps<'a> {
        MomentSteps {
            execution: Execution::new(circuit),
            circuit,
            simulator: self,
        }
    }

    /// Run the whole circuit and return the final snapshot.
    pub fn simulate(&mut self, circuit: &Circuit) -> SimResult<SimulationStep> {
        let mut last = SimulationStep {
            moment_index: 0,
            state: StateVector::zero(circuit.register().len()),
            measurements: BTreeMap::new(),
        };
        for step in self.simulate_moment_steps(circuit) {
            let step = step?;
            tracing::debug!(moment = step.moment_index, state = %step.state.dirac_notation(4), "Moment simulated");
            last = step;
        }
        Ok(last)
    }

    /// Apply the next moment of `circuit` to `execution`.
    ///
    /// Returns `None` once every moment has been applied.
    pub fn step(
        &mut self,
        circuit: &Circuit,
        execution: &mut Execution,
    ) -> Option<SimResult<SimulationStep>> {
        let index = execution.next;
        let moment = circuit.moments().get(index)?;
        execution.next += 1;
        for op in moment.operations() {
            if let Err(e) = self.apply(op, execution) {
                return Some(Err(e));
            }
        }
        Some(Ok(SimulationStep {
            moment_index: index,
            state: execution.state.clone(),
            measurements: execution.measurements.clone(),
        }))
    }

    fn apply(&mut self, op: &Operation, execution: &mut Execution) -> SimResult<()> {
        match &op.gate {
            Gate::Measure => {
                let qubit = op.targets.first().ok_or_else(|| {
                    SimError::InvalidOperation("measurement without a target".to_string())
                })?;
                let outcome = execution.state.measure(qubit.index, &mut self.rng)?;
                tracing::debug!(qubit = %qubit.name, outcome, "Qubit measured");
                execution.measurements.insert(qubit.name.clone(), outcome);
            }
            gate => {
                let matrix = gate.matrix().ok_or_else(|| {
                    SimError::InvalidOperation(format!("gate {} has no matrix", gate.symbol()))
                })?;
                execution.state.apply(&matrix, &op.indices())?;
            }
        }
        Ok(())
    }
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new()
    }
}

/// Progress of one circuit through a [`Simulator`].
#[derive(Debug, Clone)]
pub struct Execution {
    state: StateVector,
    measurements: BTreeMap<String, bool>,
    next: usize,
}

impl Execution {
    /// Fresh execution starting from `|0…0⟩`.
    pub fn new(circuit: &Circuit) -> Self {
        Self {
            state: StateVector::zero(circuit.register().len()),
            measurements: BTreeMap::new(),
            next: 0,
        }
    }

    pub fn state(&self) -> &StateVector {
        &self.state
    }

    /// Number of moments applied so far.
    pub fn position(&self) -> usize {
        self.next
    }

    pub fn is_finished(&self, circuit: &Circuit) -> bool {
        self.next >= circuit.len()
    }
}

/// Iterator returned by [`Simulator::simulate_moment_steps`].
pub struct MomentSteps<'a> {
    circuit: &'a Circuit,
    simulator: &'a mut Simulator,
    execution: Execution,
}

impl Iterator for MomentSteps<'_> {
    type Item = SimResult<SimulationStep>;

    fn next(&mut self) -> Option<Self::Item> {
        self.simulator.step(self.circuit, &mut self.execution)
    }
}
