//! qsim core
//!
//! Step-by-step simulation of small quantum circuits for teaching.
//!
//! This crate provides:
//! - Dense complex linear algebra and a state-vector simulator
//! - Gates, registers and moment-based circuits with text diagrams
//! - Entanglement detection for two- and three-qubit pure states
//! - Built-in scenarios (Bell pair, teleportation, Deutsch-Jozsa) and a
//!   session that steps through them

pub mod circuit;
pub mod entanglement;
pub mod error;
pub mod gate;
pub mod linalg;
pub mod registry;
pub mod scenario;
pub mod scenarios;
pub mod session;
pub mod simulator;
pub mod state;

pub use circuit::{Circuit, Moment};
pub use entanglement::Entanglement;
pub use error::{SimError, SimResult};
pub use gate::{Gate, Operation, Qubit, Register};
pub use linalg::Matrix;
pub use registry::{ScenarioConfig, ScenarioFactory, ScenarioRegistry};
pub use scenario::{History, Scenario, ScriptedStep};
pub use session::{Session, StepReport, Verdict};
pub use simulator::{SimulationStep, Simulator};
pub use state::StateVector;
