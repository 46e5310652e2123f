//! Built-in scenarios.
//!
//! - `bell` - Bell pair between Alice and Bob, then measured
//! - `teleportation` - teleport a prepared qubit through a Bell pair
//! - `deutsch-jozsa` - constant-vs-balanced with a permutation oracle

mod bell;
mod deutsch_jozsa;
mod teleportation;

pub use self::bell::BellPair;
pub use self::deutsch_jozsa::{DeutschJozsa, Oracle, OracleInput, ORACLE_SIZE};
pub use self::teleportation::{SetupGate, Teleportation};
