//! Simulation error types.

use thiserror::Error;

/// Errors that can occur while building or running a simulation.
#[derive(Debug, Error)]
pub enum SimError {
    /// Matrix or state dimensions do not line up.
    #[error("Dimension mismatch: {0}")]
    Dimension(String),

    /// A qubit name is not part of the register.
    #[error("Unknown qubit: {0}")]
    UnknownQubit(String),

    /// A register was declared with an invalid qubit list.
    #[error("Invalid register: {0}")]
    InvalidRegister(String),

    /// An operation does not fit its gate (arity, repeated targets).
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// A matrix supplied as a gate is not unitary.
    #[error("Matrix is not unitary: {0}")]
    NotUnitary(String),

    /// The oracle digit sequence was rejected.
    #[error("Invalid oracle: {0}")]
    InvalidOracle(String),

    /// Scenario not found in registry.
    #[error("Scenario not found: {0}")]
    UnknownScenario(String),

    /// Scenario parameters are out of range.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The session was driven out of order.
    #[error("Session error: {0}")]
    Session(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(String),
}

/// Result type alias using SimError.
pub type SimResult<T> = Result<T, SimError>;

impl From<serde_json::Error> for SimError {
    fn from(e: serde_json::Error) -> Self {
        SimError::Json(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SimError::UnknownScenario("grover".to_string());
        assert_eq!(err.to_string(), "Scenario not found: grover");

        let err = SimError::UnknownQubit("carol".to_string());
        assert_eq!(err.to_string(), "Unknown qubit: carol");
    }

    #[test]
    fn test_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let sim_err: SimError = json_err.into();
        assert!(matches!(sim_err, SimError::Json(_)));
    }
}
