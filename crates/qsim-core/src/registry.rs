//! Scenario registry and construction from configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{SimError, SimResult};
use crate::scenario::Scenario;
use crate::scenarios::{BellPair, DeutschJozsa, Oracle, SetupGate, Teleportation};

/// Parameters for building a scenario.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Scenario kind (e.g., "bell", "teleportation", "deutsch-jozsa").
    #[serde(default)]
    pub kind: String,

    /// Setup gate for teleportation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gate: Option<SetupGate>,

    /// Exponent for the setup gate, within [0, 1].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<f64>,

    /// Oracle digits for Deutsch-Jozsa.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oracle: Option<String>,
}

fn default_phase() -> f64 {
    1.0
}

fn default_oracle() -> String {
    "12345678".to_string()
}

impl ScenarioConfig {
    /// Config for `kind` with every parameter left at its default.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Self::default()
        }
    }

    pub fn with_gate(mut self, gate: SetupGate) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn with_phase(mut self, phase: f64) -> Self {
        self.phase = Some(phase);
        self
    }

    pub fn with_oracle(mut self, oracle: impl Into<String>) -> Self {
        self.oracle = Some(oracle.into());
        self
    }

    pub fn gate_or_default(&self) -> SetupGate {
        self.gate.unwrap_or_default()
    }

    pub fn phase_or_default(&self) -> f64 {
        self.phase.unwrap_or_else(default_phase)
    }

    pub fn oracle_or_default(&self) -> String {
        self.oracle.clone().unwrap_or_else(default_oracle)
    }
}

/// Builds one kind of scenario from its configuration.
pub trait ScenarioFactory: Send + Sync {
    /// Returns the scenario's unique name/kind.
    fn name(&self) -> &'static str;

    /// Human readable title.
    fn title(&self) -> &'static str;

    /// Construct the scenario.
    fn build(&self, config: &ScenarioConfig) -> SimResult<Box<dyn Scenario>>;
}

struct BellFactory;

impl ScenarioFactory for BellFactory {
    fn name(&self) -> &'static str {
        BellPair::NAME
    }

    fn title(&self) -> &'static str {
        "Simple entanglement"
    }

    fn build(&self, _config: &ScenarioConfig) -> SimResult<Box<dyn Scenario>> {
        Ok(Box::new(BellPair::new()?))
    }
}

struct TeleportationFactory;

impl ScenarioFactory for TeleportationFactory {
    fn name(&self) -> &'static str {
        Teleportation::NAME
    }

    fn title(&self) -> &'static str {
        "Quantum teleportation"
    }

    fn build(&self, config: &ScenarioConfig) -> SimResult<Box<dyn Scenario>> {
        Ok(Box::new(Teleportation::new(
            config.gate_or_default(),
            config.phase_or_default(),
        )?))
    }
}

struct DeutschJozsaFactory;

impl ScenarioFactory for DeutschJozsaFactory {
    fn name(&self) -> &'static str {
        DeutschJozsa::NAME
    }

    fn title(&self) -> &'static str {
        "Deutsch-Jozsa algorithm"
    }

    fn build(&self, config: &ScenarioConfig) -> SimResult<Box<dyn Scenario>> {
        let oracle = Oracle::parse(&config.oracle_or_default())?;
        Ok(Box::new(DeutschJozsa::new(oracle)?))
    }
}

/// Registry of available scenarios.
pub struct ScenarioRegistry {
    factories: BTreeMap<String, Arc<dyn ScenarioFactory>>,
}

impl ScenarioRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Create a registry with the built-in scenarios registered.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(BellFactory);
        registry.register(TeleportationFactory);
        registry.register(DeutschJozsaFactory);
        registry
    }

    /// Register a factory, replacing any previous one with the same name.
    pub fn register<F: ScenarioFactory + 'static>(&mut self, factory: F) {
        let name = factory.name().to_string();
        self.factories.insert(name, Arc::new(factory));
    }

    /// Get a factory by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn ScenarioFactory>> {
        self.factories.get(name).cloned()
    }

    /// Check if a scenario is registered.
    pub fn has(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// List `(name, title)` of all registered scenarios, sorted by name.
    pub fn list(&self) -> Vec<(&str, &'static str)> {
        self.factories
            .iter()
            .map(|(name, f)| (name.as_str(), f.title()))
            .collect()
    }

    /// Build a scenario from config (uses config.kind as the scenario name).
    pub fn build(&self, config: &ScenarioConfig) -> SimResult<Box<dyn Scenario>> {
        let factory = self
            .get(&config.kind)
            .ok_or_else(|| SimError::UnknownScenario(config.kind.clone()))?;
        tracing::debug!(kind = %config.kind, ?config, "Building scenario");
        factory.build(config)
    }
}

impl Default for ScenarioRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl std::fmt::Debug for ScenarioRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScenarioRegistry")
            .field("scenarios", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_new() {
        let registry = ScenarioRegistry::new();
        assert!(registry.list().is_empty());
    }

    #[test]
    fn test_registry_builtins() {
        let registry = ScenarioRegistry::with_builtins();
        assert!(registry.has("bell"));
        assert!(registry.has("teleportation"));
        assert!(registry.has("deutsch-jozsa"));
        assert!(!registry.has("grover"));
        let names: Vec<&str> = registry.list().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["bell", "deutsch-jozsa", "teleportation"]);
    }

    #[test]
    fn test_registry_build_not_found() {
        let registry = ScenarioRegistry::with_builtins();
        let result = registry.build(&ScenarioConfig::new("grover"));
        assert!(matches!(result, Err(SimError::UnknownScenario(_))));
    }

    #[test]
    fn test_registry_build_with_params() {
        let registry = ScenarioRegistry::with_builtins();
        let scenario = registry
            .build(&ScenarioConfig::new("teleportation").with_gate(SetupGate::T).with_phase(0.3))
            .unwrap();
        assert_eq!(scenario.name(), "teleportation");

        let bad = registry.build(&ScenarioConfig::new("deutsch-jozsa").with_oracle("1123"));
        assert!(matches!(bad, Err(SimError::InvalidOracle(_))));

        let bad = registry.build(&ScenarioConfig::new("teleportation").with_phase(2.0));
        assert!(matches!(bad, Err(SimError::Configuration(_))));
    }

    #[test]
    fn test_config_defaults() {
        let config = ScenarioConfig::new("teleportation");
        assert_eq!(config.gate_or_default(), SetupGate::X);
        assert_eq!(config.phase_or_default(), 1.0);
        assert_eq!(config.oracle_or_default(), "12345678");
    }

    #[test]
    fn test_config_serialization() {
        let config = ScenarioConfig::new("teleportation").with_gate(SetupGate::T);
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"kind\":\"teleportation\""));
        assert!(json.contains("\"gate\":\"t\""));
        assert!(!json.contains("phase"));

        let parsed: ScenarioConfig =
            serde_json::from_str(r#"{"kind":"deutsch-jozsa","oracle":"21436587"}"#).unwrap();
        assert_eq!(parsed.oracle.as_deref(), Some("21436587"));
    }
}
