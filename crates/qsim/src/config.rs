use anyhow::{bail, Context as AnyhowContext, Result};
use qsim_core::linalg::MAX_DECIMALS;
use qsim_core::scenarios::{Oracle, SetupGate};
use qsim_core::{ScenarioConfig, ScenarioRegistry};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// User settings stored in `~/.qsim/config.yaml`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Directory that receives the per-run `qsimlog-*.txt` files.
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    /// Fixed measurement seed; random when unset.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Decimal places shown for amplitudes and Bloch vectors.
    #[serde(default = "default_decimals")]
    pub decimals: usize,
    /// Scenario opened by `qsim -i`.
    #[serde(default = "default_scenario")]
    pub default_scenario: String,
    /// Saved parameters per scenario kind.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub scenarios: BTreeMap<String, ScenarioConfig>,
}

fn default_log_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_decimals() -> usize {
    4
}

fn default_scenario() -> String {
    "bell".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
            seed: None,
            decimals: default_decimals(),
            default_scenario: default_scenario(),
            scenarios: BTreeMap::new(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Config::default());
        }
        let content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", config_path.display()))?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(self)?;
        fs::write(config_path, content)?;
        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not find home directory")?;
        Ok(home.join(".qsim").join("config.yaml"))
    }

    /// Apply `QSIM_LOG_DIR`, `QSIM_SEED` and `QSIM_DECIMALS` overrides.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup("QSIM_LOG_DIR") {
            self.log_dir = PathBuf::from(dir);
        }
        if let Some(seed) = lookup("QSIM_SEED") {
            match seed.parse() {
                Ok(seed) => self.seed = Some(seed),
                Err(_) => tracing::warn!(value = %seed, "Ignoring invalid QSIM_SEED"),
            }
        }
        if let Some(decimals) = lookup("QSIM_DECIMALS") {
            match parse_decimals(&decimals) {
                Ok(parsed) => self.decimals = parsed,
                Err(_) => tracing::warn!(value = %decimals, "Ignoring invalid QSIM_DECIMALS"),
            }
        }
    }

    /// Saved parameters for `kind`, or a bare config.
    pub fn scenario(&self, kind: &str) -> ScenarioConfig {
        self.scenarios
            .get(kind)
            .cloned()
            .map(|mut c| {
                c.kind = kind.to_string();
                c
            })
            .unwrap_or_else(|| ScenarioConfig::new(kind))
    }

    /// Set a value by key. Scenario parameters use `<scenario>.<param>`.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "log_dir" => self.log_dir = PathBuf::from(value),
            "seed" => {
                self.seed = if value.is_empty() || value == "none" {
                    None
                } else {
                    Some(value.parse().context("seed must be an unsigned integer")?)
                }
            }
            "decimals" => self.decimals = parse_decimals(value)?,
            "default_scenario" => {
                check_kind(value)?;
                self.default_scenario = value.to_string();
            }
            _ => {
                let Some((kind, param)) = key.split_once('.') else {
                    bail!("Unknown config key '{}'", key);
                };
                check_kind(kind)?;
                let mut entry = self.scenario(kind);
                match param {
                    "gate" => entry.gate = Some(value.parse::<SetupGate>()?),
                    "phase" => {
                        let phase: f64 = value.parse().context("phase must be a number")?;
                        if !(0.0..=1.0).contains(&phase) {
                            bail!("phase must be within [0, 1], got {}", phase);
                        }
                        entry.phase = Some(phase);
                    }
                    "oracle" => {
                        Oracle::parse(value)?;
                        entry.oracle = Some(value.to_string());
                    }
                    _ => bail!("Unknown scenario parameter '{}'", param),
                }
                self.scenarios.insert(kind.to_string(), entry);
            }
        }
        Ok(())
    }
}

fn parse_decimals(value: &str) -> Result<usize> {
    let decimals: usize = value.parse().context("decimals must be an unsigned integer")?;
    if decimals > MAX_DECIMALS {
        bail!("decimals must be at most {}, got {}", MAX_DECIMALS, decimals);
    }
    Ok(decimals)
}

fn check_kind(kind: &str) -> Result<()> {
    let registry = ScenarioRegistry::with_builtins();
    if !registry.has(kind) {
        let known: Vec<&str> = registry.list().into_iter().map(|(name, _)| name).collect();
        bail!("Unknown scenario '{}' (available: {})", kind, known.join(", "));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.decimals, 4);
        assert_eq!(config.default_scenario, "bell");
        assert!(config.seed.is_none());
    }

    #[test]
    fn test_missing_file_gives_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("missing.yaml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");
        let mut config = Config::default();
        config.set("seed", "42").unwrap();
        config.set("teleportation.gate", "t").unwrap();
        config.set("teleportation.phase", "0.25").unwrap();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.seed, Some(42));
        let tele = loaded.scenario("teleportation");
        assert_eq!(tele.gate, Some(SetupGate::T));
        assert_eq!(tele.phase, Some(0.25));
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "decimals: 2\n").unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.decimals, 2);
        assert_eq!(config.log_dir, PathBuf::from("."));
    }

    #[test]
    fn test_set_rejects_unknown_keys() {
        let mut config = Config::default();
        assert!(config.set("colour", "blue").is_err());
        assert!(config.set("bell.spin", "up").is_err());
        assert!(config.set("seed", "minus one").is_err());
        assert!(config.set("teleportation.gate", "h").is_err());
        config.set("seed", "none").unwrap();
        assert!(config.seed.is_none());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("QSIM_LOG_DIR", "/tmp/qsim-logs"),
            ("QSIM_SEED", "7"),
            ("QSIM_DECIMALS", "not-a-number"),
        ]
        .into_iter()
        .collect();
        let mut config = Config::default();
        config.apply_env_with(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.log_dir, PathBuf::from("/tmp/qsim-logs"));
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.decimals, 4);
    }

    #[test]
    fn test_scenario_falls_back_to_bare_config() {
        let config = Config::default();
        assert_eq!(config.scenario("bell"), ScenarioConfig::new("bell"));
    }

    #[test]
    fn test_set_validates_scenario_presets() {
        let mut config = Config::default();
        assert!(config.set("grover.phase", "0.5").is_err());
        assert!(config.set("default_scenario", "grover").is_err());
        assert!(config.set("teleportation.phase", "1.5").is_err());
        assert!(config.set("teleportation.phase", "NaN").is_err());
        assert!(config.set("deutsch-jozsa.oracle", "1123").is_err());
        assert!(config.scenarios.is_empty());
        assert_eq!(config.default_scenario, "bell");

        config.set("teleportation.phase", "1").unwrap();
        config.set("deutsch-jozsa.oracle", "12436578").unwrap();
        config.set("default_scenario", "teleportation").unwrap();
        assert_eq!(config.scenario("teleportation").phase, Some(1.0));
        assert_eq!(config.scenario("deutsch-jozsa").oracle.as_deref(), Some("12436578"));
    }

    #[test]
    fn test_decimals_are_bounded() {
        let mut config = Config::default();
        assert!(config.set("decimals", "400").is_err());
        config.set("decimals", "15").unwrap();
        assert_eq!(config.decimals, 15);

        let mut config = Config::default();
        config.apply_env_with(|key| (key == "QSIM_DECIMALS").then(|| "400".to_string()));
        assert_eq!(config.decimals, 4);
    }
}
