//! YAML configuration for peers, the simulator and logging.
//!
//! Every section is optional; a missing key falls back to its default.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration loading errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Roll animation timing.
    #[serde(default)]
    pub roll: RollConfig,
    /// Room/session identity settings.
    #[serde(default)]
    pub session: SessionConfig,
    /// Event log settings.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Headless simulation settings (`dd sim`).
    #[serde(default)]
    pub sim: SimConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RollConfig {
    /// Duration used until the player picks another one.
    #[serde(default = "default_duration_ms")]
    pub default_duration_ms: u32,
    #[serde(default = "default_min_duration_ms")]
    pub min_duration_ms: u32,
    #[serde(default = "default_max_duration_ms")]
    pub max_duration_ms: u32,
}

fn default_duration_ms() -> u32 {
    4500
}

fn default_min_duration_ms() -> u32 {
    500
}

fn default_max_duration_ms() -> u32 {
    10_000
}

impl RollConfig {
    /// Clamp a requested duration into the configured range.
    pub fn clamp(&self, duration_ms: u32) -> u32 {
        duration_ms.clamp(self.min_duration_ms, self.max_duration_ms)
    }
}

impl Default for RollConfig {
    fn default() -> Self {
        Self {
            default_duration_ms: default_duration_ms(),
            min_duration_ms: default_min_duration_ms(),
            max_duration_ms: default_max_duration_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    /// Application namespace; peers with different ids never meet.
    #[serde(default = "default_app_id")]
    pub app_id: String,
    /// Length of generated room ids.
    #[serde(default = "default_room_id_len")]
    pub room_id_len: usize,
}

fn default_app_id() -> String {
    "dice-peer-game".to_string()
}

fn default_room_id_len() -> usize {
    6
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            app_id: default_app_id(),
            room_id_len: default_room_id_len(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// NDJSON event log path; disabled when absent.
    #[serde(default)]
    pub events_path: Option<String>,
    /// Flush the event log every N lines (0 disables periodic flushing).
    #[serde(default)]
    pub flush_every_lines: u64,
    /// Same as setting `DD_DEBUG_LOG=1`.
    #[serde(default)]
    pub debug_log: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimConfig {
    #[serde(default = "default_sim_games")]
    pub games: u32,
    #[serde(default)]
    pub seed: u64,
    /// Upper bound on rolls a bot takes per turn (1..=3).
    #[serde(default = "default_sim_max_rolls")]
    pub max_rolls: u8,
}

fn default_sim_games() -> u32 {
    1
}

fn default_sim_max_rolls() -> u8 {
    3
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            games: default_sim_games(),
            seed: 0,
            max_rolls: default_sim_max_rolls(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let r = &self.roll;
        if r.min_duration_ms > r.max_duration_ms {
            return Err(ConfigError::Invalid(format!(
                "roll.min_duration_ms ({}) > roll.max_duration_ms ({})",
                r.min_duration_ms, r.max_duration_ms
            )));
        }
        if self.session.room_id_len == 0 {
            return Err(ConfigError::Invalid("session.room_id_len must be > 0".into()));
        }
        if !(1..=crate::ROLLS_PER_TURN).contains(&self.sim.max_rolls) {
            return Err(ConfigError::Invalid(format!(
                "sim.max_rolls must be in 1..=3, got {}",
                self.sim.max_rolls
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_gives_defaults() {
        let config = Config::from_yaml("{}").unwrap();
        assert_eq!(config.roll.default_duration_ms, 4500);
        assert_eq!(config.roll.min_duration_ms, 500);
        assert_eq!(config.session.room_id_len, 6);
        assert_eq!(config.sim.max_rolls, 3);
        assert!(config.logging.events_path.is_none());
    }

    #[test]
    fn test_parse_yaml_string() {
        let yaml = r#"
roll:
  default_duration_ms: 2000
  max_duration_ms: 3000
session:
  app_id: test-app
logging:
  events_path: /tmp/dd.ndjson
  flush_every_lines: 10
sim:
  games: 4
  seed: 9
  max_rolls: 2
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.roll.default_duration_ms, 2000);
        assert_eq!(config.roll.min_duration_ms, 500);
        assert_eq!(config.roll.clamp(9000), 3000);
        assert_eq!(config.roll.clamp(10), 500);
        assert_eq!(config.session.app_id, "test-app");
        assert_eq!(config.session.room_id_len, 6);
        assert_eq!(config.logging.events_path.as_deref(), Some("/tmp/dd.ndjson"));
        assert_eq!(config.logging.flush_every_lines, 10);
        assert_eq!(config.sim.games, 4);
        assert_eq!(config.sim.seed, 9);
        assert_eq!(config.sim.max_rolls, 2);
    }

    #[test]
    fn rejects_inverted_duration_range() {
        let yaml = "roll:\n  min_duration_ms: 5000\n  max_duration_ms: 1000\n";
        assert!(matches!(
            Config::from_yaml(yaml).unwrap_err(),
            ConfigError::Invalid(_)
        ));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dd.yaml");
        std::fs::write(&path, "sim:\n  games: 3\n").unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.sim.games, 3);

        let missing = Config::load(dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(missing, ConfigError::Io(_)));
    }
}
