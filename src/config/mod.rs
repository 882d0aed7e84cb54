//! # Configuration Management
//!
//! Centralized, TOML-backed configuration with validation-free sensible
//! defaults. Configuration is organized into logical sections:
//!
//! - [`RoundConfig`] - round timing, capacity, and the explosion formula
//! - [`LoggingConfig`] - logging level and file sinks
//!
//! ## Usage
//!
//! ```rust,no_run
//! use liftoff::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     println!("round capacity: {}", config.round.capacity);
//!
//!     Config::create_default("config.toml").await?;
//!     Ok(())
//! }
//! ```

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub round: RoundConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundConfig {
    /// Maximum concurrently connected players.
    pub capacity: usize,
    /// Length of the BETTING window, in seconds.
    pub betting_secs: u32,
    /// Length of the PAUSE window between rounds, in seconds.
    pub pause_secs: u32,
    /// Flight tick interval, in milliseconds.
    pub tick_ms: u64,
    /// Multiplier increment applied per flight tick.
    pub multiplier_increment: f32,
    /// Which [`crate::game::explosion::ExplosionModel`] to use:
    /// `"additive"` (default) or `"average_stake"`.
    #[serde(default = "default_explosion_formula")]
    pub explosion_formula: String,
}

fn default_explosion_formula() -> String {
    "additive".to_string()
}

impl Default for RoundConfig {
    fn default() -> Self {
        RoundConfig {
            capacity: 10,
            betting_secs: 10,
            pause_secs: 5,
            tick_ms: 100,
            multiplier_increment: 0.01,
            explosion_formula: default_explosion_formula(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
            file: Some("liftoff.log".to_string()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            round: RoundConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        Ok(config)
    }

    /// Write a default configuration file.
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_round_config_matches_reference_constants() {
        let round = RoundConfig::default();
        assert_eq!(round.capacity, 10);
        assert_eq!(round.betting_secs, 10);
        assert_eq!(round.pause_secs, 5);
        assert_eq!(round.tick_ms, 100);
        assert!((round.multiplier_increment - 0.01).abs() < 1e-6);
        assert_eq!(round.explosion_formula, "additive");
    }

    #[test]
    fn config_round_trips_through_toml() {
        let config = Config::default();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(deserialized.round.capacity, config.round.capacity);
        assert_eq!(deserialized.logging.level, config.logging.level);
    }

    #[tokio::test]
    async fn create_default_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let path_str = path.to_str().unwrap();

        Config::create_default(path_str).await.unwrap();
        let loaded = Config::load(path_str).await.unwrap();
        assert_eq!(loaded.round.capacity, 10);
    }

    #[tokio::test]
    async fn load_missing_file_errors() {
        let err = Config::load("/nonexistent/path/config.toml").await;
        assert!(err.is_err());
    }
}
