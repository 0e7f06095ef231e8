//! Configuration management with file persistence

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::registry::TaskType;

/// Switchyard configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub routing: RoutingConfig,
    pub simulation: SimulationConfig,
    pub usage: UsageConfig,
}

/// Defaults applied to requests that omit routing flags
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Task type assumed when none is given
    pub default_task: String,
    /// Rank by latency instead of cost when no preference is given
    pub prefer_speed: bool,
}

/// Behavior of the simulated provider client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Probability that a simulated call fails (0.0 to 1.0)
    pub failure_rate: f64,
    /// Multiplier applied to simulated latencies
    pub latency_scale: f64,
    /// Fixed RNG seed for reproducible runs; unset means entropy
    pub seed: Option<u64>,
}

/// Budget knobs for the usage accountant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageConfig {
    pub daily_limit_usd: f64,
    pub alert_threshold: f64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            default_task: "chat".to_string(),
            prefer_speed: false,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            failure_rate: 0.15,
            latency_scale: 1.0,
            seed: None,
        }
    }
}

impl Default for UsageConfig {
    fn default() -> Self {
        Self {
            daily_limit_usd: 25.0,
            alert_threshold: 0.9,
        }
    }
}

impl RoutingConfig {
    /// Parse the configured default task type
    pub fn default_task_type(&self) -> anyhow::Result<TaskType> {
        self.default_task
            .parse()
            .map_err(|e: String| anyhow!("{}", e))
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        let dir = if let Ok(custom_dir) = env::var("SWITCHYARD_CONFIG_DIR") {
            PathBuf::from(custom_dir)
        } else {
            dirs::config_dir()
                .ok_or_else(|| anyhow!("Could not determine config directory"))?
                .join("switchyard")
        };
        Ok(dir)
    }

    /// Get the config file path
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from file, or use defaults if it doesn't exist
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_path()?;

        if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config: Config = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            config.validate()?;
            Ok(config)
        } else {
            // Return default config without creating file
            Ok(Config::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> anyhow::Result<()> {
        self.validate()?;

        let dir = Self::config_dir()?;
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;

        let path = Self::config_path()?;
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(0.0..=1.0).contains(&self.simulation.failure_rate) {
            return Err(anyhow!("simulation.failure_rate must be between 0.0 and 1.0"));
        }
        if self.simulation.latency_scale < 0.0 {
            return Err(anyhow!("simulation.latency_scale must be non-negative"));
        }
        if self.usage.daily_limit_usd < 0.0 {
            return Err(anyhow!("usage.daily_limit_usd must be non-negative"));
        }
        if !(0.0..=1.0).contains(&self.usage.alert_threshold) {
            return Err(anyhow!("usage.alert_threshold must be between 0.0 and 1.0"));
        }
        self.routing
            .default_task_type()
            .with_context(|| format!("Invalid routing.default_task: {}", self.routing.default_task))?;
        Ok(())
    }

    /// Get a configuration value by key
    pub fn get(&self, key: &str) -> anyhow::Result<String> {
        match key {
            // Routing settings
            "routing.default_task" => Ok(self.routing.default_task.clone()),
            "routing.prefer_speed" => Ok(self.routing.prefer_speed.to_string()),

            // Simulation settings
            "simulation.failure_rate" => Ok(self.simulation.failure_rate.to_string()),
            "simulation.latency_scale" => Ok(self.simulation.latency_scale.to_string()),
            "simulation.seed" => Ok(self
                .simulation
                .seed
                .map(|s| s.to_string())
                .unwrap_or_else(|| "none".to_string())),

            // Usage settings
            "usage.daily_limit_usd" => Ok(self.usage.daily_limit_usd.to_string()),
            "usage.alert_threshold" => Ok(self.usage.alert_threshold.to_string()),

            _ => Err(anyhow!(
                "Unknown configuration key: {}. Use `switchyard config list` to see available keys.",
                key
            )),
        }
    }

    /// Set a configuration value by key
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            // Routing settings
            "routing.default_task" => {
                let task: TaskType = value
                    .parse()
                    .map_err(|e: String| anyhow!("{}. Valid options: reasoning, chat, simple, development", e))?;
                self.routing.default_task = task.to_string();
            }
            "routing.prefer_speed" => {
                self.routing.prefer_speed = value
                    .parse()
                    .with_context(|| format!("Invalid prefer_speed value: {}", value))?;
            }

            // Simulation settings
            "simulation.failure_rate" => {
                let rate: f64 = value
                    .parse()
                    .with_context(|| format!("Invalid failure_rate value: {}", value))?;
                if !(0.0..=1.0).contains(&rate) {
                    return Err(anyhow!("Failure rate must be between 0.0 and 1.0"));
                }
                self.simulation.failure_rate = rate;
            }
            "simulation.latency_scale" => {
                let scale: f64 = value
                    .parse()
                    .with_context(|| format!("Invalid latency_scale value: {}", value))?;
                if scale < 0.0 {
                    return Err(anyhow!("Latency scale must be non-negative"));
                }
                self.simulation.latency_scale = scale;
            }
            "simulation.seed" => {
                if value.eq_ignore_ascii_case("none") {
                    self.simulation.seed = None;
                } else {
                    let seed: u64 = value
                        .parse()
                        .with_context(|| format!("Invalid seed value: {}", value))?;
                    self.simulation.seed = Some(seed);
                }
            }

            // Usage settings
            "usage.daily_limit_usd" => {
                let limit: f64 = value
                    .parse()
                    .with_context(|| format!("Invalid daily_limit_usd value: {}", value))?;
                if limit < 0.0 {
                    return Err(anyhow!("Daily limit must be non-negative"));
                }
                self.usage.daily_limit_usd = limit;
            }
            "usage.alert_threshold" => {
                let threshold: f64 = value
                    .parse()
                    .with_context(|| format!("Invalid alert_threshold value: {}", value))?;
                if !(0.0..=1.0).contains(&threshold) {
                    return Err(anyhow!("Alert threshold must be between 0.0 and 1.0"));
                }
                self.usage.alert_threshold = threshold;
            }

            _ => {
                return Err(anyhow!(
                    "Unknown configuration key: {}. Use `switchyard config list` to see available keys.",
                    key
                ));
            }
        }
        Ok(())
    }

    /// List all configuration keys and their values
    pub fn list(&self) -> anyhow::Result<Vec<(String, String)>> {
        let keys = vec![
            "routing.default_task",
            "routing.prefer_speed",
            "simulation.failure_rate",
            "simulation.latency_scale",
            "simulation.seed",
            "usage.daily_limit_usd",
            "usage.alert_threshold",
        ];

        keys.into_iter()
            .map(|key| {
                let value = self.get(key)?;
                Ok((key.to_string(), value))
            })
            .collect()
    }

    /// Reset configuration to defaults
    pub fn reset() -> anyhow::Result<()> {
        let path = Self::config_path()?;
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove config file: {}", path.display()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let config = Config::default();

        assert!(config.validate().is_ok());
        assert_eq!(config.routing.default_task, "chat");
        assert_eq!(config.routing.default_task_type().unwrap(), TaskType::Chat);
        assert!((config.simulation.failure_rate - 0.15).abs() < 1e-9);
        assert!((config.usage.daily_limit_usd - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = Config::default();
        config.routing.prefer_speed = true;
        config.simulation.seed = Some(42);

        let rendered = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&rendered).unwrap();

        assert!(parsed.routing.prefer_speed);
        assert_eq!(parsed.simulation.seed, Some(42));
        assert!((parsed.usage.alert_threshold - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_set_and_get() {
        let mut config = Config::default();

        config.set("routing.default_task", "reasoning").unwrap();
        assert_eq!(config.get("routing.default_task").unwrap(), "reasoning");

        config.set("routing.prefer_speed", "true").unwrap();
        assert!(config.routing.prefer_speed);

        config.set("simulation.seed", "7").unwrap();
        assert_eq!(config.get("simulation.seed").unwrap(), "7");

        config.set("simulation.seed", "none").unwrap();
        assert_eq!(config.get("simulation.seed").unwrap(), "none");
    }

    #[test]
    fn test_set_rejects_out_of_range_values() {
        let mut config = Config::default();

        assert!(config.set("simulation.failure_rate", "1.5").is_err());
        assert!(config.set("simulation.latency_scale", "-1").is_err());
        assert!(config.set("usage.daily_limit_usd", "-5").is_err());
        assert!(config.set("usage.alert_threshold", "2").is_err());
    }

    #[test]
    fn test_set_rejects_unknown_key() {
        let mut config = Config::default();

        let err = config.set("llm.temperature", "0.7").unwrap_err();
        assert!(err.to_string().contains("config list"));
    }

    #[test]
    fn test_set_rejects_unknown_task() {
        let mut config = Config::default();

        let err = config.set("routing.default_task", "juggling").unwrap_err();
        assert!(err.to_string().contains("Valid options"));
    }

    #[test]
    fn test_validate_catches_bad_task() {
        let mut config = Config::default();
        config.routing.default_task = "juggling".to_string();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_list_covers_every_key() {
        let config = Config::default();

        let entries = config.list().unwrap();
        assert_eq!(entries.len(), 7);
        for (key, _) in &entries {
            assert!(config.get(key).is_ok());
        }
    }
}
