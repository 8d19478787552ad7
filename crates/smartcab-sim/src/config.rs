//! Configuration loading for the smartcab simulation

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use config::{ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};

use smartcab_rl::AgentConfig;

/// Accepted values for `simulation.log_level`
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Configuration for a simulation run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub agent: AgentConfig,
    pub world: WorldConfig,
    pub simulation: SimulationConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Intersections as `[columns, rows]`
    pub grid_size: [i32; 2],
    pub num_dummies: usize,
    /// End a trial once the deadline runs out
    pub enforce_deadline: bool,
    /// Deadline at which a trial always ends
    pub hard_time_limit: i32,
    /// Minimum start-to-destination distance
    pub min_route_distance: i32,
    /// Deadline per unit of route distance
    pub deadline_per_step: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            grid_size: [8, 6],
            num_dummies: 100,
            enforce_deadline: true,
            hard_time_limit: -100,
            min_route_distance: 4,
            deadline_per_step: 5,
            seed: None,
        }
    }
}

impl WorldConfig {
    pub fn columns(&self) -> i32 {
        self.grid_size[0]
    }

    pub fn rows(&self) -> i32 {
        self.grid_size[1]
    }

    /// Largest wrap-around distance between two intersections
    pub fn max_route_distance(&self) -> i32 {
        self.columns() / 2 + self.rows() / 2
    }

    pub fn validate(&self) -> Result<()> {
        if self.columns() < 2 || self.rows() < 2 {
            bail!(
                "world.grid_size must be at least 2x2, got {}x{}",
                self.columns(),
                self.rows()
            );
        }
        if self.min_route_distance < 1 || self.min_route_distance > self.max_route_distance() {
            bail!(
                "world.min_route_distance must be between 1 and {}, got {}",
                self.max_route_distance(),
                self.min_route_distance
            );
        }
        if self.deadline_per_step < 1 {
            bail!("world.deadline_per_step must be positive");
        }
        if self.hard_time_limit > 0 {
            bail!("world.hard_time_limit must not be positive");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Pause between ticks
    pub update_delay_ms: u64,
    /// Testing trials after training
    pub n_test: u32,
    /// Training stops once epsilon drops below this
    pub tolerance: f64,
    /// Training trials for an agent that does not learn
    pub untrained_trials: u32,
    /// Upper bound on training trials for a learning agent
    pub max_training_trials: u32,
    pub log_metrics: bool,
    pub log_dir: PathBuf,
    /// Marks logs as coming from a tuned agent
    pub optimized: bool,
    /// Default level for smartcab's log targets, below `--verbose` and `RUST_LOG`
    pub log_level: String,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            update_delay_ms: 0,
            n_test: 10,
            tolerance: 0.05,
            untrained_trials: 20,
            max_training_trials: 20_000,
            log_metrics: true,
            log_dir: PathBuf::from("logs"),
            optimized: false,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the first config file found and the environment
    pub fn load() -> Result<Self> {
        Self::load_from(Self::find_config_file().as_deref())
    }

    /// Load configuration from `path` (if any) and `SMARTCAB__*` variables
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let mut builder = ConfigBuilder::<config::builder::DefaultState>::default();

        if let Some(path) = path {
            tracing::info!("Loading config from: {:?}", path);
            builder = builder.add_source(File::from(path.to_path_buf()).required(false));
        } else {
            tracing::info!("No config file found, using defaults");
        }

        // Environment variables with SMARTCAB__ prefix, e.g. SMARTCAB__AGENT__LEARNING=true
        builder = builder.add_source(
            Environment::with_prefix("SMARTCAB")
                .separator("__")
                .try_parsing(true),
        );

        let config: Config = builder
            .build()?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Find the configuration file
    pub fn find_config_file() -> Option<PathBuf> {
        // Check in order: SMARTCAB_CONFIG env, ./smartcab.toml, ~/.config/smartcab/smartcab.toml
        if let Ok(path) = std::env::var("SMARTCAB_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let local = PathBuf::from("smartcab.toml");
        if local.exists() {
            return Some(local);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".config").join("smartcab").join("smartcab.toml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        None
    }

    pub fn validate(&self) -> Result<()> {
        self.agent
            .validate()
            .context("Invalid agent configuration")?;
        self.world.validate()?;
        if !self.simulation.tolerance.is_finite() || self.simulation.tolerance < 0.0 {
            bail!(
                "simulation.tolerance must be finite and non-negative, got {}",
                self.simulation.tolerance
            );
        }
        let level = self.simulation.log_level.to_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            bail!(
                "simulation.log_level must be one of {}, got {:?}",
                LOG_LEVELS.join(", "),
                self.simulation.log_level
            );
        }
        Ok(())
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }

    /// File stem for this run's logs
    pub fn log_stem(&self) -> &'static str {
        if !self.agent.learning {
            "sim_no-learning"
        } else if self.simulation.optimized {
            "sim_improved-learning"
        } else {
            "sim_default-learning"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smartcab_rl::DecayConfig;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.world.grid_size, [8, 6]);
        assert_eq!(config.world.num_dummies, 100);
        assert_eq!(config.simulation.tolerance, 0.05);
        assert!(!config.agent.learning);
    }

    #[test]
    fn test_rejects_unreachable_route_distance() {
        let mut config = Config::default();
        config.world.grid_size = [2, 2];
        assert!(config.validate().is_err());

        config.world.min_route_distance = 2;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_agent_rates() {
        let mut config = Config::default();
        config.agent.alpha = -0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_tolerance() {
        let mut config = Config::default();
        config.simulation.tolerance = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_log_level_validated() {
        let mut config = Config::default();
        config.simulation.log_level = "WARN".to_string();
        assert!(config.validate().is_ok());

        config.simulation.log_level = "loud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_log_level_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("smartcab.toml");
        std::fs::write(&path, "[simulation]\nlog_level = \"warn\"\n").unwrap();

        let config = Config::load_from(Some(&path)).unwrap();
        assert_eq!(config.simulation.log_level, "warn");
    }

    #[test]
    fn test_log_stem() {
        let mut config = Config::default();
        assert_eq!(config.log_stem(), "sim_no-learning");

        config.agent.learning = true;
        assert_eq!(config.log_stem(), "sim_default-learning");

        config.simulation.optimized = true;
        assert_eq!(config.log_stem(), "sim_improved-learning");
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut config = Config::default();
        config.agent.learning = true;
        config.agent.decay = DecayConfig::Linear { step: 0.01 };

        let rendered = config.to_toml().unwrap();
        let parsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_toml() {
        let parsed: Config = toml::from_str(
            r#"
            [agent]
            learning = true
            alpha = 0.8

            [simulation]
            n_test = 3
            "#,
        )
        .unwrap();

        assert!(parsed.agent.learning);
        assert_eq!(parsed.agent.alpha, 0.8);
        assert_eq!(parsed.agent.epsilon, 1.0);
        assert_eq!(parsed.simulation.n_test, 3);
        assert_eq!(parsed.world, WorldConfig::default());
    }
}
