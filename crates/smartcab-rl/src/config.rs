//! Agent configuration

use serde::{Deserialize, Serialize};

use crate::decay::{DecaySchedule, Exponential, InverseSquare, InverseTrial, Linear};
use crate::error::{AgentError, Result};

/// Reject negative and non-finite parameters
pub fn check_non_negative(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(AgentError::InvalidParameter { name, value })
    }
}

fn default_factor() -> f64 {
    Exponential::DEFAULT_FACTOR
}

fn default_step() -> f64 {
    0.05
}

/// Serializable choice of decay schedule
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecayConfig {
    Exponential {
        #[serde(default = "default_factor")]
        factor: f64,
    },
    Linear {
        #[serde(default = "default_step")]
        step: f64,
    },
    InverseSquare,
    InverseTrial,
}

impl DecayConfig {
    /// Build the schedule this configuration describes
    pub fn build(&self) -> Box<dyn DecaySchedule> {
        match *self {
            DecayConfig::Exponential { factor } => Box::new(Exponential::new(factor)),
            DecayConfig::Linear { step } => Box::new(Linear { step }),
            DecayConfig::InverseSquare => Box::new(InverseSquare),
            DecayConfig::InverseTrial => Box::new(InverseTrial),
        }
    }

    pub fn validate(&self) -> Result<()> {
        match *self {
            DecayConfig::Exponential { factor } => check_non_negative("decay.factor", factor),
            DecayConfig::Linear { step } => check_non_negative("decay.step", step),
            DecayConfig::InverseSquare | DecayConfig::InverseTrial => Ok(()),
        }
    }
}

impl Default for DecayConfig {
    fn default() -> Self {
        DecayConfig::Exponential {
            factor: default_factor(),
        }
    }
}

impl std::fmt::Display for DecayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecayConfig::Exponential { factor } => write!(f, "exponential({factor})"),
            DecayConfig::Linear { step } => write!(f, "linear({step})"),
            DecayConfig::InverseSquare => write!(f, "inverse_square"),
            DecayConfig::InverseTrial => write!(f, "inverse_trial"),
        }
    }
}

impl std::str::FromStr for DecayConfig {
    type Err = String;

    /// Parses a schedule name with default parameters
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "exponential" => Ok(DecayConfig::default()),
            "linear" => Ok(DecayConfig::Linear {
                step: default_step(),
            }),
            "inverse_square" => Ok(DecayConfig::InverseSquare),
            "inverse_trial" => Ok(DecayConfig::InverseTrial),
            other => Err(format!(
                "Unknown decay schedule: {other} (expected exponential, linear, inverse_square or inverse_trial)"
            )),
        }
    }
}

/// Construction-time options for a [`crate::LearningAgent`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Use and update the Q-table; otherwise act uniformly at random
    pub learning: bool,

    /// Initial exploration probability
    pub epsilon: f64,

    /// Initial learning rate
    pub alpha: f64,

    /// Seed for the agent's random source, entropy when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// Exploration decay applied at each training trial
    pub decay: DecayConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            learning: false,
            epsilon: 1.0,
            alpha: 0.5,
            seed: None,
            decay: DecayConfig::default(),
        }
    }
}

impl AgentConfig {
    /// Defaults with learning enabled
    pub fn learning() -> Self {
        Self {
            learning: true,
            ..Self::default()
        }
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_decay(mut self, decay: DecayConfig) -> Self {
        self.decay = decay;
        self
    }

    /// Check that every rate is finite and non-negative
    pub fn validate(&self) -> Result<()> {
        check_non_negative("epsilon", self.epsilon)?;
        check_non_negative("alpha", self.alpha)?;
        self.decay.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AgentConfig::default();
        assert!(!config.learning);
        assert_eq!(config.epsilon, 1.0);
        assert_eq!(config.alpha, 0.5);
        assert!(config.seed.is_none());
        assert_eq!(config.decay, DecayConfig::Exponential { factor: 0.999 });
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_chain() {
        let config = AgentConfig::learning()
            .with_epsilon(0.3)
            .with_alpha(0.1)
            .with_seed(42)
            .with_decay(DecayConfig::InverseTrial);

        assert!(config.learning);
        assert_eq!(config.epsilon, 0.3);
        assert_eq!(config.alpha, 0.1);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.decay, DecayConfig::InverseTrial);
    }

    #[test]
    fn test_rejects_negative_and_non_finite() {
        let negative = AgentConfig::learning().with_epsilon(-0.1);
        assert_eq!(
            negative.validate(),
            Err(AgentError::InvalidParameter {
                name: "epsilon",
                value: -0.1
            })
        );

        assert!(AgentConfig::learning().with_alpha(f64::NAN).validate().is_err());
        assert!(AgentConfig::learning()
            .with_alpha(f64::INFINITY)
            .validate()
            .is_err());
        assert!(AgentConfig::learning()
            .with_decay(DecayConfig::Exponential { factor: -1.0 })
            .validate()
            .is_err());
    }

    #[test]
    fn test_rates_above_one_are_accepted() {
        // Not clamped, only checked for sign and finiteness
        assert!(AgentConfig::learning().with_epsilon(1.5).validate().is_ok());
    }

    #[test]
    fn test_decay_from_str() {
        assert_eq!("exponential".parse::<DecayConfig>(), Ok(DecayConfig::default()));
        assert_eq!(
            "linear".parse::<DecayConfig>(),
            Ok(DecayConfig::Linear { step: 0.05 })
        );
        assert_eq!(
            "inverse-square".parse::<DecayConfig>(),
            Ok(DecayConfig::InverseSquare)
        );
        assert!("sigmoid".parse::<DecayConfig>().is_err());
    }

    #[test]
    fn test_decay_deserialization() {
        let decay: DecayConfig = serde_json::from_str(r#"{"kind": "exponential"}"#).unwrap();
        assert_eq!(decay, DecayConfig::Exponential { factor: 0.999 });

        let decay: DecayConfig =
            serde_json::from_str(r#"{"kind": "linear", "step": 0.01}"#).unwrap();
        assert_eq!(decay, DecayConfig::Linear { step: 0.01 });
    }

    #[test]
    fn test_partial_config_deserialization() {
        let config: AgentConfig = serde_json::from_str(r#"{"learning": true}"#).unwrap();
        assert!(config.learning);
        assert_eq!(config.epsilon, 1.0);
        assert_eq!(config.alpha, 0.5);
    }
}
