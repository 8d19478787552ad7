//! Smartcab RL - Tabular Q-learning for a driving agent
//!
//! This crate provides the agent's decision-and-learning logic: state
//! encoding, the Q-table, epsilon-greedy action selection, the single-step
//! learning rule, and the per-trial exploration schedule.

// Clippy pedantic allows - these are intentional design choices
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::float_cmp)]
#![allow(clippy::similar_names)]

pub mod agent;
pub mod config;
pub mod decay;
pub mod error;
pub mod learning;
pub mod policy;
pub mod q_table;
pub mod state;

pub use agent::{AgentStats, LearningAgent, Observation, Step};
pub use config::{AgentConfig, DecayConfig};
pub use decay::{DecaySchedule, Exponential, InverseSquare, InverseTrial, Linear, ParameterSchedule};
pub use error::{AgentError, Result};
pub use policy::{ActionSelector, Branch, EpsilonGreedy, Selection, UniformRandom};
pub use q_table::{ActionValues, QTable};
pub use state::State;
