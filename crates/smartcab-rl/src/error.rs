//! Error types for the learning agent

use thiserror::Error;

use crate::state::State;

/// Contract violations raised by the agent
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AgentError {
    /// A Q-table lookup on a state that never went through `ensure_state`
    #[error("State not found in Q-table: {0}")]
    StateNotFound(State),

    /// A negative or non-finite parameter
    #[error("Invalid parameter {name}: {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("No valid actions to choose from")]
    NoValidActions,
}

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;
