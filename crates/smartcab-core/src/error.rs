//! Error types for smartcab

use thiserror::Error;

/// Main error type for the simulated world and its drivers
#[derive(Error, Debug)]
pub enum SmartcabError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid world: {0}")]
    InvalidWorld(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for smartcab operations
pub type Result<T> = std::result::Result<T, SmartcabError>;
