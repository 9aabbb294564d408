//! Error types for avatext.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AvatextError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Failed to parse configuration: {message}")]
    ConfigParse { message: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Signal decoding errors
    #[error("Signal decode error: {0}")]
    SignalDecode(#[from] serde_json::Error),

    #[error("Replay script line {line}: {message}")]
    ReplayLine { line: usize, message: String },

    // Runtime errors
    #[error("Reveal engine task has stopped")]
    EngineStopped,

    #[error("Sink {sink} failed: {message}")]
    Sink { sink: String, message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, AvatextError>;
