//! Error types for the server binary.

use thiserror::Error;

use pihole_client::ClientError;

/// Errors that stop the server or a CLI command.
#[derive(Debug, Error)]
pub enum ServerError {
    /// I/O error (signal registration, stdio).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML deserialization error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration error. Fatal at startup.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pi-hole client error.
    #[error("Client error: {0}")]
    Client(#[from] ClientError),

    /// MCP transport failure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// One or more connectivity checks failed.
    #[error("{0} check(s) failed")]
    CheckFailed(usize),
}

/// Result type alias using `ServerError`.
pub type Result<T> = std::result::Result<T, ServerError>;
