//! Error types for the CLI application.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pipeline or service error
    #[error("{0}")]
    Pipeline(#[from] docket_pipeline::PipelineError),

    /// Store error while opening the data directory
    #[error("Store error: {0}")]
    Store(#[from] docket_store::StoreError),

    /// Gateway setup error
    #[error("Gateway error: {0}")]
    Gateway(#[from] docket_gateway::GatewayError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
