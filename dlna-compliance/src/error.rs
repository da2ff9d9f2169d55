//! Error types for configuring and starting a compliance run

use dlna_client::ClientError;
use thiserror::Error;

/// Invalid tester configuration
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Host must not be empty")]
    EmptyHost,

    #[error("Port must not be 0")]
    InvalidPort,

    #[error("Timeout must be positive")]
    ZeroTimeout,

    #[error("Max items must be at least 1")]
    ZeroMaxItems,
}

/// Errors that prevent a suite from starting
///
/// Once a run has started nothing is raised: every failure becomes a result.
#[derive(Debug, Error)]
pub enum ComplianceError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to create client: {0}")]
    Client(#[from] ClientError),
}

/// Type alias for results that can return a ComplianceError
pub type Result<T> = std::result::Result<T, ComplianceError>;
