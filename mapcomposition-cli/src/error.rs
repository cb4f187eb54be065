//! CLI error type.

use std::fmt;

use mapcomposition::config::ConfigError;
use mapcomposition::server::ServerError;

/// Errors surfaced to the terminal.
#[derive(Debug)]
pub enum CliError {
    /// Configuration problem.
    Config(String),

    /// Logging could not be initialized.
    Logging(std::io::Error),

    /// The HTTP front-end failed.
    Server(ServerError),

    /// A composition request failed.
    Service(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "configuration error: {}", msg),
            CliError::Logging(e) => write!(f, "failed to initialize logging: {}", e),
            CliError::Server(e) => write!(f, "{}", e),
            CliError::Service(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Logging(e) => Some(e),
            CliError::Server(e) => Some(e),
            CliError::Config(_) | CliError::Service(_) => None,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<ServerError> for CliError {
    fn from(e: ServerError) -> Self {
        CliError::Server(e)
    }
}
