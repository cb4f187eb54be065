//! Service-level errors and their response mapping.

use thiserror::Error;

use crate::engine::EngineError;
use crate::project::ProjectError;
use crate::source::SourceError;

use super::ServiceResponse;

/// Errors raised while handling a composition request.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0} parameter is missing")]
    MissingParameter(&'static str),

    #[error("invalid source '{src}': {reason}")]
    InvalidSource { src: String, reason: SourceError },

    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("NAMES and SOURCES must have the same length ({names} names, {sources} sources)")]
    NameCountMismatch { names: usize, sources: usize },

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Project(#[from] ProjectError),

    #[error("project file was not written: {0}")]
    ProjectNotWritten(String),
}

impl ServiceError {
    /// HTTP status this error maps to.
    pub fn status(&self) -> u16 {
        match self {
            ServiceError::MissingParameter(_)
            | ServiceError::InvalidSource { .. }
            | ServiceError::FileNotFound(_)
            | ServiceError::NameCountMismatch { .. }
            | ServiceError::Engine(_) => 400,
            ServiceError::Project(_) | ServiceError::ProjectNotWritten(_) => 500,
        }
    }
}

impl From<ServiceError> for ServiceResponse {
    fn from(error: ServiceError) -> Self {
        match error.status() {
            400 => ServiceResponse::bad_request(error.to_string()),
            _ => ServiceResponse::server_error(error.to_string()),
        }
    }
}
