//! Domain errors for the fleetprint engine.

use thiserror::Error;

/// Domain-level errors raised at aspect, engine and backend boundaries.
///
/// None of these abort a fleet run: the pipeline, the convergence engine and
/// the rebase policy all convert them into logged, per-scope outcomes.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("File not found in {project}: {path}")]
    FileNotFound { project: String, path: String },

    #[error("Malformed manifest {path}: {reason}")]
    MalformedManifest { path: String, reason: String },

    #[error("Aspect not registered: {0}")]
    AspectNotFound(String),

    #[error("Duplicate aspect registration: {0}")]
    DuplicateAspect(String),

    #[error("Invalid state transition from {from} to {to}: {reason}")]
    InvalidStateTransition { from: String, to: String, reason: String },

    #[error("Invalid branch name: {0}")]
    InvalidBranchName(String),

    #[error("Git operation failed: {0}")]
    GitFailed(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}

impl From<std::io::Error> for DomainError {
    fn from(err: std::io::Error) -> Self {
        DomainError::Io(err.to_string())
    }
}
