//! Port for remote classification lookups.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::models::{Credentials, ProjectId};

/// Errors from a remote classification lookup.
///
/// Callers treat every variant as "could not confirm"; none of them is
/// allowed past the aspect boundary.
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("classifier request failed: {0}")]
    Transport(String),

    #[error("classifier request timed out")]
    Timeout,

    #[error("classifier returned {status}")]
    Status { status: u16, body: String },

    #[error("classifier response unreadable: {0}")]
    Body(String),
}

/// A narrow per-repository lookup against a remote authority.
#[async_trait]
pub trait RemoteClassifier: Send + Sync {
    /// Fetch the textual verdict for `project`.
    ///
    /// `credentials` are forwarded as a bearer header only when they are a
    /// token; any other form sends the request unauthenticated.
    async fn lookup(
        &self,
        project: &ProjectId,
        credentials: Option<&Credentials>,
    ) -> Result<String, ClassifierError>;
}
