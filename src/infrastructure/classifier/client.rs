//! reqwest-backed [`RemoteClassifier`] for the East pipeline deployer.

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use std::time::Duration;

use crate::domain::models::{ClassifierConfig, Credentials, ProjectId};
use crate::domain::ports::{ClassifierError, RemoteClassifier};
use crate::infrastructure::logging::SecretScrubber;

/// Longest response body excerpt kept in a [`ClassifierError::Status`].
const MAX_ERROR_BODY: usize = 512;

/// Pause before retry `n` is `n * RETRY_STEP`.
const RETRY_STEP: Duration = Duration::from_millis(250);

/// Asks the East pipeline deployer whether it deploys a repository.
///
/// One `GET {base_url}/{owner}/{repo}/{path}` per lookup, bounded by the
/// configured timeout. Retries are off unless `max_retries` is raised.
#[derive(Debug, Clone)]
pub struct HttpClassifier {
    http: Client,
    base_url: String,
    path: String,
    max_retries: u32,
    scrubber: SecretScrubber,
}

impl HttpClassifier {
    pub fn new(config: &ClassifierConfig) -> Result<Self, ClassifierError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("fleetprint/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClassifierError::Transport(format!("failed to build HTTP client: {e}")))?;
        let scrubber = SecretScrubber::new()
            .map_err(|e| ClassifierError::Transport(format!("failed to build scrubber: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            path: config.path.trim_start_matches('/').to_string(),
            max_retries: config.max_retries,
            scrubber,
        })
    }

    /// Lookup URL for `project`.
    pub fn url_for(&self, project: &ProjectId) -> String {
        format!("{}/{}/{}/{}", self.base_url, project.owner, project.repo, self.path)
    }

    async fn send_once(
        &self,
        url: &str,
        credentials: Option<&Credentials>,
    ) -> Result<String, ClassifierError> {
        let mut request = self.http.get(url);
        if let Some(bearer) = credentials.and_then(Credentials::bearer_header) {
            request = request.header(header::AUTHORIZATION, bearer);
        }

        let response = request.send().await.map_err(|e| self.transport_error(&e))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ClassifierError::Body(self.scrubber.scrub(&e.to_string())))?;

        if status.is_success() {
            Ok(body)
        } else {
            let mut excerpt = self.scrubber.scrub(&body);
            if excerpt.len() > MAX_ERROR_BODY {
                let cut = (0..=MAX_ERROR_BODY)
                    .rev()
                    .find(|i| excerpt.is_char_boundary(*i))
                    .unwrap_or(0);
                excerpt.truncate(cut);
            }
            Err(ClassifierError::Status {
                status: status.as_u16(),
                body: excerpt,
            })
        }
    }

    fn transport_error(&self, err: &reqwest::Error) -> ClassifierError {
        if err.is_timeout() {
            ClassifierError::Timeout
        } else {
            ClassifierError::Transport(self.scrubber.scrub(&err.to_string()))
        }
    }
}

/// Whether a failed attempt is worth repeating.
fn is_retryable(err: &ClassifierError) -> bool {
    match err {
        ClassifierError::Transport(_) | ClassifierError::Timeout => true,
        ClassifierError::Status { status, .. } => {
            StatusCode::from_u16(*status).is_ok_and(|s| s.is_server_error() || s == StatusCode::TOO_MANY_REQUESTS)
        }
        ClassifierError::Body(_) => false,
    }
}

#[async_trait]
impl RemoteClassifier for HttpClassifier {
    async fn lookup(
        &self,
        project: &ProjectId,
        credentials: Option<&Credentials>,
    ) -> Result<String, ClassifierError> {
        let url = self.url_for(project);
        let mut attempt = 0;
        loop {
            tracing::debug!(url = %url, attempt, authenticated = credentials.and_then(Credentials::bearer_header).is_some(), "classifier lookup");
            match self.send_once(&url, credentials).await {
                Ok(body) => return Ok(body),
                Err(err) if attempt < self.max_retries && is_retryable(&err) => {
                    attempt += 1;
                    tracing::warn!(url = %url, attempt, error = %err, "classifier lookup failed; retrying");
                    tokio::time::sleep(RETRY_STEP * attempt).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
