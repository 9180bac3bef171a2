//! The aspect port: one pluggable fingerprint family.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::classifier::RemoteClassifier;
use crate::domain::errors::DomainResult;
use crate::domain::models::{ApplyOutcome, Credentials, Fingerprint, RepoSnapshot, SkipReason};

/// Per-call inputs for extraction.
///
/// Aspects hold no per-repository state; everything they need for one call
/// travels here. Events should be emitted inside `span` so every log line is
/// attributable to the repository and run that produced it.
#[derive(Clone)]
pub struct ExtractionContext {
    /// Remote lookup for facts not determinable from files.
    pub classifier: Option<Arc<dyn RemoteClassifier>>,
    /// Caller credentials for the hosting service.
    pub credentials: Option<Credentials>,
    /// Telemetry sink for this extraction.
    pub span: tracing::Span,
}

impl ExtractionContext {
    pub fn new(span: tracing::Span) -> Self {
        Self {
            classifier: None,
            credentials: None,
            span,
        }
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn RemoteClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn with_credentials(mut self, credentials: Option<Credentials>) -> Self {
        self.credentials = credentials;
        self
    }
}

impl Default for ExtractionContext {
    fn default() -> Self {
        Self::new(tracing::Span::none())
    }
}

impl std::fmt::Debug for ExtractionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractionContext")
            .field("classifier", &self.classifier.is_some())
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

/// Per-call inputs for apply.
#[derive(Debug, Clone)]
pub struct ApplyContext {
    pub span: tracing::Span,
}

impl ApplyContext {
    pub const fn new(span: tracing::Span) -> Self {
        Self { span }
    }
}

impl Default for ApplyContext {
    fn default() -> Self {
        Self::new(tracing::Span::none())
    }
}

/// Report metadata consumed by reporting collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AspectDetails {
    pub description: String,
    pub short_name: String,
    pub display_name: String,
    pub unit: String,
    pub category: String,
    pub url: String,
    /// Whether the fleet should actively converge this aspect.
    pub manage: bool,
}

/// A fingerprint family: extraction, display and optional convergence.
///
/// Implementations are registered once at startup and shared read-only by
/// every extraction and apply call.
#[async_trait]
pub trait Aspect: Send + Sync {
    /// Stable name; also the `type` of every fingerprint the aspect emits.
    fn name(&self) -> &str;

    fn display_name(&self) -> &str;

    /// Extract zero or more fingerprints. Zero means "not applicable".
    async fn extract(
        &self,
        snapshot: &RepoSnapshot,
        ctx: &ExtractionContext,
    ) -> DomainResult<Vec<Fingerprint>>;

    /// Whether [`apply`](Self::apply) does anything.
    fn supports_apply(&self) -> bool {
        false
    }

    /// Converge `snapshot` toward `target`, returning a new snapshot.
    async fn apply(
        &self,
        snapshot: &RepoSnapshot,
        _target: &Fingerprint,
        _ctx: &ApplyContext,
    ) -> DomainResult<ApplyOutcome> {
        Ok(ApplyOutcome::Skipped {
            snapshot: snapshot.clone(),
            reason: SkipReason::ReadOnlyAspect,
        })
    }

    /// Short human-readable rendering of a fingerprint's value.
    fn to_displayable_fingerprint(&self, fp: &Fingerprint) -> String;

    /// Human-readable rendering of a fingerprint name.
    fn to_displayable_fingerprint_name(&self, name: &str) -> String;

    fn details(&self) -> AspectDetails;
}
