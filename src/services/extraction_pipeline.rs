//! Extraction pipeline.
//!
//! Runs every registered aspect against a repository snapshot and collects
//! the union of their fingerprints. Aspects run concurrently; an aspect that
//! errors (or panics) is logged and left out while the rest still report.

use futures::stream::{self, StreamExt};
use futures::FutureExt;
use serde::Serialize;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use super::aspect_registry::AspectRegistry;

// Aspect panic isolation needs unwinding.
#[cfg(panic = "abort")]
compile_error!("fleetprint must be built with panic = \"unwind\" so aspect panics stay isolated");
use crate::domain::models::{Fingerprint, ProjectId, RepoSnapshot};
use crate::domain::ports::{Aspect, ExtractionContext};

/// An aspect that failed during extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AspectFailure {
    pub aspect: String,
    pub error: String,
}

/// Everything one extraction produced for one repository.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionReport {
    pub project: ProjectId,
    pub fingerprints: Vec<Fingerprint>,
    pub failures: Vec<AspectFailure>,
    pub duration_ms: u64,
}

impl ExtractionReport {
    pub fn fingerprint(&self, name: &str) -> Option<&Fingerprint> {
        self.fingerprints.iter().find(|fp| fp.name == name)
    }
}

pub struct ExtractionPipeline {
    registry: AspectRegistry,
    max_concurrent_repos: usize,
}

impl ExtractionPipeline {
    pub fn new(registry: AspectRegistry) -> Self {
        Self {
            registry,
            max_concurrent_repos: 8,
        }
    }

    /// Bound on repositories extracted at once by [`extract_fleet`](Self::extract_fleet).
    pub fn with_max_concurrent_repos(mut self, max: usize) -> Self {
        self.max_concurrent_repos = max.max(1);
        self
    }

    pub const fn registry(&self) -> &AspectRegistry {
        &self.registry
    }

    /// Fingerprints from every aspect that did not fail.
    pub async fn extract_all(&self, snapshot: &RepoSnapshot, ctx: &ExtractionContext) -> Vec<Fingerprint> {
        self.extract_report(snapshot, ctx).await.fingerprints
    }

    /// Run all aspects and report fingerprints and failures separately.
    pub async fn extract_report(&self, snapshot: &RepoSnapshot, ctx: &ExtractionContext) -> ExtractionReport {
        let start = Instant::now();

        let runs = self
            .registry
            .iter()
            .map(|aspect| run_aspect(Arc::clone(aspect), snapshot, ctx));
        let results = futures::future::join_all(runs).await;

        let mut fingerprints = Vec::new();
        let mut failures = Vec::new();
        for (aspect, result) in results {
            match result {
                Ok(mut fps) => fingerprints.append(&mut fps),
                Err(error) => failures.push(AspectFailure { aspect, error }),
            }
        }

        let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        ctx.span.in_scope(|| {
            tracing::info!(
                project = %snapshot.id,
                aspect_count = self.registry.len(),
                fingerprint_count = fingerprints.len(),
                failure_count = failures.len(),
                duration_ms,
                "extraction complete"
            );
        });

        ExtractionReport {
            project: snapshot.id.clone(),
            fingerprints,
            failures,
            duration_ms,
        }
    }

    /// Extract every snapshot, at most `max_concurrent_repos` at a time.
    ///
    /// Reports come back in input order.
    pub async fn extract_fleet(&self, snapshots: &[RepoSnapshot], ctx: &ExtractionContext) -> Vec<ExtractionReport> {
        stream::iter(snapshots)
            .map(|snapshot| {
                let repo_ctx = ExtractionContext {
                    span: tracing::info_span!(parent: &ctx.span, "repository", project = %snapshot.id),
                    ..ctx.clone()
                };
                async move { self.extract_report(snapshot, &repo_ctx).await }
            })
            .buffered(self.max_concurrent_repos)
            .collect()
            .await
    }
}

/// Run one aspect in its own span, turning errors and panics into messages.
async fn run_aspect(
    aspect: Arc<dyn Aspect>,
    snapshot: &RepoSnapshot,
    ctx: &ExtractionContext,
) -> (String, Result<Vec<Fingerprint>, String>) {
    let name = aspect.name().to_string();
    let aspect_ctx = ExtractionContext {
        span: tracing::debug_span!(parent: &ctx.span, "aspect", aspect = %name),
        ..ctx.clone()
    };

    let outcome = AssertUnwindSafe(aspect.extract(snapshot, &aspect_ctx))
        .catch_unwind()
        .await;

    let result = match outcome {
        Ok(Ok(fps)) => {
            aspect_ctx.span.in_scope(|| {
                tracing::debug!(project = %snapshot.id, count = fps.len(), "aspect extracted");
            });
            Ok(fps)
        }
        Ok(Err(err)) => {
            aspect_ctx.span.in_scope(|| {
                tracing::warn!(project = %snapshot.id, error = %err, "aspect extraction failed; skipping");
            });
            Err(err.to_string())
        }
        Err(panic) => {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "aspect panicked".to_string());
            aspect_ctx.span.in_scope(|| {
                tracing::error!(project = %snapshot.id, error = %message, "aspect panicked during extraction; skipping");
            });
            Err(message)
        }
    };
    (name, result)
}
