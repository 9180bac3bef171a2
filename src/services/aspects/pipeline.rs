//! Current deployment pipeline aspect.
//!
//! Determines which pipeline a repository deploys with. Local markers are
//! checked first in strict precedence; only when none is present is the
//! East pipeline deployer asked over HTTP. Exactly one fingerprint is
//! produced per repository.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::Instrument;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Fingerprint, RepoSnapshot};
use crate::domain::ports::{Aspect, AspectDetails, ExtractionContext};

pub const CURRENT_PIPELINE: &str = "current-pipeline";
const ABBREVIATION: &str = "pl";
const VERSION: &str = "0.0.1";

/// Presence of this file means the Modern pipeline.
pub const DEPLOYMENT_DESCRIPTOR: &str = "deployment.yaml";
/// Build file shared by the Legacy and West pipelines.
pub const LEGACY_BUILD_DESCRIPTOR: &str = "buildfile";
/// Content of the build file that distinguishes Legacy from West.
pub const LEGACY_MARKER: &str = "Legacy Deploy Stuff";
pub const DEFAULT_EAST_MARKER: &str = "found";

/// Pipelines a repository can deploy with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PipelineKind {
    Modern,
    Legacy,
    West,
    East,
    #[serde(rename = "none")]
    None,
}

impl PipelineKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Modern => "Modern",
            Self::Legacy => "Legacy",
            Self::West => "West",
            Self::East => "East",
            Self::None => "none",
        }
    }
}

impl fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the East pipeline lookup went for this extraction.
///
/// Kept out of the digest: a transient network failure must not produce a
/// different fingerprint from a confirmed negative, but operators still need
/// to tell the two apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EastLookup {
    /// A local marker decided the pipeline.
    #[default]
    NotAttempted,
    Confirmed,
    Negative,
    /// No classifier configured, or the request failed.
    Unavailable,
}

/// Significant payload of the fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pipeline {
    pub detected: PipelineKind,
}

/// Full payload of the fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineFingerprintData {
    pub detected: PipelineKind,
    #[serde(default)]
    pub east_lookup: EastLookup,
}

pub fn pipeline_fingerprint(detected: PipelineKind, east_lookup: EastLookup) -> DomainResult<Fingerprint> {
    Fingerprint::new(
        CURRENT_PIPELINE,
        CURRENT_PIPELINE,
        ABBREVIATION,
        VERSION,
        &PipelineFingerprintData {
            detected,
            east_lookup,
        },
        &Pipeline { detected },
    )
}

#[derive(Debug, Clone)]
pub struct CurrentPipelineAspect {
    east_marker: String,
}

impl CurrentPipelineAspect {
    pub fn new() -> Self {
        Self::with_east_marker(DEFAULT_EAST_MARKER)
    }

    /// Use a different affirmative substring for the East deployer's reply.
    pub fn with_east_marker(marker: impl Into<String>) -> Self {
        Self {
            east_marker: marker.into(),
        }
    }

    /// Local decision steps. `None` means the remote lookup is needed.
    fn classify_locally(snapshot: &RepoSnapshot) -> Option<PipelineKind> {
        if snapshot.has_file(DEPLOYMENT_DESCRIPTOR) {
            return Some(PipelineKind::Modern);
        }
        let build_file = snapshot.read_file(LEGACY_BUILD_DESCRIPTOR)?;
        if build_file.contains(LEGACY_MARKER) {
            Some(PipelineKind::Legacy)
        } else {
            Some(PipelineKind::West)
        }
    }

    async fn ask_east(&self, snapshot: &RepoSnapshot, ctx: &ExtractionContext) -> EastLookup {
        let Some(classifier) = ctx.classifier.as_ref() else {
            tracing::error!(project = %snapshot.id, "no HTTP classifier configured; cannot check East pipeline");
            return EastLookup::Unavailable;
        };

        match classifier.lookup(&snapshot.id, ctx.credentials.as_ref()).await {
            Ok(body) if body.contains(&self.east_marker) => EastLookup::Confirmed,
            Ok(_) => EastLookup::Negative,
            Err(err) => {
                tracing::error!(project = %snapshot.id, error = %err, "couldn't check for East pipeline");
                EastLookup::Unavailable
            }
        }
    }
}

impl Default for CurrentPipelineAspect {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Aspect for CurrentPipelineAspect {
    fn name(&self) -> &str {
        CURRENT_PIPELINE
    }

    fn display_name(&self) -> &str {
        "Pipeline"
    }

    async fn extract(
        &self,
        snapshot: &RepoSnapshot,
        ctx: &ExtractionContext,
    ) -> DomainResult<Vec<Fingerprint>> {
        let (detected, east_lookup) = match Self::classify_locally(snapshot) {
            Some(kind) => (kind, EastLookup::NotAttempted),
            None => {
                let lookup = self
                    .ask_east(snapshot, ctx)
                    .instrument(ctx.span.clone())
                    .await;
                let kind = if lookup == EastLookup::Confirmed {
                    PipelineKind::East
                } else {
                    PipelineKind::None
                };
                (kind, lookup)
            }
        };

        ctx.span.in_scope(|| {
            tracing::debug!(project = %snapshot.id, detected = %detected, east_lookup = ?east_lookup, "classified pipeline");
        });
        Ok(vec![pipeline_fingerprint(detected, east_lookup)?])
    }

    fn to_displayable_fingerprint(&self, fp: &Fingerprint) -> String {
        let detected = fp
            .data
            .get("detected")
            .and_then(Value::as_str)
            .unwrap_or(PipelineKind::None.as_str());
        match fp.data_as::<PipelineFingerprintData>() {
            Ok(data) if data.east_lookup == EastLookup::Unavailable => {
                format!("{detected} (East lookup unavailable)")
            }
            _ => detected.to_string(),
        }
    }

    fn to_displayable_fingerprint_name(&self, _name: &str) -> String {
        "Pipeline".to_string()
    }

    fn details(&self) -> AspectDetails {
        AspectDetails {
            description: "Detect what pipeline a repository deploys with".to_string(),
            short_name: CURRENT_PIPELINE.to_string(),
            display_name: "Current pipeline".to_string(),
            unit: "pipeline".to_string(),
            category: "Release".to_string(),
            url: format!("fingerprint/{CURRENT_PIPELINE}/{CURRENT_PIPELINE}?byOrg=true&trim=false"),
            manage: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{Credentials, ProjectId};
    use crate::domain::ports::{ClassifierError, RemoteClassifier};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CannedClassifier {
        reply: Result<&'static str, ()>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RemoteClassifier for CannedClassifier {
        async fn lookup(
            &self,
            _project: &ProjectId,
            _credentials: Option<&Credentials>,
        ) -> Result<String, ClassifierError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply
                .map(str::to_string)
                .map_err(|()| ClassifierError::Timeout)
        }
    }

    fn ctx_with(reply: Result<&'static str, ()>) -> (ExtractionContext, Arc<CannedClassifier>) {
        let classifier = Arc::new(CannedClassifier {
            reply,
            calls: AtomicUsize::new(0),
        });
        let ctx = ExtractionContext::default().with_classifier(classifier.clone());
        (ctx, classifier)
    }

    fn project(files: &[(&str, &str)]) -> RepoSnapshot {
        RepoSnapshot::of(ProjectId::new("o", "r"), files.iter().copied())
    }

    async fn detect(files: &[(&str, &str)], reply: Result<&'static str, ()>) -> (Fingerprint, usize) {
        let (ctx, classifier) = ctx_with(reply);
        let fps = CurrentPipelineAspect::new().extract(&project(files), &ctx).await.unwrap();
        assert_eq!(fps.len(), 1);
        (fps[0].clone(), classifier.calls.load(Ordering::SeqCst))
    }

    fn detected(fp: &Fingerprint) -> PipelineKind {
        fp.data_as::<PipelineFingerprintData>().unwrap().detected
    }

    #[tokio::test]
    async fn test_deployment_descriptor_wins_over_everything() {
        let (fp, calls) = detect(
            &[(DEPLOYMENT_DESCRIPTOR, ""), (LEGACY_BUILD_DESCRIPTOR, LEGACY_MARKER)],
            Ok("found"),
        )
        .await;
        assert_eq!(detected(&fp), PipelineKind::Modern);
        assert_eq!(calls, 0);
    }

    #[tokio::test]
    async fn test_build_file_presence_always_classifies() {
        let (fp, calls) = detect(&[(LEGACY_BUILD_DESCRIPTOR, "x Legacy Deploy Stuff y")], Ok("found")).await;
        assert_eq!(detected(&fp), PipelineKind::Legacy);
        assert_eq!(calls, 0);

        let (fp, _) = detect(&[(LEGACY_BUILD_DESCRIPTOR, "")], Ok("found")).await;
        assert_eq!(detected(&fp), PipelineKind::West);
    }

    #[tokio::test]
    async fn test_remote_lookup_decides_east() {
        let (fp, calls) = detect(&[], Ok("repository found")).await;
        assert_eq!(detected(&fp), PipelineKind::East);
        assert_eq!(calls, 1);

        let (fp, _) = detect(&[], Ok("nothing here")).await;
        assert_eq!(detected(&fp), PipelineKind::None);
    }

    #[tokio::test]
    async fn test_failed_lookup_and_missing_client_default_to_none() {
        let (failed, calls) = detect(&[], Err(())).await;
        assert_eq!(detected(&failed), PipelineKind::None);
        assert_eq!(calls, 1);

        let fps = CurrentPipelineAspect::new()
            .extract(&project(&[]), &ExtractionContext::default())
            .await
            .unwrap();
        assert_eq!(detected(&fps[0]), PipelineKind::None);
    }

    #[tokio::test]
    async fn test_lookup_outcome_does_not_change_sha() {
        let (negative, _) = detect(&[], Ok("nope")).await;
        let (unavailable, _) = detect(&[], Err(())).await;
        assert_ne!(negative.data, unavailable.data);
        assert_eq!(negative.sha, unavailable.sha);
        assert_eq!(
            CurrentPipelineAspect::new().to_displayable_fingerprint(&unavailable),
            "none (East lookup unavailable)"
        );
        assert_eq!(CurrentPipelineAspect::new().to_displayable_fingerprint(&negative), "none");
    }

    #[test]
    fn test_kind_serializes_as_display_label() {
        assert_eq!(serde_json::to_value(PipelineKind::None).unwrap(), "none");
        assert_eq!(serde_json::to_value(PipelineKind::Modern).unwrap(), "Modern");
    }
}
