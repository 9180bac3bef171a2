//! `fleetprint extract`: fingerprint local checkouts.

use anyhow::{bail, Result};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use super::{extraction_context, project_id, registry, Session};
use crate::cli::output::{list_table, output, short_sha, truncate, CommandOutput};
use crate::domain::models::{Fingerprint, ProjectId};
use crate::infrastructure::workspace;
use crate::services::{AspectFailure, AspectRegistry, ExtractionPipeline, ExtractionReport};

#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Checkouts to extract; repeat for a fleet run
    #[arg(short, long = "path", default_value = ".")]
    pub paths: Vec<PathBuf>,
    /// Repository owner (organization or user)
    #[arg(long, default_value = "local")]
    pub owner: String,
    /// Repository name; only valid with a single path
    #[arg(long)]
    pub repo: Option<String>,
    /// Branch the checkout is on, used for links
    #[arg(long)]
    pub branch: Option<String>,
    /// Commit the checkout is at, used for links
    #[arg(long)]
    pub sha: Option<String>,
}

/// A fingerprint with its aspect's rendering alongside.
#[derive(Debug, Serialize)]
pub struct FingerprintView {
    #[serde(flatten)]
    pub fingerprint: Fingerprint,
    pub display_name: String,
    pub display: String,
}

impl FingerprintView {
    pub fn new(fingerprint: Fingerprint, registry: &AspectRegistry) -> Self {
        let (display_name, display) = match registry.owner_of(&fingerprint.fingerprint_type) {
            Some(aspect) => (
                aspect.to_displayable_fingerprint_name(&fingerprint.name),
                aspect.to_displayable_fingerprint(&fingerprint),
            ),
            None => (fingerprint.name.clone(), fingerprint.sha.clone()),
        };
        Self {
            fingerprint,
            display_name,
            display,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RepositoryOutput {
    pub project: ProjectId,
    pub fingerprints: Vec<FingerprintView>,
    pub failures: Vec<AspectFailure>,
    pub duration_ms: u64,
}

impl RepositoryOutput {
    fn from_report(report: ExtractionReport, registry: &AspectRegistry) -> Self {
        Self {
            project: report.project,
            fingerprints: report
                .fingerprints
                .into_iter()
                .map(|fp| FingerprintView::new(fp, registry))
                .collect(),
            failures: report.failures,
            duration_ms: report.duration_ms,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ExtractOutput {
    pub repositories: Vec<RepositoryOutput>,
}

impl CommandOutput for ExtractOutput {
    fn to_human(&self) -> String {
        let mut sections = Vec::new();
        for repo in &self.repositories {
            let mut section = format!("{} ({} fingerprint(s))", repo.project, repo.fingerprints.len());
            if !repo.fingerprints.is_empty() {
                let mut table = list_table(&["name", "aspect", "value", "sha"]);
                for view in &repo.fingerprints {
                    table.add_row(vec![
                        view.display_name.clone(),
                        view.fingerprint.fingerprint_type.clone(),
                        truncate(&view.display, 72),
                        short_sha(&view.fingerprint.sha).to_string(),
                    ]);
                }
                section.push('\n');
                section.push_str(&table.to_string());
            }
            for failure in &repo.failures {
                section.push_str(&format!("\n  ! {} failed: {}", failure.aspect, failure.error));
            }
            sections.push(section);
        }
        sections.join("\n\n")
    }
}

pub async fn execute(args: ExtractArgs, session: &Session) -> Result<()> {
    if args.repo.is_some() && args.paths.len() > 1 {
        bail!("--repo can only be used with a single --path");
    }

    let registry = registry(&session.config)?;
    let span = tracing::info_span!("extract", run_id = %uuid::Uuid::new_v4());
    let ctx = extraction_context(session, span)?;

    let mut snapshots = Vec::with_capacity(args.paths.len());
    for path in &args.paths {
        let id = project_id(
            path,
            &args.owner,
            args.repo.as_deref(),
            args.branch.as_deref(),
            args.sha.as_deref(),
        )?;
        snapshots.push(workspace::load_snapshot(path, id).await?);
    }

    let pipeline = ExtractionPipeline::new(registry.clone())
        .with_max_concurrent_repos(session.config.extraction.max_concurrent_repos);
    let reports = pipeline.extract_fleet(&snapshots, &ctx).await;

    let result = ExtractOutput {
        repositories: reports
            .into_iter()
            .map(|report| RepositoryOutput::from_report(report, &registry))
            .collect(),
    };
    output(&result, session.json);
    Ok(())
}
