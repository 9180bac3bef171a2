//! `fleetprint check`: drift of a checkout against target fingerprints.

use anyhow::{Context, Result};
use clap::Args;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::{extraction_context, registry, CheckoutArgs, Session};
use crate::cli::output::{list_table, output, short_sha, CommandOutput};
use crate::domain::models::{Fingerprint, TargetSelection};
use crate::infrastructure::workspace;
use crate::services::{DriftReport, DriftStatus, ExtractionPipeline};

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// JSON file of target fingerprints
    #[arg(short, long)]
    pub targets: PathBuf,
    #[command(flatten)]
    pub checkout: CheckoutArgs,
}

/// Accepted shapes of a targets file.
#[derive(Deserialize)]
#[serde(untagged)]
enum TargetsFile {
    Selection(TargetSelection),
    List(Vec<Fingerprint>),
}

pub async fn read_targets(path: &Path) -> Result<TargetSelection> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Cannot read targets file {}", path.display()))?;
    let parsed: TargetsFile = serde_json::from_str(&text)
        .with_context(|| format!("Invalid targets file {}", path.display()))?;
    Ok(match parsed {
        TargetsFile::Selection(selection) => selection,
        TargetsFile::List(targets) => TargetSelection::new(targets),
    })
}

#[derive(Debug, Serialize)]
pub struct CheckOutput {
    #[serde(flatten)]
    pub report: DriftReport,
    pub converged: bool,
}

impl CommandOutput for CheckOutput {
    fn to_human(&self) -> String {
        if self.report.entries.is_empty() {
            return format!("{}: no targets to check.", self.report.project);
        }
        let mut table = list_table(&["target", "status", "current", "target sha"]);
        for entry in &self.report.entries {
            let (current, target) = match &entry.status {
                DriftStatus::Diverged { current_sha, target_sha } => {
                    (short_sha(current_sha).to_string(), short_sha(target_sha).to_string())
                }
                _ => (String::new(), String::new()),
            };
            table.add_row(vec![entry.name.clone(), entry.status.as_str().to_string(), current, target]);
        }
        let verdict = if self.converged { "converged" } else { "drifted" };
        format!("{}: {verdict}\n{table}", self.report.project)
    }
}

pub async fn execute(args: CheckArgs, session: &Session) -> Result<()> {
    let targets = read_targets(&args.targets).await?;
    let id = args.checkout.project_id()?;
    let snapshot = workspace::load_snapshot(&args.checkout.path, id).await?;

    let span = tracing::info_span!("check", project = %snapshot.id);
    let ctx = extraction_context(session, span)?;
    let pipeline = ExtractionPipeline::new(registry(&session.config)?);
    let fingerprints = pipeline.extract_all(&snapshot, &ctx).await;

    let report = DriftReport::compare(snapshot.id.clone(), &fingerprints, &targets);
    let converged = report.is_converged();
    tracing::info!(project = %snapshot.id, converged, diverged = report.diverged().count(), "drift check complete");

    output(&CheckOutput { report, converged }, session.json);
    Ok(())
}
