//! `fleetprint apply`: converge a checkout toward a target fingerprint.

use anyhow::{Context, Result};
use clap::Args;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::{registry, CheckoutArgs, Session};
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{ApplyOutcome, ApplyParameters, Fingerprint, ProjectId};
use crate::domain::ports::ApplyContext;
use crate::infrastructure::workspace;
use crate::services::ConvergenceEngine;

#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// JSON file holding the target fingerprint (or `{"fp": ...}` parameters)
    #[arg(short, long)]
    pub target: PathBuf,
    /// Write changed files back to the checkout; otherwise only report
    #[arg(short, long)]
    pub write: bool,
    #[command(flatten)]
    pub checkout: CheckoutArgs,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TargetFile {
    Fingerprint(Fingerprint),
    Parameters(ApplyParameters),
}

pub async fn read_parameters(path: &Path) -> Result<ApplyParameters> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Cannot read target file {}", path.display()))?;
    let parsed: TargetFile = serde_json::from_str(&text)
        .with_context(|| format!("Invalid target file {}", path.display()))?;
    Ok(match parsed {
        TargetFile::Fingerprint(fp) => ApplyParameters::target(fp),
        TargetFile::Parameters(params) => params,
    })
}

#[derive(Debug, Serialize)]
pub struct ApplyOutput {
    pub project: ProjectId,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Files whose content the apply changed.
    pub changed: Vec<String>,
    pub written: bool,
}

impl CommandOutput for ApplyOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![format!("{}: {}", self.project, self.status)];
        if let Some(reason) = &self.reason {
            lines.push(format!("Reason: {reason}"));
        }
        if let Some(error) = &self.error {
            lines.push(format!("Error: {error}"));
        }
        if self.changed.is_empty() {
            if self.status == "applied" {
                lines.push("Already converged; nothing to change.".to_string());
            }
        } else {
            let verb = if self.written { "Wrote" } else { "Would change" };
            lines.push(format!("{verb}:"));
            lines.extend(self.changed.iter().map(|path| format!("  - {path}")));
        }
        lines.join("\n")
    }
}

pub async fn execute(args: ApplyArgs, session: &Session) -> Result<()> {
    let params = read_parameters(&args.target).await?;
    let id = args.checkout.project_id()?;
    let before = workspace::load_snapshot(&args.checkout.path, id).await?;

    let engine = ConvergenceEngine::new(registry(&session.config)?);
    let ctx = ApplyContext::new(tracing::info_span!("apply", project = %before.id));
    let outcome = engine.apply(before.clone(), &params, &ctx).await;

    let changed: Vec<String> = outcome
        .snapshot()
        .paths()
        .filter(|path| before.read_file(path) != outcome.snapshot().read_file(path))
        .map(str::to_string)
        .collect();

    let written = args.write && outcome.is_applied() && !changed.is_empty();
    if written {
        workspace::write_changes(&args.checkout.path, &before, outcome.snapshot()).await?;
    }

    let result = ApplyOutput {
        project: before.id.clone(),
        status: outcome.status().to_string(),
        reason: outcome.skip_reason().map(|r| r.to_string()),
        error: match &outcome {
            ApplyOutcome::Failed { error, .. } => Some(error.clone()),
            _ => None,
        },
        changed,
        written,
    };
    output(&result, session.json);
    Ok(())
}
