//! `fleetprint land`: land a convergence branch under the rebase policy.

use anyhow::{bail, Context, Result};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use tracing::Instrument;

use super::Session;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{ChangeProposal, RebaseFailure, RebaseStrategy};
use crate::domain::ports::GitBackend;
use crate::infrastructure::git::GitCli;
use crate::services::RebasePolicy;

#[derive(Args, Debug)]
pub struct LandArgs {
    /// Branch carrying the convergence change
    #[arg(short, long)]
    pub branch: String,
    /// Branch to land on; defaults to rebase.base_branch
    #[arg(long)]
    pub base: Option<String>,
    /// Base commit the change was computed against; defaults to the merge base of branch and base
    #[arg(long)]
    pub computed_at: Option<String>,
    /// Conflict side while rebasing: ours, theirs or none
    #[arg(long)]
    pub strategy: Option<String>,
    /// Abandon instead of rebasing when the base has advanced
    #[arg(long)]
    pub no_rebase: bool,
    /// Keep the branch when the proposal is abandoned
    #[arg(long)]
    pub leave_branch: bool,
    /// Path to the git working copy
    #[arg(short, long, default_value = ".")]
    pub path: PathBuf,
}

fn parse_strategy(value: &str) -> Result<RebaseStrategy> {
    match value.to_lowercase().as_str() {
        "ours" => Ok(RebaseStrategy::Ours),
        "theirs" => Ok(RebaseStrategy::Theirs),
        "none" => Ok(RebaseStrategy::None),
        other => bail!("Invalid strategy: {other}. Must be one of: ours, theirs, none"),
    }
}

#[derive(Debug, Serialize)]
pub struct LandOutput {
    #[serde(flatten)]
    pub proposal: ChangeProposal,
}

impl CommandOutput for LandOutput {
    fn to_human(&self) -> String {
        let p = &self.proposal;
        let mut lines = vec![
            format!("Proposal: {}", p.id),
            format!("Branch: {} -> {}", p.branch, p.base_branch),
            format!("State: {}", p.state),
        ];
        if let Some(commit) = &p.merge_commit {
            lines.push(format!("Merged at: {commit}"));
        }
        if let Some(error) = &p.error {
            lines.push(format!("Reason: {error}"));
        }
        if !p.conflict_files.is_empty() {
            lines.push("Conflicts:".to_string());
            lines.extend(p.conflict_files.iter().map(|f| format!("  - {f}")));
        }
        lines.join("\n")
    }
}

/// Land the branch described by `args` and return the settled proposal.
pub async fn run(args: LandArgs, session: &Session) -> Result<ChangeProposal> {
    let mut config = session.config.rebase.clone();
    if let Some(strategy) = &args.strategy {
        config.strategy = parse_strategy(strategy)?;
    }
    if args.no_rebase {
        config.rebase = false;
    }
    if args.leave_branch {
        config.on_failure = RebaseFailure::LeaveBranch;
    }
    let base = args.base.unwrap_or_else(|| config.base_branch.clone());

    let git = GitCli::new(&args.path);
    let computed_at = match args.computed_at {
        Some(sha) => sha,
        None => git
            .merge_base(&base, &args.branch)
            .await
            .with_context(|| format!("cannot find where {} branched from {base}", args.branch))?,
    };

    let proposal = ChangeProposal::new(args.branch, base, computed_at);
    let span = tracing::info_span!("land", proposal_id = %proposal.id);
    Ok(RebasePolicy::new(git, config)
        .land(proposal)
        .instrument(span)
        .await)
}

pub async fn execute(args: LandArgs, session: &Session) -> Result<()> {
    let landed = run(args, session).await?;
    output(&LandOutput { proposal: landed }, session.json);
    Ok(())
}
