//! `git` CLI implementation of the [`GitBackend`] port.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Output;
use tokio::process::Command;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::RebaseStrategy;
use crate::domain::ports::{GitBackend, MergeAttempt, RebaseAttempt};

/// [`GitBackend`] over a local working copy.
///
/// Operations check out branches in `workdir`, so the working copy must be
/// clean and not shared with a concurrent run.
#[derive(Debug, Clone)]
pub struct GitCli {
    workdir: PathBuf,
}

impl GitCli {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    async fn run(&self, args: &[&str]) -> DomainResult<Output> {
        Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .output()
            .await
            .map_err(|e| DomainError::GitFailed(format!("Failed to run git: {e}")))
    }

    /// Run git and return trimmed stdout, failing on a non-zero exit.
    async fn run_ok(&self, args: &[&str]) -> DomainResult<String> {
        let output = self.run(args).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DomainError::GitFailed(format!(
                "git {} failed: {}",
                args.first().copied().unwrap_or_default(),
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    async fn head(&self) -> DomainResult<String> {
        self.run_ok(&["rev-parse", "HEAD"]).await
    }

    async fn unmerged_files(&self) -> DomainResult<Vec<String>> {
        let stdout = self.run_ok(&["diff", "--name-only", "--diff-filter=U"]).await?;
        Ok(stdout.lines().map(str::to_string).collect())
    }
}

/// Conflict side option for `git rebase`.
///
/// During a rebase git's "ours" is the branch being rebased onto, so the
/// proposal's own change is "theirs".
const fn strategy_args(strategy: RebaseStrategy) -> &'static [&'static str] {
    match strategy {
        RebaseStrategy::Ours => &["-X", "theirs"],
        RebaseStrategy::Theirs => &["-X", "ours"],
        RebaseStrategy::None => &[],
    }
}

/// Reject names git would refuse or parse as options.
pub fn validate_branch_name(name: &str) -> DomainResult<()> {
    let invalid = name.is_empty()
        || name.starts_with('-')
        || name.starts_with('/')
        || name.ends_with('/')
        || name.ends_with('.')
        || name.ends_with(".lock")
        || name.contains("..")
        || name.contains("@{")
        || name.contains("//")
        || name
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || matches!(c, '~' | '^' | ':' | '?' | '*' | '[' | '\\'));
    if invalid {
        return Err(DomainError::InvalidBranchName(name.to_string()));
    }
    Ok(())
}

#[async_trait]
impl GitBackend for GitCli {
    async fn branch_tip(&self, branch: &str) -> DomainResult<String> {
        validate_branch_name(branch)?;
        let rev = format!("refs/heads/{branch}^{{commit}}");
        self.run_ok(&["rev-parse", "--verify", "--quiet", &rev]).await
    }

    async fn merge_base(&self, base: &str, branch: &str) -> DomainResult<String> {
        validate_branch_name(base)?;
        validate_branch_name(branch)?;
        let base_ref = format!("refs/heads/{base}");
        let branch_ref = format!("refs/heads/{branch}");
        self.run_ok(&["merge-base", &base_ref, &branch_ref]).await
    }

    async fn rebase(
        &self,
        branch: &str,
        onto: &str,
        strategy: RebaseStrategy,
    ) -> DomainResult<RebaseAttempt> {
        validate_branch_name(branch)?;
        validate_branch_name(onto)?;

        let mut args = vec!["rebase", "--quiet"];
        args.extend_from_slice(strategy_args(strategy));
        args.extend_from_slice(&[onto, branch]);

        let output = self.run(&args).await?;
        if output.status.success() {
            return Ok(RebaseAttempt::Clean {
                tip: self.head().await?,
            });
        }

        let files = self.unmerged_files().await?;
        if let Err(err) = self.run_ok(&["rebase", "--abort"]).await {
            tracing::warn!(branch, error = %err, "rebase --abort failed");
        }
        self.run_ok(&["checkout", "--quiet", onto]).await?;

        if files.is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DomainError::GitFailed(format!(
                "git rebase failed: {}",
                stderr.trim()
            )));
        }
        tracing::debug!(branch, onto, conflicts = ?files, "rebase stopped on conflicts");
        Ok(RebaseAttempt::Conflict { files })
    }

    async fn fast_forward(&self, base: &str, branch: &str) -> DomainResult<MergeAttempt> {
        validate_branch_name(base)?;
        validate_branch_name(branch)?;

        let ancestry = self.run(&["merge-base", "--is-ancestor", base, branch]).await?;
        match ancestry.status.code() {
            Some(0) => {}
            Some(1) => return Ok(MergeAttempt::NotFastForward),
            _ => {
                let stderr = String::from_utf8_lossy(&ancestry.stderr);
                return Err(DomainError::GitFailed(format!(
                    "git merge-base failed: {}",
                    stderr.trim()
                )));
            }
        }

        self.run_ok(&["checkout", "--quiet", base]).await?;
        self.run_ok(&["merge", "--ff-only", "--quiet", branch]).await?;
        Ok(MergeAttempt::Merged {
            commit: self.head().await?,
        })
    }

    async fn delete_branch(&self, branch: &str) -> DomainResult<()> {
        validate_branch_name(branch)?;
        self.run_ok(&["branch", "-D", branch]).await.map(|_| ())
    }
}
