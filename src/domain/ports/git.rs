//! Port for the git operations the rebase policy needs.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::RebaseStrategy;

/// Outcome of replaying a branch onto a new base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RebaseAttempt {
    /// Replay succeeded; `tip` is the branch's new head.
    Clean { tip: String },
    /// Replay stopped on conflicts the strategy could not resolve.
    Conflict { files: Vec<String> },
}

/// Outcome of moving a base branch forward to a proposal branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeAttempt {
    Merged { commit: String },
    /// The base is no longer an ancestor of the branch.
    NotFastForward,
}

/// Branch operations against one repository.
///
/// Errors are reserved for the backend itself failing (git missing, bad
/// ref); conflicts are ordinary results.
#[async_trait]
pub trait GitBackend: Send + Sync {
    /// Commit currently at the tip of `branch`.
    async fn branch_tip(&self, branch: &str) -> DomainResult<String>;

    /// Best common ancestor of `base` and `branch`: the base commit a
    /// proposal on `branch` was cut from.
    async fn merge_base(&self, base: &str, branch: &str) -> DomainResult<String>;

    /// Replay `branch` onto `onto`, resolving conflicts per `strategy`.
    async fn rebase(
        &self,
        branch: &str,
        onto: &str,
        strategy: RebaseStrategy,
    ) -> DomainResult<RebaseAttempt>;

    /// Fast-forward `base` to `branch`.
    async fn fast_forward(&self, base: &str, branch: &str) -> DomainResult<MergeAttempt>;

    async fn delete_branch(&self, branch: &str) -> DomainResult<()>;
}
