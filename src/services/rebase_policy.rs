//! Rebase policy for landing convergence changes.
//!
//! A proposal computed against one base tip is landed as-is while that tip
//! is still current. Once the base has moved on, the proposal is rebased
//! using the configured strategy; conflicts the strategy cannot settle
//! abandon it. Abandoned proposals are never retried here: the next
//! convergence run re-proposes from the new base.

use crate::domain::models::{ChangeProposal, ProposalState, RebaseConfig, RebaseFailure};
use crate::domain::ports::{GitBackend, MergeAttempt, RebaseAttempt};

pub struct RebasePolicy<G: GitBackend> {
    backend: G,
    config: RebaseConfig,
}

impl<G: GitBackend> RebasePolicy<G> {
    pub const fn new(backend: G, config: RebaseConfig) -> Self {
        Self { backend, config }
    }

    pub const fn config(&self) -> &RebaseConfig {
        &self.config
    }

    pub const fn backend(&self) -> &G {
        &self.backend
    }

    /// Drive `proposal` to `Merged` or `Abandoned`.
    ///
    /// Backend failures abandon the proposal rather than surfacing as errors.
    pub async fn land(&self, mut proposal: ChangeProposal) -> ChangeProposal {
        if proposal.is_terminal() {
            tracing::warn!(proposal_id = %proposal.id, state = %proposal.state, "proposal already settled; not retrying");
            return proposal;
        }

        let base_tip = match self.backend.branch_tip(&proposal.base_branch).await {
            Ok(tip) => tip,
            Err(err) => {
                return self
                    .give_up(proposal, format!("cannot read base branch: {err}"), Vec::new())
                    .await
            }
        };

        if base_tip == proposal.computed_at {
            tracing::debug!(proposal_id = %proposal.id, base = %proposal.base_branch, "base unchanged; landing directly");
            return self.fast_forward(proposal).await;
        }

        if !self.config.rebase {
            let reason = format!(
                "base {} advanced from {} to {base_tip} and rebasing is disabled",
                proposal.base_branch, proposal.computed_at
            );
            return self.give_up(proposal, reason, Vec::new()).await;
        }

        if let Err(err) = proposal.transition_to(ProposalState::Rebasing) {
            tracing::error!(proposal_id = %proposal.id, error = %err, "cannot start rebase");
            return proposal;
        }
        tracing::info!(
            proposal_id = %proposal.id,
            branch = %proposal.branch,
            base = %proposal.base_branch,
            strategy = ?self.config.strategy,
            "base advanced; rebasing proposal"
        );

        match self
            .backend
            .rebase(&proposal.branch, &proposal.base_branch, self.config.strategy)
            .await
        {
            Ok(RebaseAttempt::Clean { tip }) => {
                tracing::debug!(proposal_id = %proposal.id, tip = %tip, "rebase clean");
                self.fast_forward(proposal).await
            }
            Ok(RebaseAttempt::Conflict { files }) => {
                let reason = format!("rebase conflict in {} file(s)", files.len());
                self.give_up(proposal, reason, files).await
            }
            Err(err) => self.give_up(proposal, format!("rebase failed: {err}"), Vec::new()).await,
        }
    }

    async fn fast_forward(&self, mut proposal: ChangeProposal) -> ChangeProposal {
        match self
            .backend
            .fast_forward(&proposal.base_branch, &proposal.branch)
            .await
        {
            Ok(MergeAttempt::Merged { commit }) => {
                tracing::info!(proposal_id = %proposal.id, commit = %commit, base = %proposal.base_branch, "proposal merged");
                if let Err(err) = proposal.merged(commit) {
                    tracing::error!(proposal_id = %proposal.id, error = %err, "cannot record merge");
                }
                proposal
            }
            Ok(MergeAttempt::NotFastForward) => {
                let reason = format!("{} moved while landing", proposal.base_branch);
                self.give_up(proposal, reason, Vec::new()).await
            }
            Err(err) => self.give_up(proposal, format!("merge failed: {err}"), Vec::new()).await,
        }
    }

    async fn give_up(&self, mut proposal: ChangeProposal, reason: String, conflict_files: Vec<String>) -> ChangeProposal {
        tracing::warn!(
            proposal_id = %proposal.id,
            branch = %proposal.branch,
            reason = %reason,
            conflicts = ?conflict_files,
            "abandoning proposal"
        );

        if self.config.on_failure == RebaseFailure::DeleteBranch {
            if let Err(err) = self.backend.delete_branch(&proposal.branch).await {
                tracing::error!(branch = %proposal.branch, error = %err, "failed to delete abandoned branch");
            }
        }

        if let Err(err) = proposal.abandon(reason, conflict_files) {
            tracing::error!(proposal_id = %proposal.id, error = %err, "cannot abandon proposal");
        }
        proposal
    }
}
