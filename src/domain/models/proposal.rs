//! Change proposals produced by convergence runs and the policy that lands them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};

/// Lifecycle of a proposed convergence change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalState {
    /// Change computed, not yet merged.
    Proposed,
    /// Being replayed onto the latest base tip.
    Rebasing,
    /// Landed on the base branch.
    Merged,
    /// Given up on; a fresh convergence run must re-propose.
    Abandoned,
}

impl Default for ProposalState {
    fn default() -> Self {
        Self::Proposed
    }
}

impl ProposalState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Proposed => "proposed",
            Self::Rebasing => "rebasing",
            Self::Merged => "merged",
            Self::Abandoned => "abandoned",
        }
    }

    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Merged | Self::Abandoned)
    }

    /// Valid transitions from this state.
    pub fn valid_transitions(&self) -> Vec<Self> {
        match self {
            Self::Proposed => vec![Self::Rebasing, Self::Merged, Self::Abandoned],
            Self::Rebasing => vec![Self::Merged, Self::Abandoned],
            Self::Merged | Self::Abandoned => vec![],
        }
    }

    pub fn can_transition_to(&self, next: Self) -> bool {
        self.valid_transitions().contains(&next)
    }
}

impl fmt::Display for ProposalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which side wins a textual conflict while rebasing a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RebaseStrategy {
    /// The incoming convergence change wins.
    #[default]
    Ours,
    /// The base branch's edits win.
    Theirs,
    /// Plain rebase; any conflict is irreconcilable.
    None,
}

/// What happens to the proposed branch when it cannot be landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RebaseFailure {
    #[default]
    DeleteBranch,
    LeaveBranch,
}

/// A convergence change waiting to land on a base branch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeProposal {
    pub id: Uuid,
    /// Branch carrying the convergence commit.
    pub branch: String,
    /// Branch the change must land on.
    pub base_branch: String,
    /// Base tip the change was computed against.
    pub computed_at: String,
    pub state: ProposalState,
    /// Files that conflicted on the last rebase attempt.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conflict_files: Vec<String>,
    /// Commit on the base branch after a successful landing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_commit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChangeProposal {
    pub fn new(
        branch: impl Into<String>,
        base_branch: impl Into<String>,
        computed_at: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            branch: branch.into(),
            base_branch: base_branch.into(),
            computed_at: computed_at.into(),
            state: ProposalState::Proposed,
            conflict_files: Vec::new(),
            merge_commit: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Move to `next`, rejecting transitions the lifecycle does not allow.
    pub fn transition_to(&mut self, next: ProposalState) -> DomainResult<()> {
        if !self.state.can_transition_to(next) {
            return Err(DomainError::InvalidStateTransition {
                from: self.state.to_string(),
                to: next.to_string(),
                reason: format!("proposal {} on branch {}", self.id, self.branch),
            });
        }
        self.state = next;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn merged(&mut self, commit: String) -> DomainResult<()> {
        self.transition_to(ProposalState::Merged)?;
        self.merge_commit = Some(commit);
        Ok(())
    }

    pub fn abandon(&mut self, error: String, conflict_files: Vec<String>) -> DomainResult<()> {
        self.transition_to(ProposalState::Abandoned)?;
        self.error = Some(error);
        self.conflict_files = conflict_files;
        Ok(())
    }

    pub const fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}
