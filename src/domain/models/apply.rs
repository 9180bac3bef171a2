//! Apply parameters and outcomes for convergence runs.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::fingerprint::Fingerprint;
use super::snapshot::RepoSnapshot;

/// Parameters handed to a convergence run by the aggregation layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyParameters {
    /// The fingerprint the repository should converge to.
    #[serde(default)]
    pub fp: Option<Fingerprint>,
}

impl ApplyParameters {
    pub fn target(fp: Fingerprint) -> Self {
        Self { fp: Some(fp) }
    }
}

/// Why an apply left the repository untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// No target fingerprint was supplied.
    MissingTarget,
    /// No registered aspect owns the target's fingerprint type.
    UnknownAspect,
    /// The owning aspect does not support apply.
    ReadOnlyAspect,
    /// The file the aspect manages does not exist in this repository.
    NotApplicable,
}

impl SkipReason {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MissingTarget => "missing_target",
            Self::UnknownAspect => "unknown_aspect",
            Self::ReadOnlyAspect => "read_only_aspect",
            Self::NotApplicable => "not_applicable",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of applying a target fingerprint to a repository snapshot.
///
/// Every variant carries the snapshot the caller should continue with, so a
/// fleet run never has to special-case failures to keep going.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The snapshot was rewritten toward the target.
    Applied(RepoSnapshot),
    /// Nothing was attempted.
    Skipped {
        snapshot: RepoSnapshot,
        reason: SkipReason,
    },
    /// The aspect tried and failed; the snapshot is the unmodified input.
    Failed { snapshot: RepoSnapshot, error: String },
}

impl ApplyOutcome {
    pub fn snapshot(&self) -> &RepoSnapshot {
        match self {
            Self::Applied(snapshot)
            | Self::Skipped { snapshot, .. }
            | Self::Failed { snapshot, .. } => snapshot,
        }
    }

    pub fn into_snapshot(self) -> RepoSnapshot {
        match self {
            Self::Applied(snapshot)
            | Self::Skipped { snapshot, .. }
            | Self::Failed { snapshot, .. } => snapshot,
        }
    }

    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    pub const fn skip_reason(&self) -> Option<SkipReason> {
        match self {
            Self::Skipped { reason, .. } => Some(*reason),
            _ => None,
        }
    }

    pub const fn status(&self) -> &'static str {
        match self {
            Self::Applied(_) => "applied",
            Self::Skipped { .. } => "skipped",
            Self::Failed { .. } => "failed",
        }
    }
}
