//! Drift between a repository's fingerprints and the fleet targets.

use serde::Serialize;

use crate::domain::models::{Fingerprint, ProjectId, TargetSelection};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DriftStatus {
    InSync,
    Diverged { current_sha: String, target_sha: String },
    /// The repository produced no fingerprint with the target's name.
    Absent,
}

impl DriftStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InSync => "in_sync",
            Self::Diverged { .. } => "diverged",
            Self::Absent => "absent",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriftEntry {
    pub name: String,
    pub fingerprint_type: String,
    #[serde(flatten)]
    pub status: DriftStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriftReport {
    pub project: ProjectId,
    pub entries: Vec<DriftEntry>,
}

impl DriftReport {
    /// Compare `fingerprints` against every target, in target order.
    pub fn compare(project: ProjectId, fingerprints: &[Fingerprint], targets: &TargetSelection) -> Self {
        let entries = targets
            .targets
            .iter()
            .map(|target| {
                let status = match fingerprints.iter().find(|fp| fp.name == target.name) {
                    None => DriftStatus::Absent,
                    Some(current) if current.sha == target.sha => DriftStatus::InSync,
                    Some(current) => DriftStatus::Diverged {
                        current_sha: current.sha.clone(),
                        target_sha: target.sha.clone(),
                    },
                };
                DriftEntry {
                    name: target.name.clone(),
                    fingerprint_type: target.fingerprint_type.clone(),
                    status,
                }
            })
            .collect();
        Self { project, entries }
    }

    /// Targets the repository has a fingerprint for but does not match.
    pub fn diverged(&self) -> impl Iterator<Item = &DriftEntry> {
        self.entries
            .iter()
            .filter(|e| matches!(e.status, DriftStatus::Diverged { .. }))
    }

    pub fn is_converged(&self) -> bool {
        self.diverged().next().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fp(name: &str, payload: &str) -> Fingerprint {
        Fingerprint::new("t", name, "t", "1", &payload, &payload).unwrap()
    }

    #[test]
    fn test_statuses() {
        let targets = TargetSelection::new(vec![fp("a", "x"), fp("b", "y"), fp("c", "z")]);
        let current = vec![fp("a", "x"), fp("b", "other"), fp("unrelated", "q")];
        let report = DriftReport::compare(ProjectId::new("o", "r"), &current, &targets);

        let statuses: Vec<_> = report.entries.iter().map(|e| e.status.as_str()).collect();
        assert_eq!(statuses, vec!["in_sync", "diverged", "absent"]);
        assert_eq!(report.diverged().count(), 1);
        assert!(!report.is_converged());
    }

    #[test]
    fn test_absent_does_not_count_as_divergence() {
        let targets = TargetSelection::new(vec![fp("a", "x")]);
        let report = DriftReport::compare(ProjectId::new("o", "r"), &[], &targets);
        assert!(report.is_converged());
        assert_eq!(report.entries[0].status, DriftStatus::Absent);
    }
}
