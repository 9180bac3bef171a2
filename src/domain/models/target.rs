//! Organization-wide target fingerprints chosen by the aggregation layer.

use serde::{Deserialize, Serialize};

use super::fingerprint::Fingerprint;

/// The set of fingerprints every repository should converge to, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSelection {
    #[serde(default)]
    pub targets: Vec<Fingerprint>,
}

impl TargetSelection {
    pub fn new(targets: Vec<Fingerprint>) -> Self {
        Self { targets }
    }

    /// Target for a fingerprint name, e.g. `npm-scripts-sdm`.
    pub fn for_name(&self, name: &str) -> Option<&Fingerprint> {
        self.targets.iter().find(|fp| fp.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}
