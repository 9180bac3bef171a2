pub mod apply;
pub mod config;
pub mod fingerprint;
pub mod proposal;
pub mod snapshot;
pub mod target;

pub use apply::{ApplyOutcome, ApplyParameters, SkipReason};
pub use config::{ClassifierConfig, Config, ExtractionConfig, LoggingConfig, RebaseConfig};
pub use fingerprint::{canonical_json, digest, Fingerprint};
pub use proposal::{ChangeProposal, ProposalState, RebaseFailure, RebaseStrategy};
pub use snapshot::{Credentials, ProjectId, RepoSnapshot};
pub use target::TargetSelection;
