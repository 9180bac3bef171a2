//! fleetprint - repository fingerprinting and fleet convergence
//!
//! fleetprint extracts content-addressed fingerprints from repository
//! snapshots through pluggable aspects, compares them against fleet-wide
//! targets, rewrites repositories toward a target, and lands the resulting
//! branches under a rebase policy.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Fingerprints, snapshots, proposals and the ports
//! - **Service Layer** (`services`): Aspects, extraction, convergence and the rebase policy
//! - **Infrastructure Layer** (`infrastructure`): Config, logging, HTTP and git adapters
//! - **CLI Layer** (`cli`): Command-line interface
//!
//! # Example
//!
//! ```no_run
//! use fleetprint::domain::models::{ClassifierConfig, ProjectId, RepoSnapshot};
//! use fleetprint::domain::ports::ExtractionContext;
//! use fleetprint::services::{builtin_aspects, AspectRegistry, ExtractionPipeline};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let registry = AspectRegistry::from_aspects(builtin_aspects(&ClassifierConfig::default()))?;
//! let snapshot = RepoSnapshot::of(
//!     ProjectId::new("acme", "web"),
//!     [("package.json", r#"{"dependencies": {"@atomist/sdm": "1"}, "scripts": {}}"#)],
//! );
//! let fingerprints = ExtractionPipeline::new(registry)
//!     .extract_all(&snapshot, &ExtractionContext::default())
//!     .await;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::models::{
    ApplyOutcome, ApplyParameters, ChangeProposal, Config, Credentials, Fingerprint, ProjectId,
    ProposalState, RepoSnapshot, SkipReason, TargetSelection,
};
pub use domain::ports::{Aspect, GitBackend, RemoteClassifier};
pub use domain::{DomainError, DomainResult};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{AspectRegistry, ConvergenceEngine, ExtractionPipeline, RebasePolicy};
