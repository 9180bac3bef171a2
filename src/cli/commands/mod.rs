//! CLI command implementations and the plumbing they share.

pub mod apply;
pub mod check;
pub mod extract;
pub mod land;

use anyhow::{Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::domain::models::{Config, Credentials, ProjectId};
use crate::domain::ports::ExtractionContext;
use crate::infrastructure::classifier::HttpClassifier;
use crate::services::{builtin_aspects, AspectRegistry};

/// Everything a command needs beyond its own arguments.
#[derive(Debug, Clone)]
pub struct Session {
    pub config: Config,
    pub credentials: Option<Credentials>,
    pub json: bool,
}

/// Where a checkout lives and which fleet repository it is.
#[derive(Args, Debug, Clone)]
pub struct CheckoutArgs {
    /// Path to the local checkout
    #[arg(short, long, default_value = ".")]
    pub path: PathBuf,
    /// Repository owner (organization or user)
    #[arg(long, default_value = "local")]
    pub owner: String,
    /// Repository name; defaults to the checkout directory name
    #[arg(long)]
    pub repo: Option<String>,
    /// Branch the checkout is on, used for links
    #[arg(long)]
    pub branch: Option<String>,
    /// Commit the checkout is at, used for links
    #[arg(long)]
    pub sha: Option<String>,
}

impl CheckoutArgs {
    pub fn project_id(&self) -> Result<ProjectId> {
        project_id(&self.path, &self.owner, self.repo.as_deref(), self.branch.as_deref(), self.sha.as_deref())
    }
}

pub fn project_id(
    path: &Path,
    owner: &str,
    repo: Option<&str>,
    branch: Option<&str>,
    sha: Option<&str>,
) -> Result<ProjectId> {
    let repo = match repo {
        Some(repo) => repo.to_string(),
        None => {
            let canonical = path
                .canonicalize()
                .with_context(|| format!("Cannot resolve checkout path {}", path.display()))?;
            canonical
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .context("Checkout path has no directory name; pass --repo")?
        }
    };

    let mut id = ProjectId::new(owner, repo);
    if let Some(branch) = branch {
        id = id.with_branch(branch);
    }
    if let Some(sha) = sha {
        id = id.with_sha(sha);
    }
    Ok(id)
}

/// Built-in aspects restricted to the configured names.
pub fn registry(config: &Config) -> Result<AspectRegistry> {
    let all = AspectRegistry::from_aspects(builtin_aspects(&config.classifier))?;
    all.only(&config.extraction.aspects)
        .context("Invalid extraction.aspects configuration")
}

/// Extraction context carrying the classifier (when enabled) and credentials.
pub fn extraction_context(session: &Session, span: tracing::Span) -> Result<ExtractionContext> {
    let mut ctx = ExtractionContext::new(span).with_credentials(session.credentials.clone());
    if session.config.classifier.enabled {
        let classifier = HttpClassifier::new(&session.config.classifier)
            .context("Failed to build pipeline classifier client")?;
        ctx = ctx.with_classifier(Arc::new(classifier));
    }
    Ok(ctx)
}
