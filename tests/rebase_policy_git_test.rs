//! Landing proposals against real git repositories.
//!
//! Skipped silently when no `git` binary is available.

mod common;

use std::path::Path;

use common::{commit_file, git, git_available, setup_test_git_repo};
use fleetprint::cli::commands::land::{self, LandArgs};
use fleetprint::cli::Session;
use fleetprint::domain::models::{
    ChangeProposal, Config, ProposalState, RebaseConfig, RebaseFailure, RebaseStrategy,
};
use fleetprint::domain::ports::GitBackend;
use fleetprint::infrastructure::git::GitCli;
use fleetprint::services::RebasePolicy;

const BRANCH: &str = "fleetprint/npm-scripts-sdm";
const BASE_MANIFEST: &str = "{\n  \"scripts\": {\n    \"build\": \"tsc\"\n  }\n}\n";
const PROPOSED_MANIFEST: &str = "{\n  \"scripts\": {\n    \"build\": \"tsc -p .\"\n  }\n}\n";
const COMPETING_MANIFEST: &str = "{\n  \"scripts\": {\n    \"build\": \"webpack\"\n  }\n}\n";

/// Base commit on `main` plus a proposal branch rewriting the manifest.
/// Leaves `main` checked out and returns the base commit.
fn propose(path: &Path) -> String {
    let base = commit_file(path, "package.json", BASE_MANIFEST, "initial");
    git(path, &["checkout", "--quiet", "-b", BRANCH]);
    commit_file(path, "package.json", PROPOSED_MANIFEST, "converge npm scripts");
    git(path, &["checkout", "--quiet", "main"]);
    base
}

fn branch_exists(path: &Path, branch: &str) -> bool {
    !git(path, &["branch", "--list", branch]).is_empty()
}

fn show(path: &Path, rev: &str, file: &str) -> String {
    git(path, &["show", &format!("{rev}:{file}")])
}

async fn land(path: &Path, computed_at: &str, config: RebaseConfig) -> ChangeProposal {
    RebasePolicy::new(GitCli::new(path), config)
        .land(ChangeProposal::new(BRANCH, "main", computed_at))
        .await
}

#[tokio::test]
async fn test_unchanged_base_fast_forwards() {
    if !git_available() {
        return;
    }
    let (_dir, path) = setup_test_git_repo();
    let base = propose(&path);
    let branch_tip = git(&path, &["rev-parse", BRANCH]);

    let landed = land(&path, &base, RebaseConfig::default()).await;

    assert_eq!(landed.state, ProposalState::Merged);
    assert_eq!(landed.merge_commit.as_deref(), Some(branch_tip.as_str()));
    assert_eq!(git(&path, &["rev-parse", "main"]), branch_tip);
}

#[tokio::test]
async fn test_advanced_base_rebases_cleanly() {
    if !git_available() {
        return;
    }
    let (_dir, path) = setup_test_git_repo();
    let base = propose(&path);
    commit_file(&path, "README.md", "# sample\n", "docs");

    let landed = land(&path, &base, RebaseConfig::default()).await;

    assert_eq!(landed.state, ProposalState::Merged);
    assert_eq!(show(&path, "main", "README.md"), "# sample");
    assert_eq!(show(&path, "main", "package.json"), PROPOSED_MANIFEST.trim());
}

#[tokio::test]
async fn test_plain_rebase_conflict_abandons_and_deletes_branch() {
    if !git_available() {
        return;
    }
    let (_dir, path) = setup_test_git_repo();
    let base = propose(&path);
    let competing = commit_file(&path, "package.json", COMPETING_MANIFEST, "switch bundler");

    let config = RebaseConfig {
        strategy: RebaseStrategy::None,
        ..RebaseConfig::default()
    };
    let landed = land(&path, &base, config).await;

    assert_eq!(landed.state, ProposalState::Abandoned);
    assert_eq!(landed.conflict_files, vec!["package.json"]);
    assert!(!branch_exists(&path, BRANCH));
    assert_eq!(git(&path, &["rev-parse", "main"]), competing);
    assert_eq!(git(&path, &["rev-parse", "--abbrev-ref", "HEAD"]), "main");
}

#[tokio::test]
async fn test_ours_strategy_keeps_the_proposed_change() {
    if !git_available() {
        return;
    }
    let (_dir, path) = setup_test_git_repo();
    let base = propose(&path);
    commit_file(&path, "package.json", COMPETING_MANIFEST, "switch bundler");

    let landed = land(&path, &base, RebaseConfig::default()).await;

    assert_eq!(landed.state, ProposalState::Merged);
    assert_eq!(show(&path, "main", "package.json"), PROPOSED_MANIFEST.trim());
}

#[tokio::test]
async fn test_leave_branch_keeps_abandoned_branch() {
    if !git_available() {
        return;
    }
    let (_dir, path) = setup_test_git_repo();
    let base = propose(&path);
    commit_file(&path, "package.json", COMPETING_MANIFEST, "switch bundler");

    let config = RebaseConfig {
        strategy: RebaseStrategy::None,
        on_failure: RebaseFailure::LeaveBranch,
        ..RebaseConfig::default()
    };
    let landed = land(&path, &base, config).await;

    assert_eq!(landed.state, ProposalState::Abandoned);
    assert!(branch_exists(&path, BRANCH));
}

#[tokio::test]
async fn test_missing_base_branch_abandons() {
    if !git_available() {
        return;
    }
    let (_dir, path) = setup_test_git_repo();
    let base = propose(&path);

    let landed = RebasePolicy::new(GitCli::new(&path), RebaseConfig::default())
        .land(ChangeProposal::new(BRANCH, "release", base))
        .await;

    assert_eq!(landed.state, ProposalState::Abandoned);
    assert!(landed.error.is_some());
}

fn land_args(path: &Path) -> LandArgs {
    LandArgs {
        branch: BRANCH.to_string(),
        base: None,
        computed_at: None,
        strategy: None,
        no_rebase: false,
        leave_branch: false,
        path: path.to_path_buf(),
    }
}

fn session() -> Session {
    Session {
        config: Config::default(),
        credentials: None,
        json: true,
    }
}

#[tokio::test]
async fn test_merge_base_is_the_commit_the_branch_was_cut_from() {
    if !git_available() {
        return;
    }
    let (_dir, path) = setup_test_git_repo();
    let base = propose(&path);
    commit_file(&path, "README.md", "# sample\n", "docs");

    let git = GitCli::new(&path);
    assert_eq!(git.merge_base("main", BRANCH).await.unwrap(), base);
    assert_ne!(git.branch_tip("main").await.unwrap(), base);
}

#[tokio::test]
async fn test_land_without_computed_at_rebases_onto_advanced_base() {
    if !git_available() {
        return;
    }
    let (_dir, path) = setup_test_git_repo();
    propose(&path);
    commit_file(&path, "README.md", "# sample\n", "docs");

    let landed = land::run(land_args(&path), &session()).await.unwrap();

    assert_eq!(landed.state, ProposalState::Merged);
    assert_eq!(show(&path, "main", "README.md"), "# sample");
    assert_eq!(show(&path, "main", "package.json"), PROPOSED_MANIFEST.trim());
}

#[tokio::test]
async fn test_land_command_keeps_rebasable_branch_change() {
    if !git_available() {
        return;
    }
    let (_dir, path) = setup_test_git_repo();
    propose(&path);
    commit_file(&path, "README.md", "# sample\n", "docs");

    land::execute(land_args(&path), &session()).await.unwrap();

    assert_eq!(show(&path, "main", "package.json"), PROPOSED_MANIFEST.trim());
    assert_eq!(show(&path, "main", "README.md"), "# sample");
}

#[tokio::test]
async fn test_land_without_computed_at_fails_for_unknown_branch() {
    if !git_available() {
        return;
    }
    let (_dir, path) = setup_test_git_repo();
    propose(&path);

    let args = LandArgs {
        branch: "fleetprint/missing".to_string(),
        ..land_args(&path)
    };
    assert!(land::run(args, &session()).await.is_err());
}
