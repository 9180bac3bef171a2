//! Command-line surface parsing.

use std::path::PathBuf;

use clap::{CommandFactory, Parser};
use fleetprint::cli::{Cli, Commands};

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("fleetprint").chain(args.iter().copied())).unwrap()
}

#[test]
fn test_command_definition_is_consistent() {
    Cli::command().debug_assert();
}

#[test]
fn test_extract_accepts_many_paths() {
    let cli = parse(&["extract", "-p", "a", "--path", "b", "--owner", "atomist"]);
    let Commands::Extract(args) = cli.command else {
        panic!("expected extract");
    };
    assert_eq!(args.paths, vec![PathBuf::from("a"), PathBuf::from("b")]);
    assert_eq!(args.owner, "atomist");
    assert!(args.repo.is_none());
}

#[test]
fn test_extract_defaults_to_current_directory() {
    let Commands::Extract(args) = parse(&["extract"]).command else {
        panic!("expected extract");
    };
    assert_eq!(args.paths, vec![PathBuf::from(".")]);
    assert_eq!(args.owner, "local");
}

#[test]
fn test_global_flags_after_subcommand() {
    let cli = parse(&["check", "-t", "targets.json", "--json", "--token", "abc", "-c", "conf.yaml"]);
    assert!(cli.json);
    assert_eq!(cli.token.as_deref(), Some("abc"));
    assert_eq!(cli.config, Some(PathBuf::from("conf.yaml")));
    let Commands::Check(args) = cli.command else {
        panic!("expected check");
    };
    assert_eq!(args.targets, PathBuf::from("targets.json"));
    assert_eq!(args.checkout.path, PathBuf::from("."));
}

#[test]
fn test_token_falls_back_to_environment() {
    temp_env::with_var("FLEETPRINT_TOKEN", Some("from-env"), || {
        assert_eq!(parse(&["extract"]).token.as_deref(), Some("from-env"));
    });
    temp_env::with_var_unset("FLEETPRINT_TOKEN", || {
        assert!(parse(&["extract"]).token.is_none());
    });
}

#[test]
fn test_apply_write_is_opt_in() {
    let Commands::Apply(args) = parse(&["apply", "-t", "fp.json", "-p", "repo"]).command else {
        panic!("expected apply");
    };
    assert!(!args.write);
    assert_eq!(args.checkout.path, PathBuf::from("repo"));

    let Commands::Apply(args) = parse(&["apply", "-t", "fp.json", "--write"]).command else {
        panic!("expected apply");
    };
    assert!(args.write);
}

#[test]
fn test_land_options() {
    let cli = parse(&[
        "land",
        "-b",
        "fleetprint/npm-scripts-sdm",
        "--base",
        "develop",
        "--strategy",
        "theirs",
        "--no-rebase",
        "--leave-branch",
    ]);
    let Commands::Land(args) = cli.command else {
        panic!("expected land");
    };
    assert_eq!(args.branch, "fleetprint/npm-scripts-sdm");
    assert_eq!(args.base.as_deref(), Some("develop"));
    assert_eq!(args.strategy.as_deref(), Some("theirs"));
    assert!(args.no_rebase && args.leave_branch);
    assert!(args.computed_at.is_none());
}

#[test]
fn test_missing_required_arguments_are_rejected() {
    assert!(Cli::try_parse_from(["fleetprint", "check"]).is_err());
    assert!(Cli::try_parse_from(["fleetprint", "land"]).is_err());
    assert!(Cli::try_parse_from(["fleetprint"]).is_err());
}
