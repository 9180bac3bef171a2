//! End-to-end: load checkouts from disk, fingerprint them, measure drift
//! against a target, converge the laggard and write it back.

mod common;

use std::sync::Arc;

use common::{manifest, temp_dir};
use fleetprint::domain::models::{ApplyParameters, ClassifierConfig, ProjectId, SkipReason, TargetSelection};
use fleetprint::domain::ports::{ApplyContext, Aspect, ExtractionContext};
use fleetprint::infrastructure::workspace::{load_snapshot, write_changes};
use fleetprint::services::aspects::{builtin_aspects, LicenseAspect, NpmScriptsAspect};
use fleetprint::services::{AspectRegistry, ConvergenceEngine, DriftReport, DriftStatus, ExtractionPipeline};

const MIT: &str = "Permission is hereby granted, free of charge, to any person";

fn registry() -> AspectRegistry {
    AspectRegistry::from_aspects(builtin_aspects(&ClassifierConfig::default())).unwrap()
}

fn checkout(scripts: &str) -> tempfile::TempDir {
    let dir = temp_dir();
    std::fs::write(dir.path().join("package.json"), manifest("svc", "@atomist/sdm", scripts)).unwrap();
    std::fs::write(dir.path().join("LICENSE"), MIT).unwrap();
    std::fs::write(dir.path().join("deployment.yaml"), "kind: Deployment\n").unwrap();
    dir
}

#[tokio::test]
async fn test_laggard_converges_to_leader() {
    common::setup_test_logging();
    let leader_dir = checkout(r#"{ "build": "tsc", "test": "mocha" }"#);
    let laggard_dir = checkout(r#"{ "build": "tsc" }"#);

    let leader = load_snapshot(leader_dir.path(), ProjectId::new("atomist", "leader")).await.unwrap();
    let laggard = load_snapshot(laggard_dir.path(), ProjectId::new("atomist", "laggard")).await.unwrap();

    let pipeline = ExtractionPipeline::new(registry());
    let ctx = ExtractionContext::default();
    let reports = pipeline.extract_fleet(&[leader, laggard.clone()], &ctx).await;
    assert_eq!(reports.len(), 2);
    assert!(reports.iter().all(|r| r.failures.is_empty()));
    assert!(reports.iter().all(|r| r.fingerprints.len() == 3));

    let targets = TargetSelection::new(reports[0].fingerprints.clone());
    let drift = DriftReport::compare(laggard.id.clone(), &reports[1].fingerprints, &targets);
    let diverged: Vec<_> = drift.diverged().map(|e| e.name.as_str()).collect();
    assert_eq!(diverged, vec!["npm-scripts-sdm"]);

    let target = targets.for_name("npm-scripts-sdm").unwrap().clone();
    let engine = ConvergenceEngine::new(registry());
    let outcome = engine
        .apply(laggard.clone(), &ApplyParameters::target(target), &ApplyContext::default())
        .await;
    assert!(outcome.is_applied());

    let written = write_changes(laggard_dir.path(), &laggard, outcome.snapshot()).await.unwrap();
    assert_eq!(written, vec!["package.json"]);

    let reloaded = load_snapshot(laggard_dir.path(), ProjectId::new("atomist", "laggard")).await.unwrap();
    let after = pipeline.extract_all(&reloaded, &ctx).await;
    let drift = DriftReport::compare(reloaded.id.clone(), &after, &targets);
    assert!(drift.is_converged());
    assert!(drift.entries.iter().all(|e| e.status == DriftStatus::InSync));
}

#[tokio::test]
async fn test_read_only_target_leaves_checkout_untouched() {
    let dir = checkout(r#"{ "build": "tsc" }"#);
    let snapshot = load_snapshot(dir.path(), ProjectId::new("atomist", "x")).await.unwrap();

    let license = LicenseAspect
        .extract(&snapshot, &ExtractionContext::default())
        .await
        .unwrap()
        .remove(0);
    let outcome = ConvergenceEngine::new(registry())
        .apply(snapshot.clone(), &ApplyParameters::target(license), &ApplyContext::default())
        .await;

    assert_eq!(outcome.skip_reason(), Some(SkipReason::ReadOnlyAspect));
    assert!(write_changes(dir.path(), &snapshot, outcome.snapshot()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_registry_can_be_narrowed_to_one_aspect() {
    let dir = checkout(r#"{ "build": "tsc" }"#);
    let snapshot = load_snapshot(dir.path(), ProjectId::new("atomist", "x")).await.unwrap();

    let only_scripts = registry().only(&["npm-scripts".to_string()]).unwrap();
    assert_eq!(only_scripts.names(), vec!["npm-scripts"]);

    let fps = ExtractionPipeline::new(only_scripts)
        .extract_all(&snapshot, &ExtractionContext::default())
        .await;
    assert_eq!(fps.len(), 1);
    assert_eq!(fps[0].fingerprint_type, "npm-scripts");

    let mut manual = AspectRegistry::new();
    manual.register(Arc::new(NpmScriptsAspect::new())).unwrap();
    assert!(manual.register(Arc::new(NpmScriptsAspect::new())).is_err());
    assert!(registry().only(&["no-such-aspect".to_string()]).is_err());
}
