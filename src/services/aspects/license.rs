//! License aspect: which license a repository ships under.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::package_json::{PackageManifest, PACKAGE_JSON};
use crate::domain::errors::DomainResult;
use crate::domain::models::{Fingerprint, RepoSnapshot};
use crate::domain::ports::{Aspect, AspectDetails, ExtractionContext};

pub const LICENSE: &str = "license";
const ABBREVIATION: &str = "lic";
const VERSION: &str = "0.0.1";

/// Files checked for license text, in order.
pub const LICENSE_FILES: [&str; 4] = ["LICENSE", "LICENSE.md", "LICENSE.txt", "COPYING"];

/// Classification used when license text matches no known signature.
pub const UNKNOWN_LICENSE: &str = "unknown";

/// Text signatures of common licenses, checked in order.
const SIGNATURES: [(&str, &str); 5] = [
    ("Apache-2.0", "Apache License"),
    ("MIT", "Permission is hereby granted, free of charge"),
    ("GPL-3.0", "GNU GENERAL PUBLIC LICENSE"),
    ("BSD-3-Clause", "Neither the name of"),
    ("ISC", "Permission to use, copy, modify, and/or distribute"),
];

/// Full payload; only `classification` is digested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseFingerprintData {
    pub classification: String,
    /// Where the classification came from.
    pub path: String,
}

/// SPDX-ish identifier for a license text.
pub fn classify_license_text(text: &str) -> &'static str {
    SIGNATURES
        .iter()
        .find(|(_, signature)| text.contains(signature))
        .map_or(UNKNOWN_LICENSE, |(id, _)| *id)
}

pub fn license_fingerprint(classification: &str, path: &str) -> DomainResult<Fingerprint> {
    let data = LicenseFingerprintData {
        classification: classification.to_string(),
        path: path.to_string(),
    };
    Fingerprint::new(
        LICENSE,
        LICENSE,
        ABBREVIATION,
        VERSION,
        &data,
        &serde_json::json!({ "classification": data.classification }),
    )
}

/// Read-only: convergence of license text is a legal decision, not a rewrite.
#[derive(Debug, Clone, Copy, Default)]
pub struct LicenseAspect;

impl LicenseAspect {
    fn scan(snapshot: &RepoSnapshot) -> DomainResult<Vec<Fingerprint>> {
        if let Some((path, text)) = LICENSE_FILES
            .iter()
            .find_map(|path| snapshot.read_file(path).map(|text| (*path, text)))
        {
            let classification = classify_license_text(text);
            tracing::debug!(project = %snapshot.id, path, classification, "classified license file");
            return Ok(vec![license_fingerprint(classification, path)?]);
        }

        let Some(text) = snapshot.read_file(PACKAGE_JSON) else {
            return Ok(Vec::new());
        };
        match PackageManifest::parse(text) {
            Ok(manifest) => match manifest.license_id() {
                Some(id) => Ok(vec![license_fingerprint(id, PACKAGE_JSON)?]),
                None => Ok(Vec::new()),
            },
            Err(err) => {
                tracing::warn!(project = %snapshot.id, error = %err, "unparseable package.json; no license fingerprint");
                Ok(Vec::new())
            }
        }
    }
}

#[async_trait]
impl Aspect for LicenseAspect {
    fn name(&self) -> &str {
        LICENSE
    }

    fn display_name(&self) -> &str {
        "License"
    }

    async fn extract(
        &self,
        snapshot: &RepoSnapshot,
        ctx: &ExtractionContext,
    ) -> DomainResult<Vec<Fingerprint>> {
        ctx.span.in_scope(|| Self::scan(snapshot))
    }

    fn to_displayable_fingerprint(&self, fp: &Fingerprint) -> String {
        fp.data
            .get("classification")
            .and_then(Value::as_str)
            .unwrap_or(UNKNOWN_LICENSE)
            .to_string()
    }

    fn to_displayable_fingerprint_name(&self, _name: &str) -> String {
        "License".to_string()
    }

    fn details(&self) -> AspectDetails {
        AspectDetails {
            description: "Repository license".to_string(),
            short_name: LICENSE.to_string(),
            display_name: "License".to_string(),
            unit: "license".to_string(),
            category: "Legal".to_string(),
            url: format!("fingerprint/{LICENSE}/{LICENSE}?byOrg=true&trim=false"),
            manage: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{ApplyOutcome, ProjectId, SkipReason};
    use crate::domain::ports::ApplyContext;

    fn extract(files: &[(&str, &str)]) -> Vec<Fingerprint> {
        let snapshot = RepoSnapshot::of(ProjectId::new("o", "r"), files.iter().copied());
        tokio_test::block_on(LicenseAspect.extract(&snapshot, &ExtractionContext::default())).unwrap()
    }

    #[test]
    fn test_license_file_precedes_manifest() {
        let fps = extract(&[
            ("LICENSE.md", "                                 Apache License\n Version 2.0"),
            (PACKAGE_JSON, r#"{"license": "MIT"}"#),
        ]);
        assert_eq!(fps.len(), 1);
        assert_eq!(LicenseAspect.to_displayable_fingerprint(&fps[0]), "Apache-2.0");
        assert_eq!(fps[0].data["path"], "LICENSE.md");
    }

    #[test]
    fn test_unrecognized_text_is_unknown() {
        let fps = extract(&[("COPYING", "All rights reserved.")]);
        assert_eq!(LicenseAspect.to_displayable_fingerprint(&fps[0]), UNKNOWN_LICENSE);
    }

    #[test]
    fn test_manifest_fallback_and_absence() {
        let fps = extract(&[(PACKAGE_JSON, r#"{"license": "ISC"}"#)]);
        assert_eq!(LicenseAspect.to_displayable_fingerprint(&fps[0]), "ISC");
        assert!(extract(&[(PACKAGE_JSON, r#"{"name": "x"}"#)]).is_empty());
        assert!(extract(&[]).is_empty());
    }

    #[test]
    fn test_same_license_from_different_paths_shares_sha() {
        let a = license_fingerprint("MIT", "LICENSE").unwrap();
        let b = license_fingerprint("MIT", PACKAGE_JSON).unwrap();
        assert_eq!(a.sha, b.sha);
    }

    #[test]
    fn test_apply_is_not_supported() {
        let snapshot = RepoSnapshot::new(ProjectId::new("o", "r"));
        let target = license_fingerprint("MIT", "LICENSE").unwrap();
        assert!(!LicenseAspect.supports_apply());
        let outcome = tokio_test::block_on(LicenseAspect.apply(&snapshot, &target, &ApplyContext::default())).unwrap();
        assert!(matches!(outcome, ApplyOutcome::Skipped { reason: SkipReason::ReadOnlyAspect, .. }));
    }
}
