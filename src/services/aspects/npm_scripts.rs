//! npm scripts consistency aspect.
//!
//! Keeps the `package.json` `scripts` block consistent within categories of
//! projects. Each category gets its own fingerprint; only `scripts` feed the
//! digest, the link to the manifest is carried for display.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use super::package_json::{set_top_level_member, PackageManifest, PACKAGE_JSON};
use crate::domain::errors::DomainResult;
use crate::domain::models::{ApplyOutcome, Fingerprint, RepoSnapshot, SkipReason};
use crate::domain::ports::{ApplyContext, Aspect, AspectDetails, ExtractionContext};

pub const NPM_SCRIPTS: &str = "npm-scripts";
const ABBREVIATION: &str = "npmscr";
const VERSION: &str = "0.0.1";

/// Project categories whose scripts are kept consistent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScriptCategory {
    /// SDMs built on the aspect pack.
    #[serde(rename = "aspect-sdm")]
    AspectSdm,
    /// Any other SDM.
    #[serde(rename = "sdm")]
    Sdm,
}

impl ScriptCategory {
    /// Categories in match precedence order, each with its marker dependency.
    pub const PRECEDENCE: [(Self, &'static str); 2] = [
        (Self::AspectSdm, "@atomist/sdm-pack-aspect"),
        (Self::Sdm, "@atomist/sdm"),
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AspectSdm => "aspect-sdm",
            Self::Sdm => "sdm",
        }
    }

    /// First category whose marker dependency the manifest declares.
    pub fn classify(manifest: &PackageManifest) -> Option<Self> {
        Self::PRECEDENCE
            .iter()
            .find(|(_, marker)| manifest.depends_on(marker))
            .map(|(category, _)| *category)
    }

    pub fn fingerprint_name(&self) -> String {
        format!("{NPM_SCRIPTS}-{}", self.as_str())
    }
}

impl fmt::Display for ScriptCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of an npm-scripts fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptsFingerprintData {
    pub scripts: BTreeMap<String, String>,
    /// Display-only link to the manifest.
    pub link: String,
}

/// Fingerprint for `scripts` in `category`; `link` is not digested.
pub fn scripts_fingerprint(
    category: ScriptCategory,
    scripts: BTreeMap<String, String>,
    link: String,
) -> DomainResult<Fingerprint> {
    let data = ScriptsFingerprintData { scripts, link };
    Fingerprint::new(
        NPM_SCRIPTS,
        category.fingerprint_name(),
        ABBREVIATION,
        VERSION,
        &data,
        &data.scripts,
    )
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NpmScriptsAspect;

impl NpmScriptsAspect {
    pub const fn new() -> Self {
        Self
    }

    fn scan(snapshot: &RepoSnapshot) -> DomainResult<Vec<Fingerprint>> {
        let Some(text) = snapshot.read_file(PACKAGE_JSON) else {
            tracing::debug!(project = %snapshot.id, "no package.json; npm-scripts not applicable");
            return Ok(Vec::new());
        };

        let manifest = match PackageManifest::parse(text) {
            Ok(manifest) => manifest,
            Err(err) => {
                tracing::warn!(project = %snapshot.id, error = %err, "unparseable package.json; no npm-scripts fingerprint");
                return Ok(Vec::new());
            }
        };

        let Some(category) = ScriptCategory::classify(&manifest) else {
            tracing::debug!(project = %snapshot.id, "not an SDM; npm-scripts not applicable");
            return Ok(Vec::new());
        };

        let link = snapshot.id.file_url(PACKAGE_JSON);
        let fp = scripts_fingerprint(category, manifest.scripts, link)?;
        tracing::debug!(project = %snapshot.id, name = %fp.name, sha = %fp.sha, "extracted npm-scripts fingerprint");
        Ok(vec![fp])
    }

    /// Rewrite only the `scripts` member of the manifest to the target's.
    fn converge(snapshot: &RepoSnapshot, target: &Fingerprint) -> DomainResult<ApplyOutcome> {
        let Some(text) = snapshot.read_file(PACKAGE_JSON) else {
            tracing::info!(project = %snapshot.id, "no package.json to converge");
            return Ok(ApplyOutcome::Skipped {
                snapshot: snapshot.clone(),
                reason: SkipReason::NotApplicable,
            });
        };

        let data: ScriptsFingerprintData = target.data_as()?;
        let scripts = Value::Object(
            data.scripts
                .into_iter()
                .map(|(name, command)| (name, Value::String(command)))
                .collect(),
        );
        let updated = set_top_level_member(text, "scripts", &scripts)?;

        if updated == text {
            tracing::debug!(project = %snapshot.id, target = %target.name, "scripts already converged");
        } else {
            tracing::info!(project = %snapshot.id, target = %target.name, "rewrote package.json scripts");
        }
        Ok(ApplyOutcome::Applied(snapshot.with_file(PACKAGE_JSON, updated)))
    }
}

#[async_trait]
impl Aspect for NpmScriptsAspect {
    fn name(&self) -> &str {
        NPM_SCRIPTS
    }

    fn display_name(&self) -> &str {
        "npm scripts"
    }

    async fn extract(
        &self,
        snapshot: &RepoSnapshot,
        ctx: &ExtractionContext,
    ) -> DomainResult<Vec<Fingerprint>> {
        ctx.span.in_scope(|| Self::scan(snapshot))
    }

    fn supports_apply(&self) -> bool {
        true
    }

    async fn apply(
        &self,
        snapshot: &RepoSnapshot,
        target: &Fingerprint,
        ctx: &ApplyContext,
    ) -> DomainResult<ApplyOutcome> {
        ctx.span.in_scope(|| Self::converge(snapshot, target))
    }

    fn to_displayable_fingerprint(&self, fp: &Fingerprint) -> String {
        fp.data
            .get("link")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }

    fn to_displayable_fingerprint_name(&self, name: &str) -> String {
        let category = name
            .strip_prefix(NPM_SCRIPTS)
            .map_or(name, |rest| rest.trim_start_matches('-'));
        format!("NPM Scripts for {category}")
    }

    fn details(&self) -> AspectDetails {
        AspectDetails {
            description: "NPM Scripts".to_string(),
            short_name: NPM_SCRIPTS.to_string(),
            display_name: "NPM Scripts".to_string(),
            unit: "scripts".to_string(),
            category: "npm".to_string(),
            url: format!("fingerprint/{NPM_SCRIPTS}/*?byOrg=true&trim=false"),
            manage: true,
        }
    }
}
