//! Fingerprint value type and content digesting.
//!
//! A fingerprint is a named, versioned fact about a repository. Its `sha` is
//! computed over the *significant* part of the payload only, serialized in a
//! canonical form, so two repositories with the same significant fact always
//! carry the same digest no matter what incidental data rides along.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::domain::errors::DomainResult;

/// A content-addressed fact extracted from a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprint {
    /// Stable category identifier, e.g. `"npm-scripts"`.
    #[serde(rename = "type")]
    pub fingerprint_type: String,
    /// Unique name within one repository's fingerprint set.
    pub name: String,
    /// Category-specific payload, including non-significant display fields.
    pub data: Value,
    /// Digest of the significant payload.
    pub sha: String,
    pub abbreviation: String,
    pub version: String,
}

impl Fingerprint {
    /// Build a fingerprint whose `sha` covers `significant` and whose `data`
    /// is the full `data` payload.
    ///
    /// Callers choose what is significant; anything only present in `data`
    /// never influences the digest.
    pub fn new<D, S>(
        fingerprint_type: impl Into<String>,
        name: impl Into<String>,
        abbreviation: impl Into<String>,
        version: impl Into<String>,
        data: &D,
        significant: &S,
    ) -> DomainResult<Self>
    where
        D: Serialize + ?Sized,
        S: Serialize + ?Sized,
    {
        Ok(Self {
            fingerprint_type: fingerprint_type.into(),
            name: name.into(),
            data: serde_json::to_value(data)?,
            sha: digest(significant)?,
            abbreviation: abbreviation.into(),
            version: version.into(),
        })
    }

    /// Decode the payload into the aspect's typed data record.
    pub fn data_as<T: serde::de::DeserializeOwned>(&self) -> DomainResult<T> {
        Ok(serde_json::from_value(self.data.clone())?)
    }

    /// Whether two fingerprints describe the same fact with the same content.
    pub fn same_content(&self, other: &Self) -> bool {
        self.name == other.name && self.sha == other.sha
    }
}

/// SHA-256 over the canonical JSON form of `payload`, as lowercase hex.
pub fn digest<S: Serialize + ?Sized>(payload: &S) -> DomainResult<String> {
    let canonical = canonical_json(payload)?;
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Serialize `payload` to compact JSON with object keys sorted at every depth.
pub fn canonical_json<S: Serialize + ?Sized>(payload: &S) -> DomainResult<String> {
    let value = sort_keys(serde_json::to_value(payload)?);
    Ok(serde_json::to_string(&value)?)
}

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let mut sorted = Map::new();
            for (key, value) in entries {
                sorted.insert(key, sort_keys(value));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}
