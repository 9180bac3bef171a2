//! Repository snapshot model.
//!
//! A [`RepoSnapshot`] is an immutable, in-memory view of a repository's text
//! files at one point in time. Extraction only reads it; applying a target
//! produces a new snapshot through [`RepoSnapshot::with_file`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::domain::errors::{DomainError, DomainResult};

/// Coordinates of a repository within the fleet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectId {
    pub owner: String,
    pub repo: String,
    /// Branch the snapshot was taken from, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    /// Commit the snapshot was taken at, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
}

impl ProjectId {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            branch: None,
            sha: None,
        }
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    pub fn with_sha(mut self, sha: impl Into<String>) -> Self {
        self.sha = Some(sha.into());
        self
    }

    /// Most precise git ref known for this snapshot: commit, then branch, then `HEAD`.
    pub fn git_ref(&self) -> &str {
        self.sha
            .as_deref()
            .or(self.branch.as_deref())
            .unwrap_or("HEAD")
    }

    /// Browser link to a file of this repository on GitHub.
    pub fn file_url(&self, path: &str) -> String {
        format!(
            "https://github.com/{}/{}/blob/{}/{}",
            self.owner,
            self.repo,
            self.git_ref(),
            path
        )
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Read-only file tree of one repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoSnapshot {
    pub id: ProjectId,
    files: BTreeMap<String, String>,
}

impl RepoSnapshot {
    pub fn new(id: ProjectId) -> Self {
        Self {
            id,
            files: BTreeMap::new(),
        }
    }

    /// Build a snapshot from `(path, content)` pairs.
    pub fn of<I, P, C>(id: ProjectId, files: I) -> Self
    where
        I: IntoIterator<Item = (P, C)>,
        P: Into<String>,
        C: Into<String>,
    {
        Self {
            id,
            files: files
                .into_iter()
                .map(|(path, content)| (normalize_path(&path.into()), content.into()))
                .collect(),
        }
    }

    pub fn has_file(&self, path: &str) -> bool {
        self.files.contains_key(&normalize_path(path))
    }

    pub fn read_file(&self, path: &str) -> Option<&str> {
        self.files.get(&normalize_path(path)).map(String::as_str)
    }

    /// Like [`read_file`](Self::read_file) but reports a missing file as an error.
    pub fn file_content(&self, path: &str) -> DomainResult<&str> {
        self.read_file(path).ok_or_else(|| DomainError::FileNotFound {
            project: self.id.to_string(),
            path: path.to_string(),
        })
    }

    /// A new snapshot identical to this one except for `path`.
    pub fn with_file(&self, path: &str, content: impl Into<String>) -> Self {
        let mut files = self.files.clone();
        files.insert(normalize_path(path), content.into());
        Self {
            id: self.id.clone(),
            files,
        }
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}

fn normalize_path(path: &str) -> String {
    path.trim_start_matches("./").trim_start_matches('/').replace('\\', "/")
}

/// Credentials the caller holds for a repository's hosting service.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Credentials {
    /// Bearer token credentials.
    Token { token: String },
    /// Username/password credentials.
    Basic { username: String, password: String },
}

impl Credentials {
    pub fn token(token: impl Into<String>) -> Self {
        Self::Token {
            token: token.into(),
        }
    }

    /// `Authorization` header value, only for token credentials.
    pub fn bearer_header(&self) -> Option<String> {
        match self {
            Self::Token { token } => Some(format!("Bearer {token}")),
            Self::Basic { .. } => None,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token { .. } => f.write_str("Credentials::Token([REDACTED])"),
            Self::Basic { username, .. } => write!(f, "Credentials::Basic({username}, [REDACTED])"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_file_leaves_original_untouched() {
        let snapshot = RepoSnapshot::of(ProjectId::new("o", "r"), [("a.txt", "one")]);
        let changed = snapshot.with_file("a.txt", "two");
        assert_eq!(snapshot.read_file("a.txt"), Some("one"));
        assert_eq!(changed.read_file("a.txt"), Some("two"));
    }

    #[test]
    fn test_paths_are_normalized() {
        let snapshot = RepoSnapshot::of(ProjectId::new("o", "r"), [("./dir\\file", "x")]);
        assert!(snapshot.has_file("dir/file"));
        assert!(snapshot.has_file("/dir/file"));
    }

    #[test]
    fn test_file_content_missing_is_error() {
        let snapshot = RepoSnapshot::new(ProjectId::new("o", "r"));
        assert!(matches!(
            snapshot.file_content("package.json"),
            Err(DomainError::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_git_ref_precedence() {
        let id = ProjectId::new("o", "r");
        assert_eq!(id.git_ref(), "HEAD");
        let id = id.with_branch("main");
        assert_eq!(id.git_ref(), "main");
        let id = id.with_sha("abc123");
        assert_eq!(id.file_url("package.json"), "https://github.com/o/r/blob/abc123/package.json");
    }

    #[test]
    fn test_bearer_header_only_for_tokens() {
        assert_eq!(
            Credentials::token("t0k").bearer_header().as_deref(),
            Some("Bearer t0k")
        );
        let basic = Credentials::Basic {
            username: "u".into(),
            password: "p".into(),
        };
        assert!(basic.bearer_header().is_none());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let rendered = format!("{:?}", Credentials::token("super-secret"));
        assert!(!rendered.contains("super-secret"));
    }
}
