//! Local checkouts as repository snapshots.

use std::path::{Path, PathBuf};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ProjectId, RepoSnapshot};

/// Directories never read into a snapshot.
const SKIPPED_DIRS: [&str; 4] = [".git", "node_modules", "target", ".fleetprint"];

/// Files larger than this are left out of snapshots.
const MAX_FILE_BYTES: u64 = 1024 * 1024;

/// Read the text files under `root` into a snapshot for `id`.
///
/// Binary (non-UTF-8) and oversized files are skipped; aspects only look
/// at text.
pub async fn load_snapshot(root: impl AsRef<Path>, id: ProjectId) -> DomainResult<RepoSnapshot> {
    let root = root.as_ref();
    let mut files = Vec::new();
    let mut pending: Vec<PathBuf> = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .map_err(|e| DomainError::Io(format!("{}: {e}", dir.display())))?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let file_type = entry.file_type().await?;
            if file_type.is_dir() {
                let skipped = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| SKIPPED_DIRS.contains(&n));
                if !skipped {
                    pending.push(path);
                }
                continue;
            }
            if !file_type.is_file() || entry.metadata().await?.len() > MAX_FILE_BYTES {
                continue;
            }

            let Ok(relative) = path.strip_prefix(root) else {
                continue;
            };
            let bytes = tokio::fs::read(&path).await?;
            match String::from_utf8(bytes) {
                Ok(text) => files.push((relative.to_string_lossy().into_owned(), text)),
                Err(_) => tracing::trace!(path = %relative.display(), "skipping non-UTF-8 file"),
            }
        }
    }

    tracing::debug!(project = %id, root = %root.display(), files = files.len(), "loaded snapshot");
    Ok(RepoSnapshot::of(id, files))
}

/// Write every file whose content differs between `before` and `after`.
///
/// Returns the paths written, in sorted order.
pub async fn write_changes(
    root: impl AsRef<Path>,
    before: &RepoSnapshot,
    after: &RepoSnapshot,
) -> DomainResult<Vec<String>> {
    let root = root.as_ref();
    let mut written = Vec::new();
    for path in after.paths() {
        let content = after.file_content(path)?;
        if before.read_file(path) == Some(content) {
            continue;
        }
        let target = root.join(path);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, content).await?;
        written.push(path.to_string());
    }
    Ok(written)
}
