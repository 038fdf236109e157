//! Local-directory Change Source Implementation
//!
//! Treats a directory tree as the "remote" account: a baseline listing is
//! a recursive walk, file ids are content-address-derived from relative
//! paths, and revisions combine size and mtime so an edited file shows up
//! as changed on the next pass.
//!
//! This is a development and test shim. It has no change feed, so
//! `list_changes` rescans the whole tree — the engine's revision index
//! turns unchanged files into no-ops — and deletions on disk are never
//! reported.

use async_trait::async_trait;
use bytes::Bytes;
use mirror_traits::error::{CapabilityError, Result};
use mirror_traits::source::{ChangeEntry, ChangeSource, FileChange};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::fs;
use tracing::debug;

/// Change source over a local directory tree.
pub struct FsChangeSource {
    root: PathBuf,
}

impl FsChangeSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Stable id for a file: truncated SHA-256 of its relative path.
    fn file_id(rel_path: &str) -> String {
        let digest = Sha256::digest(rel_path.as_bytes());
        digest[..16].iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Map a mirror path (leading `/`) back to a filesystem path.
    fn local_path(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }

    fn mtime_secs(meta: &std::fs::Metadata) -> i64 {
        meta.modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0)
    }

    /// Recursive walk producing one ordered batch of entries.
    async fn walk(&self, start: &Path) -> Result<Vec<ChangeEntry>> {
        let mut entries = Vec::new();
        let mut pending = vec![start.to_path_buf()];

        while let Some(dir) = pending.pop() {
            let mut reader = match fs::read_dir(&dir).await {
                Ok(reader) => reader,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            while let Some(dirent) = reader.next_entry().await? {
                let path = dirent.path();
                let rel = path
                    .strip_prefix(&self.root)
                    .map_err(|e| CapabilityError::OperationFailed(e.to_string()))?
                    .to_string_lossy()
                    .replace('\\', "/");
                let mirror_path = format!("/{rel}");

                if dirent.file_type().await?.is_dir() {
                    entries.push(ChangeEntry::Folder { path: mirror_path });
                    pending.push(path);
                    continue;
                }

                let meta = dirent.metadata().await?;
                let name = dirent.file_name().to_string_lossy().into_owned();
                entries.push(ChangeEntry::File(FileChange {
                    id: Self::file_id(&rel),
                    path: mirror_path,
                    name,
                    size: meta.len(),
                    revision: format!("{}:{}", meta.len(), Self::mtime_secs(&meta)),
                    modified_at: Self::mtime_secs(&meta),
                }));
            }
        }

        // read_dir order is platform-dependent; fix it so a batch is
        // reproducible across runs
        entries.sort_by(|a, b| a.path().cmp(b.path()));
        debug!(count = entries.len(), "Walked local tree");
        Ok(entries)
    }

    fn rescan_cursor() -> String {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        format!("rescan:{now}")
    }
}

#[async_trait]
impl ChangeSource for FsChangeSource {
    async fn list_baseline(&self, root: &str) -> Result<(Vec<ChangeEntry>, String)> {
        let start = self.local_path(root);
        let entries = self.walk(&start).await?;
        Ok((entries, Self::rescan_cursor()))
    }

    async fn list_changes(&self, _cursor: &str) -> Result<(Vec<ChangeEntry>, String)> {
        // No change feed on a plain filesystem: deliver a fresh full scan.
        self.list_baseline("").await
    }

    async fn download(&self, path: &str) -> Result<Bytes> {
        let local = self.local_path(path);
        match fs::read(&local).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(CapabilityError::NotFound(path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn download_to_file(&self, path: &str, dest: &Path) -> Result<u64> {
        let local = self.local_path(path);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await?;
        }
        let mut src = fs::File::open(&local).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CapabilityError::NotFound(path.to_string())
            } else {
                e.into()
            }
        })?;
        let mut out = fs::File::create(dest).await?;
        let bytes = tokio::io::copy(&mut src, &mut out).await?;
        Ok(bytes)
    }
}
