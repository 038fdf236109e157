//! Directory-backed Object Store Implementation
//!
//! Maps object keys to relative paths under a root directory. Suitable for
//! local development and integration tests; the production mirror runs
//! against a real bucket behind the same trait.

use async_trait::async_trait;
use bytes::Bytes;
use mirror_traits::error::{CapabilityError, Result};
use mirror_traits::store::ObjectStore;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Object store over a local directory.
///
/// Keys are `/`-separated relative paths; `put` creates intermediate
/// directories as needed. Upload calls return `file://` URIs. Content
/// types are accepted for interface compatibility but not persisted —
/// the local filesystem has nowhere to keep them.
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    /// Create a store rooted at `root`. The directory is created lazily
    /// on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a key to a path under the root, rejecting traversal.
    fn resolve(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || key.split('/').any(|seg| seg == "..") {
            return Err(CapabilityError::OperationFailed(format!(
                "invalid object key: {key:?}"
            )));
        }
        Ok(self.root.join(key))
    }

    fn uri_for(&self, path: &Path) -> String {
        format!("file://{}", path.display())
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn put_bytes(&self, key: &str, data: Bytes, _content_type: &str) -> Result<String> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, &data).await?;
        debug!(key, bytes = data.len(), "Stored object");
        Ok(self.uri_for(&path))
    }

    async fn put_file(&self, key: &str, local: &Path, _content_type: &str) -> Result<String> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let bytes = fs::copy(local, &path).await?;
        debug!(key, bytes, "Stored object from file");
        Ok(self.uri_for(&path))
    }

    async fn get(&self, key: &str) -> Result<Bytes> {
        let path = self.resolve(key)?;
        match fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(CapabilityError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn size(&self, key: &str) -> Result<u64> {
        let path = self.resolve(key)?;
        match fs::metadata(&path).await {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.resolve(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(key, "Deleted object");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut pending = vec![self.root.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if entry.file_type().await?.is_dir() {
                    pending.push(path);
                    continue;
                }
                let rel = path
                    .strip_prefix(&self.root)
                    .map_err(|e| CapabilityError::OperationFailed(e.to_string()))?;
                let key = rel.to_string_lossy().replace('\\', "/");
                if key.starts_with(prefix) {
                    keys.push(key);
                }
            }
        }

        keys.sort();
        Ok(keys)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let path = self.resolve(key)?;
        Ok(fs::try_exists(&path).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, FsObjectStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStore::new(dir.path());
        (dir, store)
    }

    #[tokio::test]
    async fn put_get_roundtrip() {
        let (_dir, store) = store();
        let uri = store
            .put_bytes("mirror/docs/a.pdf", Bytes::from_static(b"pdf"), "application/pdf")
            .await
            .unwrap();
        assert!(uri.starts_with("file://"));
        assert_eq!(store.get("mirror/docs/a.pdf").await.unwrap().as_ref(), b"pdf");
        assert_eq!(store.size("mirror/docs/a.pdf").await.unwrap(), 3);
        assert!(store.exists("mirror/docs/a.pdf").await.unwrap());
    }

    #[tokio::test]
    async fn get_missing_is_not_found() {
        let (_dir, store) = store();
        let err = store.get("mirror/meta/nope.json").await.unwrap_err();
        assert!(matches!(err, CapabilityError::NotFound(_)));
        assert_eq!(store.size("mirror/meta/nope.json").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let (_dir, store) = store();
        store
            .put_bytes("k", Bytes::from_static(b"x"), "application/octet-stream")
            .await
            .unwrap();
        store.delete("k").await.unwrap();
        store.delete("k").await.unwrap();
        assert!(!store.exists("k").await.unwrap());
    }

    #[tokio::test]
    async fn list_filters_by_prefix() {
        let (_dir, store) = store();
        for key in ["mirror/meta/1.json", "mirror/meta/2.json", "mirror/images/1"] {
            store
                .put_bytes(key, Bytes::from_static(b"x"), "application/octet-stream")
                .await
                .unwrap();
        }
        let keys = store.list("mirror/meta/").await.unwrap();
        assert_eq!(keys, vec!["mirror/meta/1.json", "mirror/meta/2.json"]);
    }

    #[tokio::test]
    async fn rejects_traversal_keys() {
        let (_dir, store) = store();
        assert!(store.get("../escape").await.is_err());
    }
}
