//! Object Store Abstraction
//!
//! Capability trait for the bucket that holds mirrored objects, metadata
//! sidecars, and the engine's persisted state documents.
//!
//! The store offers no atomicity, versioning, or locking. The sync engine
//! is responsible for sequencing its reads and writes so that a crash
//! between two writes leaves the mirror in a recoverable state.

use async_trait::async_trait;
use bytes::Bytes;
use std::path::Path;

use crate::error::Result;

/// Capability trait for the object-storage client.
///
/// Keys are `/`-separated strings; prefixes compose by plain string
/// concatenation. Upload calls return the storage URI of the written
/// object (e.g. a `gs://` or `file://` URI depending on the backend).
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload raw bytes under `key`. Overwrites any existing object.
    async fn put_bytes(&self, key: &str, data: Bytes, content_type: &str) -> Result<String>;

    /// Upload a local file under `key` without buffering it in memory.
    async fn put_file(&self, key: &str, local: &Path, content_type: &str) -> Result<String>;

    /// Download an object's content.
    ///
    /// # Errors
    ///
    /// Returns [`CapabilityError::NotFound`](crate::CapabilityError::NotFound)
    /// when no object exists at `key`.
    async fn get(&self, key: &str) -> Result<Bytes>;

    /// Size of the object in bytes; 0 when the object does not exist.
    async fn size(&self, key: &str) -> Result<u64>;

    /// Delete the object at `key`. A missing object is not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// List all object keys under `prefix`.
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;

    /// Check whether an object exists at `key`.
    async fn exists(&self, key: &str) -> Result<bool>;
}
