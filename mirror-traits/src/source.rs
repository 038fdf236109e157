//! Remote Change Source Abstraction
//!
//! Provides the capability trait for the remote file-storage side of the
//! mirror: cursor-based change listing plus full and streaming downloads.
//!
//! Implementations talk to a real cloud-storage API (or, for tests and
//! local development, a plain directory tree). The sync engine consumes
//! exactly one batch of [`ChangeEntry`] values per run and processes it in
//! delivery order, so implementations must preserve the ordering of the
//! underlying change feed.

use async_trait::async_trait;
use bytes::Bytes;
use std::path::Path;

use crate::error::Result;

/// A single file change reported by the remote source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    /// Stable remote identifier for the file (opaque, globally unique)
    pub id: String,
    /// Normalized path (the source's canonical form, `/`-separated).
    /// Deletions report the same canonical form, so paths compare by
    /// plain string equality.
    pub path: String,
    /// Display name (last path component, original casing)
    pub name: String,
    /// Size in bytes as reported by the source
    pub size: u64,
    /// Opaque revision token; changes whenever the content changes
    pub revision: String,
    /// Server-side modification time (Unix seconds)
    pub modified_at: i64,
}

/// One entry from the remote change feed.
///
/// The set of variants is closed on purpose: every dispatch site matches
/// exhaustively so a new entry kind cannot be dropped silently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEntry {
    /// A file was created or its content changed
    File(FileChange),
    /// The object at `path` was removed on the remote side
    Deleted { path: String },
    /// A folder appeared or changed; the engine ignores these
    Folder { path: String },
}

impl ChangeEntry {
    /// The normalized path this entry refers to
    pub fn path(&self) -> &str {
        match self {
            ChangeEntry::File(f) => &f.path,
            ChangeEntry::Deleted { path } => path,
            ChangeEntry::Folder { path } => path,
        }
    }
}

/// Capability trait for the remote file-storage client.
///
/// Listing calls paginate internally until the feed is exhausted and
/// return one flat, ordered batch plus the terminal cursor representing
/// "caught up to this point". Persisting that cursor and feeding it back
/// into [`list_changes`](ChangeSource::list_changes) resumes the feed.
#[async_trait]
pub trait ChangeSource: Send + Sync {
    /// Full recursive baseline listing from `root` ("" = account root).
    ///
    /// Returns every current file as a [`ChangeEntry::File`] plus the
    /// terminal cursor for subsequent incremental listings.
    async fn list_baseline(&self, root: &str) -> Result<(Vec<ChangeEntry>, String)>;

    /// Incremental change listing from a previously returned cursor.
    async fn list_changes(&self, cursor: &str) -> Result<(Vec<ChangeEntry>, String)>;

    /// Download a file's full content into memory.
    ///
    /// Only suitable for files below the engine's single-file size cap.
    async fn download(&self, path: &str) -> Result<Bytes>;

    /// Stream a large file directly to `dest` in bounded-size chunks.
    ///
    /// Returns the total number of bytes written. Memory usage stays
    /// constant regardless of file size.
    async fn download_to_file(&self, path: &str, dest: &Path) -> Result<u64>;
}
