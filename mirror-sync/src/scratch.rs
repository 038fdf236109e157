//! Scoped scratch-file guard.
//!
//! Downloads and extracted archive members pass through local scratch
//! storage. [`ScratchFile`] owns one such path and removes it on drop, so
//! every exit path out of entry processing, early returns and error
//! propagation included, leaves no partial file behind.

use std::path::{Path, PathBuf};
use tracing::debug;

/// A scratch path deleted on drop.
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Removed scratch file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => debug!(path = %self.path.display(), error = %e, "Scratch cleanup failed"),
        }
    }
}
