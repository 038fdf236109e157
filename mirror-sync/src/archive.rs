//! # Archive Streamer
//!
//! Lazily extracts zip members to scratch storage, one entry on disk at a
//! time, so memory and disk stay bounded regardless of archive size.
//!
//! Contract: each yielded [`ExtractedEntry`] has its bytes fully
//! materialized at `local_path` before it is returned; the caller owns
//! that path and must remove it after consuming (wrap it in a
//! [`ScratchFile`](crate::scratch::ScratchFile)). The sequence is finite
//! and non-restartable.
//!
//! Filtering:
//! - directory entries, `__MACOSX/` resource junk, and hidden-dot
//!   basenames are skipped silently;
//! - entries whose declared size exceeds the per-member cap are skipped
//!   with a warning;
//! - a per-entry read failure removes the partial output and moves on;
//! - central-directory corruption terminates the sequence early. The run
//!   keeps whatever was already yielded.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;
use zip::read::ZipArchive;
use zip::result::ZipError;

/// One archive member, materialized on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedEntry {
    /// Path inside the archive, `/`-separated.
    pub inner_path: String,
    /// Basename of the member.
    pub filename: String,
    /// Scratch location of the extracted bytes. Owned by the caller.
    pub local_path: PathBuf,
    /// Uncompressed size in bytes.
    pub size: u64,
}

/// Streaming extractor over a downloaded archive file.
pub struct ArchiveExtractor {
    archive: ZipArchive<File>,
    source_path: String,
    scratch_dir: PathBuf,
    max_member_size: u64,
    next_index: usize,
}

impl ArchiveExtractor {
    /// Open a local archive for extraction. `source_path` is the logical
    /// remote path, used only for log context. Fails when the file is not
    /// a readable zip; the caller treats that as a recoverable condition.
    pub fn open(
        archive_path: &Path,
        source_path: &str,
        scratch_dir: &Path,
        max_member_size: u64,
    ) -> io::Result<Self> {
        let file = File::open(archive_path)?;
        let archive = ZipArchive::new(file)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
        Ok(Self {
            archive,
            source_path: source_path.to_string(),
            scratch_dir: scratch_dir.to_path_buf(),
            max_member_size,
            next_index: 0,
        })
    }

    /// Whether a member should be passed over without comment.
    fn is_junk(inner_path: &str, filename: &str) -> bool {
        inner_path.starts_with("__MACOSX/") || filename.starts_with('.')
    }

    fn extract_one(&mut self, index: usize) -> Option<ExtractedEntry> {
        let total = self.archive.len();
        let mut entry = match self.archive.by_index(index) {
            Ok(entry) => entry,
            Err(ZipError::Io(e)) => {
                warn!(archive = %self.source_path, index, error = %e, "Failed to read archive member");
                return None;
            }
            Err(e) => {
                // Corrupt central directory; stop iterating this archive
                warn!(archive = %self.source_path, index, error = %e, "Corrupt archive, truncating extraction");
                self.next_index = total;
                return None;
            }
        };

        if entry.is_dir() {
            return None;
        }
        let inner_path = match entry.enclosed_name() {
            Some(path) => path.to_string_lossy().replace('\\', "/"),
            // Traversal or otherwise unsafe name
            None => {
                warn!(archive = %self.source_path, name = entry.name(), "Unsafe member path, skipping");
                return None;
            }
        };
        let filename = inner_path.rsplit('/').next().unwrap_or(&inner_path).to_string();
        if Self::is_junk(&inner_path, &filename) {
            return None;
        }
        let size = entry.size();
        if size > self.max_member_size {
            warn!(
                archive = %self.source_path,
                member = %inner_path,
                size,
                cap = self.max_member_size,
                "Member over size cap, skipping"
            );
            return None;
        }

        // Flat scratch name: index prefix keeps same-named members apart
        let local_path = self.scratch_dir.join(format!("{index:05}_{filename}"));
        let result = File::create(&local_path).and_then(|mut out| io::copy(&mut entry, &mut out));
        match result {
            Ok(_) => Some(ExtractedEntry {
                inner_path,
                filename,
                local_path,
                size,
            }),
            Err(e) => {
                warn!(archive = %self.source_path, member = %inner_path, error = %e, "Member extraction failed");
                let _ = std::fs::remove_file(&local_path);
                None
            }
        }
    }
}

impl Iterator for ArchiveExtractor {
    type Item = ExtractedEntry;

    fn next(&mut self) -> Option<Self::Item> {
        while self.next_index < self.archive.len() {
            let index = self.next_index;
            self.next_index += 1;
            if let Some(entry) = self.extract_one(index) {
                return Some(entry);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn build_zip(dir: &Path, entries: &[(&str, &[u8])]) -> PathBuf {
        let path = dir.join("fixture.zip");
        let mut writer = zip::ZipWriter::new(File::create(&path).unwrap());
        let options = SimpleFileOptions::default();
        for (name, data) in entries {
            if name.ends_with('/') {
                writer.add_directory(name.trim_end_matches('/'), options).unwrap();
            } else {
                writer.start_file(*name, options).unwrap();
                writer.write_all(data).unwrap();
            }
        }
        writer.finish().unwrap();
        path
    }

    #[test]
    fn yields_only_qualifying_members() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = build_zip(
            dir.path(),
            &[
                ("folder/", b""),
                (".hidden", b"dotfile"),
                ("__MACOSX/junk.png", b"resource fork"),
                ("big.bin", b"0123456789abcdef"),
                ("sub/dir/file.png", b"png-bytes"),
            ],
        );
        let scratch = dir.path().join("scratch");
        std::fs::create_dir_all(&scratch).unwrap();

        // 10-byte cap excludes big.bin (16 bytes)
        let extractor = ArchiveExtractor::open(&zip_path, "/fixture.zip", &scratch, 10).unwrap();
        let entries: Vec<_> = extractor.collect();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].inner_path, "sub/dir/file.png");
        assert_eq!(entries[0].filename, "file.png");
        assert_eq!(entries[0].size, 9);
        assert_eq!(std::fs::read(&entries[0].local_path).unwrap(), b"png-bytes");

        // only the yielded member reached scratch storage
        let on_disk: Vec<_> = std::fs::read_dir(&scratch).unwrap().collect();
        assert_eq!(on_disk.len(), 1);
    }

    #[test]
    fn nested_paths_survive_extraction() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = build_zip(
            dir.path(),
            &[("a/b/c.txt", b"deep"), ("top.pdf", b"doc")],
        );
        let scratch = dir.path().join("scratch");
        std::fs::create_dir_all(&scratch).unwrap();

        let extractor =
            ArchiveExtractor::open(&zip_path, "/n.zip", &scratch, u64::MAX).unwrap();
        let mut paths: Vec<_> = extractor.map(|e| e.inner_path).collect();
        paths.sort();
        assert_eq!(paths, vec!["a/b/c.txt", "top.pdf"]);
    }

    #[test]
    fn corrupt_member_truncates_the_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = build_zip(
            dir.path(),
            &[("a.png", b"first"), ("b.png", b"second")],
        );
        // smash the first local-header signature; the central directory
        // at the end of the file stays readable, so open succeeds
        let mut bytes = std::fs::read(&zip_path).unwrap();
        bytes[0..4].copy_from_slice(b"XXXX");
        std::fs::write(&zip_path, &bytes).unwrap();

        let scratch = dir.path().join("scratch");
        std::fs::create_dir_all(&scratch).unwrap();
        let extractor =
            ArchiveExtractor::open(&zip_path, "/c.zip", &scratch, u64::MAX).unwrap();
        // truncates at the corrupt entry instead of erroring or looping
        assert_eq!(extractor.count(), 0);
    }

    #[test]
    fn garbage_file_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not-a.zip");
        std::fs::write(&path, b"this is not a zip archive").unwrap();
        assert!(ArchiveExtractor::open(&path, "/not-a.zip", dir.path(), u64::MAX).is_err());
    }
}
