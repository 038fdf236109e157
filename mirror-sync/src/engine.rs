//! # Sync Engine
//!
//! Orchestrates one reconciliation run: load state, obtain a change batch
//! (baseline crawl or incremental from the saved cursor), drain the batch
//! entry by entry, checkpoint the indexes periodically, and commit the new
//! cursor at the end.
//!
//! Consistency rules the engine enforces (the state store provides none):
//! - indexes are always written before the cursor that would cause their
//!   entries to be skipped on the next read;
//! - every mutation is idempotent, so replaying a batch after a crash
//!   converges to the same state;
//! - per-entry failures resolve to [`EntryOutcome::Skipped`] and never
//!   abort the run. Only listing failures and state-document write
//!   failures are fatal.

use crate::archive::ArchiveExtractor;
use crate::category::{self, Category};
use crate::error::Result;
use crate::keys;
use crate::model::{MetadataRecord, PathIndex, RevIndex, SyncState};
use crate::report::{EntryOutcome, SkipReason, SyncMode, SyncReport, SyncStats};
use crate::scratch::ScratchFile;
use crate::state::StateStore;
use chrono::Utc;
use mirror_traits::source::{ChangeEntry, ChangeSource, FileChange};
use mirror_traits::store::ObjectStore;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

const MIB: u64 = 1024 * 1024;
const GIB: u64 = 1024 * MIB;

/// Engine tuning knobs.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Remote root for the baseline crawl. Empty string means the whole
    /// account.
    pub root_path: String,
    /// Local directory for downloaded archives and extracted members.
    pub scratch_dir: PathBuf,
    /// Ceiling for a single regular file.
    pub max_file_size: u64,
    /// Ceiling for a whole archive.
    pub max_archive_size: u64,
    /// Ceiling for one member inside an archive.
    pub max_member_size: u64,
    /// Flush indexes every this many processed entries. Values below 1
    /// are treated as 1.
    pub checkpoint_interval: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            root_path: String::new(),
            scratch_dir: std::env::temp_dir().join("mirror-sync"),
            max_file_size: 150 * MIB,
            max_archive_size: 10 * GIB,
            max_member_size: GIB,
            checkpoint_interval: 100,
        }
    }
}

/// The incremental mirror-sync engine.
///
/// Single logical thread of control: entries are processed strictly in
/// delivery order, and no two runs may share a state store concurrently
/// (exactly-once scheduling is the caller's responsibility).
pub struct SyncEngine {
    config: SyncConfig,
    source: Arc<dyn ChangeSource>,
    store: Arc<dyn ObjectStore>,
    state: StateStore,
}

impl SyncEngine {
    pub fn new(
        config: SyncConfig,
        source: Arc<dyn ChangeSource>,
        store: Arc<dyn ObjectStore>,
    ) -> Self {
        let state = StateStore::new(Arc::clone(&store));
        Self {
            config,
            source,
            store,
            state,
        }
    }

    /// Run one full sync pass and return its report.
    #[instrument(skip_all, name = "sync_run")]
    pub async fn run(&self) -> Result<SyncReport> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();

        // Bootstrapping: load state, self-heal the revision index
        let sync_state = self.state.load_sync_state().await?;
        let mut path_index = self.state.load_path_index().await?;
        let mut rev_index = self.state.load_rev_index().await?;
        if rev_index.is_empty() {
            rev_index = self.state.rebuild_rev_index().await?;
        }
        tokio::fs::create_dir_all(&self.config.scratch_dir).await?;

        let (mode, entries, new_cursor) = match &sync_state.cursor {
            Some(cursor) => {
                let (entries, cursor) = self.source.list_changes(cursor).await?;
                (SyncMode::Incremental, entries, cursor)
            }
            None => {
                let (entries, cursor) =
                    self.source.list_baseline(&self.config.root_path).await?;
                (SyncMode::Baseline, entries, cursor)
            }
        };
        info!(%run_id, ?mode, entries = entries.len(), "Starting sync run");

        // Draining
        let mut stats = SyncStats::default();
        let mut processed: u64 = 0;
        let checkpoint_interval = self.config.checkpoint_interval.max(1);
        for entry in &entries {
            let outcome = self
                .process_entry(entry, &mut path_index, &mut rev_index, &mut stats)
                .await;
            stats.record(outcome);

            // Folders and no-ops do not advance the checkpoint counter
            if matches!(outcome, EntryOutcome::Synced | EntryOutcome::Deleted { .. }) {
                processed += 1;
                if processed % checkpoint_interval == 0 {
                    self.state.save_indexes(&path_index, &rev_index).await?;
                    info!(processed, "Checkpoint saved");
                }
            }
        }

        // Committed: indexes first, then the cursor that supersedes them.
        // Unconditional so the cursor advances even on an empty batch.
        self.state.save_indexes(&path_index, &rev_index).await?;
        self.state
            .save_sync_state(&SyncState {
                cursor: Some(new_cursor.clone()),
            })
            .await?;

        let report = SyncReport {
            run_id,
            mode,
            started_at,
            finished_at: Utc::now(),
            cursor: new_cursor,
            stats,
        };
        info!(
            %run_id,
            synced = stats.synced,
            deleted = stats.deleted,
            skipped = stats.skipped,
            unchanged = stats.unchanged,
            members_extracted = stats.members_extracted,
            "Sync complete"
        );
        Ok(report)
    }

    async fn process_entry(
        &self,
        entry: &ChangeEntry,
        path_index: &mut PathIndex,
        rev_index: &mut RevIndex,
        stats: &mut SyncStats,
    ) -> EntryOutcome {
        match entry {
            ChangeEntry::Folder { .. } => EntryOutcome::Ignored,
            ChangeEntry::Deleted { path } => {
                if category::is_archive(path) {
                    self.delete_archive(path, path_index, rev_index).await
                } else {
                    self.delete_file(path, path_index, rev_index).await
                }
            }
            ChangeEntry::File(file) => {
                if category::is_archive(&file.name) {
                    self.sync_archive(file, path_index, rev_index, stats).await
                } else {
                    self.sync_file(file, path_index, rev_index).await
                }
            }
        }
    }

    // ── Deletions ─────────────────────────────────────────────────────

    /// Remove one id's blob and sidecar. The blob key is reconstructed
    /// from the sidecar's category and display name; a missing sidecar
    /// means only index entries are left to clean.
    async fn delete_mirrored(&self, id: &str) {
        match self.state.load_metadata(id).await {
            Ok(Some(meta)) => {
                let ext = category::key_extension(&meta.display_name);
                if let Some(key) = keys::object_key(meta.category, id, &ext) {
                    if let Err(e) = self.store.delete(&key).await {
                        warn!(id, key, error = %e, "Blob delete failed");
                    }
                }
            }
            Ok(None) => {}
            Err(e) => warn!(id, error = %e, "Metadata read failed during delete"),
        }
        if let Err(e) = self.state.delete_metadata(id).await {
            warn!(id, error = %e, "Metadata delete failed");
        }
    }

    /// Cascade deletion of an archive: every virtual path under
    /// `<path>!/` goes, then the archive's own id and sidecar.
    async fn delete_archive(
        &self,
        path: &str,
        path_index: &mut PathIndex,
        rev_index: &mut RevIndex,
    ) -> EntryOutcome {
        let prefix = keys::virtual_prefix(path);
        let members: Vec<(String, String)> = path_index
            .range(prefix.clone()..)
            .take_while(|(p, _)| p.starts_with(&prefix))
            .map(|(p, id)| (p.clone(), id.clone()))
            .collect();

        let archive_id = path_index.get(path).cloned();
        if archive_id.is_none() && members.is_empty() {
            debug!(path, "Delete for unindexed archive");
            return EntryOutcome::Skipped(SkipReason::StaleDelete);
        }

        for (member_path, member_id) in &members {
            self.delete_mirrored(member_id).await;
            path_index.remove(member_path);
            rev_index.remove(member_id);
            debug!(path = %member_path, "Deleted archive member");
        }
        if let Some(id) = archive_id {
            self.delete_mirrored(&id).await;
            path_index.remove(path);
            rev_index.remove(&id);
        }
        info!(path, members = members.len(), "Deleted archive");
        EntryOutcome::Deleted {
            cascade: members.len() as u64,
        }
    }

    async fn delete_file(
        &self,
        path: &str,
        path_index: &mut PathIndex,
        rev_index: &mut RevIndex,
    ) -> EntryOutcome {
        let Some(id) = path_index.get(path).cloned() else {
            debug!(path, "Delete for unindexed path");
            return EntryOutcome::Skipped(SkipReason::StaleDelete);
        };
        self.delete_mirrored(&id).await;
        path_index.remove(path);
        rev_index.remove(&id);
        info!(path, id, "Deleted");
        EntryOutcome::Deleted { cascade: 0 }
    }

    // ── Regular files ─────────────────────────────────────────────────

    async fn sync_file(
        &self,
        file: &FileChange,
        path_index: &mut PathIndex,
        rev_index: &mut RevIndex,
    ) -> EntryOutcome {
        let Some(cat) = category::classify(&file.name) else {
            debug!(path = %file.path, "Unsupported extension");
            return EntryOutcome::Skipped(SkipReason::Unsupported);
        };
        if file.size > self.config.max_file_size {
            warn!(path = %file.path, size = file.size, "File over size cap");
            return EntryOutcome::Skipped(SkipReason::Oversized);
        }
        if rev_index.get(&file.id).map(String::as_str) == Some(file.revision.as_str()) {
            return EntryOutcome::Unchanged;
        }

        let ext = category::key_extension(&file.name);
        let Some(key) = keys::object_key(cat, &file.id, &ext) else {
            return EntryOutcome::Skipped(SkipReason::Unsupported);
        };
        let data = match self.source.download(&file.path).await {
            Ok(data) => data,
            Err(e) => {
                warn!(path = %file.path, error = %e, "Download failed");
                return EntryOutcome::Skipped(SkipReason::TransferFailed);
            }
        };
        let mime = category::mime_type(&file.name);
        let uri = match self.store.put_bytes(&key, data, mime).await {
            Ok(uri) => uri,
            Err(e) => {
                warn!(path = %file.path, error = %e, "Upload failed");
                return EntryOutcome::Skipped(SkipReason::TransferFailed);
            }
        };

        let record = MetadataRecord {
            id: file.id.clone(),
            source_path: file.path.clone(),
            revision: file.revision.clone(),
            mime_type: mime.to_string(),
            size: file.size,
            modified_at: file.modified_at,
            category: cat,
            storage_uri: uri,
            display_name: file.name.clone(),
            source_archive: None,
            extracted_count: None,
        };
        if let Err(e) = self.state.save_metadata(&record).await {
            warn!(path = %file.path, error = %e, "Metadata write failed");
            return EntryOutcome::Skipped(SkipReason::TransferFailed);
        }

        path_index.insert(file.path.clone(), file.id.clone());
        rev_index.insert(file.id.clone(), file.revision.clone());
        info!(path = %file.path, key, "Synced");
        EntryOutcome::Synced
    }

    // ── Archives ──────────────────────────────────────────────────────

    /// Download an archive to scratch, stream-extract its members, mirror
    /// each supported one under a synthetic id, then record the archive
    /// itself with a thin sidecar for deletion tracking.
    async fn sync_archive(
        &self,
        file: &FileChange,
        path_index: &mut PathIndex,
        rev_index: &mut RevIndex,
        stats: &mut SyncStats,
    ) -> EntryOutcome {
        if rev_index.get(&file.id).map(String::as_str) == Some(file.revision.as_str()) {
            return EntryOutcome::Unchanged;
        }
        if file.size > self.config.max_archive_size {
            warn!(path = %file.path, size = file.size, "Archive over size cap");
            return EntryOutcome::Skipped(SkipReason::Oversized);
        }
        info!(path = %file.path, size = file.size, "Archive detected");

        // Guard removes the downloaded archive on every exit path
        let archive_scratch =
            ScratchFile::new(self.config.scratch_dir.join(format!("{}.zip", file.id)));
        if let Err(e) = self
            .source
            .download_to_file(&file.path, archive_scratch.path())
            .await
        {
            warn!(path = %file.path, error = %e, "Archive download failed");
            return EntryOutcome::Skipped(SkipReason::TransferFailed);
        }

        let mut extracted: u64 = 0;
        match ArchiveExtractor::open(
            archive_scratch.path(),
            &file.path,
            &self.config.scratch_dir,
            self.config.max_member_size,
        ) {
            Ok(extractor) => {
                for member in extractor {
                    let member_scratch = ScratchFile::new(&member.local_path);
                    if self
                        .mirror_member(file, &member, member_scratch.path(), path_index, rev_index)
                        .await
                    {
                        extracted += 1;
                        stats.members_extracted += 1;
                    } else {
                        stats.skipped += 1;
                    }
                }
            }
            // Corrupt archive is recoverable: keep what was mirrored
            // (nothing here) and still record the archive below
            Err(e) => warn!(path = %file.path, error = %e, "Unreadable archive"),
        }
        info!(path = %file.path, extracted, "Archive done");

        let record = MetadataRecord {
            id: file.id.clone(),
            source_path: file.path.clone(),
            revision: file.revision.clone(),
            mime_type: category::mime_type(&file.name).to_string(),
            size: file.size,
            modified_at: file.modified_at,
            category: Category::Archive,
            storage_uri: String::new(),
            display_name: file.name.clone(),
            source_archive: None,
            extracted_count: Some(extracted),
        };
        if let Err(e) = self.state.save_metadata(&record).await {
            warn!(path = %file.path, error = %e, "Archive metadata write failed");
            return EntryOutcome::Skipped(SkipReason::TransferFailed);
        }
        path_index.insert(file.path.clone(), file.id.clone());
        rev_index.insert(file.id.clone(), file.revision.clone());
        EntryOutcome::Synced
    }

    /// Mirror one extracted member. Returns whether it was uploaded and
    /// indexed; unsupported or failed members are dropped (their scratch
    /// file is cleaned by the caller's guard either way).
    async fn mirror_member(
        &self,
        archive: &FileChange,
        member: &crate::archive::ExtractedEntry,
        local: &std::path::Path,
        path_index: &mut PathIndex,
        rev_index: &mut RevIndex,
    ) -> bool {
        let Some(cat) = category::classify(&member.filename) else {
            debug!(archive = %archive.path, member = %member.inner_path, "Unsupported member");
            return false;
        };
        let member_id = keys::member_id(&archive.id, &member.inner_path);
        let ext = category::key_extension(&member.filename);
        let Some(key) = keys::object_key(cat, &member_id, &ext) else {
            return false;
        };

        let mime = category::mime_type(&member.filename);
        let uri = match self.store.put_file(&key, local, mime).await {
            Ok(uri) => uri,
            Err(e) => {
                warn!(member = %member.inner_path, error = %e, "Member upload failed");
                return false;
            }
        };
        debug!(member = %member.inner_path, key, "Uploaded archive member");

        let virtual_path = keys::virtual_path(&archive.path, &member.inner_path);
        let record = MetadataRecord {
            id: member_id.clone(),
            source_path: virtual_path.clone(),
            revision: archive.revision.clone(),
            mime_type: mime.to_string(),
            size: member.size,
            modified_at: archive.modified_at,
            category: cat,
            storage_uri: uri,
            display_name: member.filename.clone(),
            source_archive: Some(archive.path.clone()),
            extracted_count: None,
        };
        if let Err(e) = self.state.save_metadata(&record).await {
            warn!(member = %member.inner_path, error = %e, "Member metadata write failed");
            return false;
        }

        path_index.insert(virtual_path, member_id.clone());
        rev_index.insert(member_id, archive.revision.clone());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyncError;
    use async_trait::async_trait;
    use bytes::Bytes;
    use mirror_traits::error::{CapabilityError, Result as CapResult};
    use mockall::mock;
    use std::path::Path;

    mock! {
        Source {}

        #[async_trait]
        impl ChangeSource for Source {
            async fn list_baseline(&self, root: &str) -> CapResult<(Vec<ChangeEntry>, String)>;
            async fn list_changes(&self, cursor: &str) -> CapResult<(Vec<ChangeEntry>, String)>;
            async fn download(&self, path: &str) -> CapResult<Bytes>;
            async fn download_to_file(&self, path: &str, dest: &Path) -> CapResult<u64>;
        }
    }

    mock! {
        Store {}

        #[async_trait]
        impl ObjectStore for Store {
            async fn put_bytes(&self, key: &str, data: Bytes, content_type: &str) -> CapResult<String>;
            async fn put_file(&self, key: &str, local: &Path, content_type: &str) -> CapResult<String>;
            async fn get(&self, key: &str) -> CapResult<Bytes>;
            async fn size(&self, key: &str) -> CapResult<u64>;
            async fn delete(&self, key: &str) -> CapResult<()>;
            async fn list(&self, prefix: &str) -> CapResult<Vec<String>>;
            async fn exists(&self, key: &str) -> CapResult<bool>;
        }
    }

    /// A store with no persisted state: every read misses.
    fn empty_store() -> MockStore {
        let mut store = MockStore::new();
        store
            .expect_get()
            .returning(|key| Err(CapabilityError::NotFound(key.to_string())));
        store.expect_list().returning(|_| Ok(Vec::new()));
        store
    }

    fn scratch_config(dir: &tempfile::TempDir) -> SyncConfig {
        SyncConfig {
            scratch_dir: dir.path().join("scratch"),
            ..SyncConfig::default()
        }
    }

    #[tokio::test]
    async fn listing_failure_aborts_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = MockSource::new();
        source
            .expect_list_baseline()
            .returning(|_| Err(CapabilityError::NotAvailable("listing".into())));

        let engine = SyncEngine::new(scratch_config(&dir), Arc::new(source), Arc::new(empty_store()));
        let err = engine.run().await.unwrap_err();
        assert!(matches!(err, SyncError::Source(_)));
    }

    #[tokio::test]
    async fn state_write_failure_aborts_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = MockSource::new();
        source
            .expect_list_baseline()
            .returning(|_| Ok((Vec::new(), "c1".to_string())));

        // even the empty-batch commit must persist the indexes
        let mut store = empty_store();
        store
            .expect_put_bytes()
            .returning(|_, _, _| Err(CapabilityError::OperationFailed("bucket down".into())));

        let engine = SyncEngine::new(scratch_config(&dir), Arc::new(source), Arc::new(store));
        let err = engine.run().await.unwrap_err();
        assert!(matches!(err, SyncError::State { .. }));
    }
}
