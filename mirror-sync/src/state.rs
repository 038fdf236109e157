//! # State Store
//!
//! Typed access to the persisted JSON documents: the sync cursor, the two
//! indexes, and per-id metadata sidecars, all stored as objects in the
//! same bucket as the mirrored content.
//!
//! No transactionality is provided or assumed. The engine sequences its
//! writes (indexes before cursor) so that a crash between any two leaves
//! the system recoverable; every document write here is a plain
//! last-write-wins overwrite.

use crate::error::{Result, SyncError};
use crate::keys::{META_PREFIX, PATH_INDEX_KEY, REV_INDEX_KEY, SYNC_STATE_KEY};
use crate::model::{MetadataRecord, PathIndex, RevIndex, SyncState};
use bytes::Bytes;
use mirror_traits::error::CapabilityError;
use mirror_traits::store::ObjectStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

const JSON_CONTENT_TYPE: &str = "application/json";

/// Durable state documents over an [`ObjectStore`].
pub struct StateStore {
    store: Arc<dyn ObjectStore>,
}

impl StateStore {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    fn state_err(key: &str, reason: impl ToString) -> SyncError {
        SyncError::State {
            key: key.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Load a JSON document, defaulting when the key is absent.
    async fn load_doc<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T> {
        match self.store.get(key).await {
            Ok(data) => serde_json::from_slice(&data).map_err(|e| Self::state_err(key, e)),
            Err(CapabilityError::NotFound(_)) => Ok(T::default()),
            Err(e) => Err(Self::state_err(key, e)),
        }
    }

    async fn save_doc<T: Serialize>(&self, key: &str, doc: &T) -> Result<()> {
        let data = serde_json::to_vec(doc).map_err(|e| Self::state_err(key, e))?;
        self.store
            .put_bytes(key, Bytes::from(data), JSON_CONTENT_TYPE)
            .await
            .map_err(|e| Self::state_err(key, e))?;
        Ok(())
    }

    pub async fn load_sync_state(&self) -> Result<SyncState> {
        self.load_doc(SYNC_STATE_KEY).await
    }

    pub async fn save_sync_state(&self, state: &SyncState) -> Result<()> {
        self.save_doc(SYNC_STATE_KEY, state).await
    }

    pub async fn load_path_index(&self) -> Result<PathIndex> {
        self.load_doc(PATH_INDEX_KEY).await
    }

    pub async fn load_rev_index(&self) -> Result<RevIndex> {
        self.load_doc(REV_INDEX_KEY).await
    }

    /// Persist both indexes, path index first. Called at every checkpoint
    /// and at commit.
    pub async fn save_indexes(&self, paths: &PathIndex, revs: &RevIndex) -> Result<()> {
        self.save_doc(PATH_INDEX_KEY, paths).await?;
        self.save_doc(REV_INDEX_KEY, revs).await
    }

    /// Load one metadata sidecar; `None` when the id has no record.
    pub async fn load_metadata(&self, id: &str) -> Result<Option<MetadataRecord>> {
        let key = crate::keys::metadata_key(id);
        match self.store.get(&key).await {
            Ok(data) => serde_json::from_slice(&data)
                .map(Some)
                .map_err(|e| Self::state_err(&key, e)),
            Err(CapabilityError::NotFound(_)) => Ok(None),
            Err(e) => Err(Self::state_err(&key, e)),
        }
    }

    pub async fn save_metadata(&self, record: &MetadataRecord) -> Result<()> {
        self.save_doc(&crate::keys::metadata_key(&record.id), record).await
    }

    pub async fn delete_metadata(&self, id: &str) -> Result<()> {
        let key = crate::keys::metadata_key(id);
        self.store
            .delete(&key)
            .await
            .map_err(|e| Self::state_err(&key, e))
    }

    /// Reconstitute the revision index by scanning every metadata sidecar.
    /// Self-healing bootstrap for a lost or never-written index; the
    /// rebuilt document is persisted when it found anything.
    pub async fn rebuild_rev_index(&self) -> Result<RevIndex> {
        info!("Rebuilding revision index from metadata sidecars");
        let keys = self
            .store
            .list(META_PREFIX)
            .await
            .map_err(|e| Self::state_err(META_PREFIX, e))?;

        let mut revs = RevIndex::new();
        for key in keys.iter().filter(|k| k.ends_with(".json")) {
            let data = match self.store.get(key).await {
                Ok(data) => data,
                Err(CapabilityError::NotFound(_)) => continue,
                Err(e) => return Err(Self::state_err(key, e)),
            };
            // A sidecar that no longer parses is skipped, not fatal
            if let Ok(record) = serde_json::from_slice::<MetadataRecord>(&data) {
                revs.insert(record.id, record.revision);
            }
        }

        if !revs.is_empty() {
            self.save_doc(REV_INDEX_KEY, &revs).await?;
            info!(entries = revs.len(), "Rebuilt revision index");
        }
        Ok(revs)
    }
}
