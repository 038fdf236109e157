//! Persisted data model: metadata sidecars, the two indexes, and the
//! sync-cursor document. All serde JSON; the indexes use `BTreeMap` so the
//! serialized documents are byte-deterministic for the same content.

use crate::category::Category;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Normalized source path → id.
pub type PathIndex = BTreeMap<String, String>;

/// Id → last-synced revision token.
pub type RevIndex = BTreeMap<String, String>;

/// One metadata record per mirrored id, stored as a JSON sidecar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub id: String,
    pub source_path: String,
    pub revision: String,
    pub mime_type: String,
    pub size: u64,
    pub modified_at: i64,
    pub category: Category,
    /// Upload URI for the blob; empty for archive records, which have no
    /// blob of their own.
    pub storage_uri: String,
    pub display_name: String,
    /// Source path of the containing archive. Present only on
    /// archive-member records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_archive: Option<String>,
    /// Number of members extracted. Present only on an archive's own
    /// record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_count: Option<u64>,
}

/// The sync-cursor document. An absent cursor means the next run performs
/// a full baseline crawl.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_fields_are_omitted_when_absent() {
        let record = MetadataRecord {
            id: "a1".into(),
            source_path: "/photo.png".into(),
            revision: "r1".into(),
            mime_type: "image/png".into(),
            size: 9,
            modified_at: 1_700_000_000,
            category: Category::Images,
            storage_uri: "file:///tmp/a1".into(),
            display_name: "photo.png".into(),
            source_archive: None,
            extracted_count: None,
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("source_archive"));
        assert!(!json.contains("extracted_count"));
        assert!(json.contains("\"category\":\"images\""));

        let back: MetadataRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn empty_sync_state_has_no_cursor() {
        let state: SyncState = serde_json::from_str("{}").unwrap();
        assert_eq!(state.cursor, None);
        assert_eq!(serde_json::to_string(&SyncState::default()).unwrap(), "{}");
    }

    #[test]
    fn index_serialization_is_ordered() {
        let mut index = PathIndex::new();
        index.insert("/z.txt".into(), "id-z".into());
        index.insert("/a.txt".into(), "id-a".into());
        let json = serde_json::to_string(&index).unwrap();
        assert!(json.find("/a.txt").unwrap() < json.find("/z.txt").unwrap());
    }
}
