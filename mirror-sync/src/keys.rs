//! # Storage Key Scheme
//!
//! Deterministic key derivation for mirrored blobs, metadata sidecars,
//! and the persisted state documents. Deterministic keys make idempotent
//! reprocessing an overwrite instead of a duplicate.
//!
//! Layout under the bucket:
//!
//! ```text
//! mirror/<category>/<id>[.ext]        blob content (ext for docs only)
//! mirror/meta/<id>.json               metadata sidecar
//! mirror/state/*.json                 engine state documents
//! ```

use crate::category::Category;

/// Prefix for all metadata sidecars.
pub const META_PREFIX: &str = "mirror/meta/";

/// Sync cursor document.
pub const SYNC_STATE_KEY: &str = "mirror/state/sync_state.json";
/// Path → id index document.
pub const PATH_INDEX_KEY: &str = "mirror/state/path_index.json";
/// Id → revision index document.
pub const REV_INDEX_KEY: &str = "mirror/state/rev_index.json";
/// Embedding-job checkpoint. Written and read by the external embedding
/// consumer only; listed here so the state namespace is in one place.
pub const EMBEDDING_STATE_KEY: &str = "mirror/state/embedding_state.json";

/// Separator between an archive path and a member's inner path.
pub const VIRTUAL_PATH_SEP: &str = "!/";

/// Blob key for a mirrored object.
///
/// `None` for [`Category::Archive`]: archives have no mirrored blob of
/// their own, only a metadata sidecar. The extension is attached only for
/// docs, where downstream text extraction needs it.
pub fn object_key(category: Category, id: &str, extension: &str) -> Option<String> {
    match category {
        Category::Archive => None,
        Category::Docs => Some(format!("mirror/docs/{id}{extension}")),
        Category::Images | Category::Media => {
            Some(format!("mirror/{}/{id}", category.as_str()))
        }
    }
}

/// Sidecar key for an id's metadata record.
pub fn metadata_key(id: &str) -> String {
    format!("{META_PREFIX}{id}.json")
}

/// Synthetic id for an archive member: the archive's id joined to the
/// inner path with slashes flattened to underscores. Stable across runs.
pub fn member_id(archive_id: &str, inner_path: &str) -> String {
    format!("{archive_id}___{}", inner_path.replace('/', "_"))
}

/// Virtual source path for an archive member. Deleting the archive
/// cascade-deletes every path under this prefix.
pub fn virtual_path(archive_path: &str, inner_path: &str) -> String {
    format!("{archive_path}{VIRTUAL_PATH_SEP}{inner_path}")
}

/// Prefix that matches all of an archive's member virtual paths.
pub fn virtual_prefix(archive_path: &str) -> String {
    format!("{archive_path}{VIRTUAL_PATH_SEP}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_keys_by_category() {
        assert_eq!(
            object_key(Category::Images, "abc", ".png").as_deref(),
            Some("mirror/images/abc")
        );
        assert_eq!(
            object_key(Category::Media, "abc", ".mp3").as_deref(),
            Some("mirror/media/abc")
        );
        // docs keep the extension
        assert_eq!(
            object_key(Category::Docs, "abc", ".pdf").as_deref(),
            Some("mirror/docs/abc.pdf")
        );
        assert_eq!(object_key(Category::Archive, "abc", ".zip"), None);
    }

    #[test]
    fn metadata_key_is_fixed_per_id() {
        assert_eq!(metadata_key("abc"), "mirror/meta/abc.json");
    }

    #[test]
    fn member_id_is_deterministic() {
        assert_eq!(member_id("Z1", "sub/dir/file.png"), "Z1___sub_dir_file.png");
        assert_eq!(member_id("Z1", "sub/dir/file.png"), "Z1___sub_dir_file.png");
        assert_eq!(member_id("Z1", "flat.txt"), "Z1___flat.txt");
    }

    #[test]
    fn virtual_paths_nest_under_the_archive() {
        let vp = virtual_path("/bundles/a.zip", "x/y.png");
        assert_eq!(vp, "/bundles/a.zip!/x/y.png");
        assert!(vp.starts_with(&virtual_prefix("/bundles/a.zip")));
    }
}
