//! # Incremental Mirror-Sync Engine
//!
//! Reconciles a remote file tree against a persisted local index and
//! mirrors supported content into an object store, with:
//!
//! - idempotent reconciliation over a cursor-based change feed,
//! - constant-memory streaming extraction of nested archives,
//! - crash-safe multi-index state (path index, revision index, metadata
//!   sidecars) with periodic checkpoints,
//! - synthetic identities for archive members, which have no native ids.
//!
//! The remote source and the object store are capabilities defined in
//! `mirror-traits`; this crate holds the engine and everything it owns:
//! classifier, key scheme, archive streamer, state store, run report.

pub mod archive;
pub mod category;
pub mod engine;
pub mod error;
pub mod keys;
pub mod model;
pub mod report;
pub mod scratch;
pub mod state;

pub use category::Category;
pub use engine::{SyncConfig, SyncEngine};
pub use error::{Result, SyncError};
pub use model::{MetadataRecord, PathIndex, RevIndex, SyncState};
pub use report::{EntryOutcome, SkipReason, SyncMode, SyncReport, SyncStats};
pub use state::StateStore;
