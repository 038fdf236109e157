//! # Mirror Capability Traits
//!
//! Platform-agnostic abstractions consumed by the mirror-sync engine.
//!
//! ## Overview
//!
//! The engine never talks to a concrete storage API. It is wired with two
//! capabilities at construction time:
//!
//! - [`ChangeSource`] — the remote file-storage side: cursor-based change
//!   listing (baseline crawl or incremental feed) plus full and streaming
//!   downloads.
//! - [`ObjectStore`] — the mirror bucket: blob put/get/delete/list plus
//!   existence checks, used for mirrored objects, metadata sidecars, and
//!   the engine's persisted state documents.
//!
//! Both traits are object-safe and `Send + Sync` so implementations can be
//! shared behind `Arc<dyn _>`.

pub mod error;
pub mod source;
pub mod store;

pub use error::{CapabilityError, Result};
pub use source::{ChangeEntry, ChangeSource, FileChange};
pub use store::ObjectStore;
