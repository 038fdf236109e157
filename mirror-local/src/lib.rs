//! # Local Capability Implementations
//!
//! Filesystem-backed implementations of the mirror capability traits,
//! used by integration tests and the local development job:
//!
//! - [`FsObjectStore`] — an object store over a local directory
//! - [`FsChangeSource`] — a change source that treats a directory tree as
//!   the remote account (rescan-based, no deletion feed)
//!
//! Production deployments substitute real cloud clients behind the same
//! traits; nothing in `mirror-sync` depends on this crate.

pub mod fs_source;
pub mod fs_store;

pub use fs_source::FsChangeSource;
pub use fs_store::FsObjectStore;
