//! Run-level error types.
//!
//! Per-entry failures never appear here; they become
//! [`EntryOutcome::Skipped`](crate::report::EntryOutcome) at the entry
//! boundary. `SyncError` covers only conditions that make continuing the
//! run unsafe or pointless: a failed initial listing, a state document
//! that cannot be read or written, bad configuration.

use mirror_traits::error::CapabilityError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    /// Remote listing failed; no batch to process.
    #[error("change source error: {0}")]
    Source(#[from] CapabilityError),

    /// A state document could not be loaded or persisted. Fatal: the
    /// engine cannot guarantee consistency without durable checkpoints.
    #[error("state store error for {key}: {reason}")]
    State { key: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, SyncError>;
