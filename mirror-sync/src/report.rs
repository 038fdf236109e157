//! Run outcomes and the end-of-run report.
//!
//! Per-entry results are explicit values rather than control flow: every
//! entry the engine touches resolves to an [`EntryOutcome`], and the
//! run-level counters are folded from those outcomes, so a given input
//! batch always produces the same numbers.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Why an entry was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Extension outside the supported category tables.
    Unsupported,
    /// Over the single-file or whole-archive size ceiling.
    Oversized,
    /// Download or upload failed; the entry will be retried when the
    /// source lists it again.
    TransferFailed,
    /// Deletion of a path the index has no id for.
    StaleDelete,
}

/// Result of processing one change entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOutcome {
    /// Content mirrored and indexes updated.
    Synced,
    /// Entry removed; `cascade` counts archive members removed with it.
    Deleted { cascade: u64 },
    /// Revision already indexed; nothing touched.
    Unchanged,
    Skipped(SkipReason),
    /// Folder entries, which the engine does not track.
    Ignored,
}

/// Which listing the run performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    Baseline,
    Incremental,
}

/// Counter set accumulated over a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncStats {
    pub synced: u64,
    pub deleted: u64,
    pub skipped: u64,
    pub unchanged: u64,
    pub members_extracted: u64,
}

impl SyncStats {
    pub fn record(&mut self, outcome: EntryOutcome) {
        match outcome {
            EntryOutcome::Synced => self.synced += 1,
            EntryOutcome::Deleted { cascade } => {
                self.deleted += 1 + cascade;
            }
            EntryOutcome::Unchanged => self.unchanged += 1,
            EntryOutcome::Skipped(_) => self.skipped += 1,
            EntryOutcome::Ignored => {}
        }
    }
}

/// Diagnostic summary of one engine run.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub run_id: Uuid,
    pub mode: SyncMode,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Cursor committed at run end.
    pub cursor: String,
    pub stats: SyncStats,
}
