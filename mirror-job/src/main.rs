//! Mirror-sync job entry point.
//!
//! Runs one sync pass of a local source tree into a directory-backed
//! object store. Production deployments swap the two `mirror-local`
//! implementations for real cloud clients behind the same traits; the
//! engine and its state handling are identical either way.

mod config;
mod logging;

use anyhow::{Context, Result};
use config::JobConfig;
use mirror_local::{FsChangeSource, FsObjectStore};
use mirror_sync::SyncEngine;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

async fn run(config: JobConfig) -> Result<()> {
    let source = Arc::new(FsChangeSource::new(&config.source_root));
    let store = Arc::new(FsObjectStore::new(&config.store_dir));
    let engine = SyncEngine::new(config.sync, source, store);

    let report = engine.run().await.context("sync run failed")?;
    info!(
        run_id = %report.run_id,
        mode = ?report.mode,
        synced = report.stats.synced,
        deleted = report.stats.deleted,
        skipped = report.stats.skipped,
        unchanged = report.stats.unchanged,
        members_extracted = report.stats.members_extracted,
        "Run finished"
    );
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = match JobConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {e:#}");
            return ExitCode::FAILURE;
        }
    };
    logging::init_logging(config.log_format);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Run-level failures surface here; the scheduler retries the
            // whole run, which is safe by idempotence.
            error!(error = %format!("{e:#}"), "Run failed");
            ExitCode::FAILURE
        }
    }
}
