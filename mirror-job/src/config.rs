//! Environment-driven job configuration.
//!
//! Required:
//! - `MIRROR_SOURCE_ROOT` — directory treated as the remote account
//! - `MIRROR_STORE_DIR` — directory backing the object store
//!
//! Optional:
//! - `MIRROR_SCRATCH_DIR` — scratch space for archive extraction
//!   (default: a `mirror-sync` directory under the system temp dir)
//! - `MIRROR_CHECKPOINT_INTERVAL` — index flush interval (default 100)
//! - `MIRROR_LOG_FORMAT` — `pretty`, `compact`, or `json`

use crate::logging::LogFormat;
use anyhow::{bail, Context, Result};
use mirror_sync::SyncConfig;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct JobConfig {
    pub source_root: PathBuf,
    pub store_dir: PathBuf,
    pub log_format: LogFormat,
    pub sync: SyncConfig,
}

fn required(name: &str) -> Result<String> {
    std::env::var(name).with_context(|| format!("{name} must be set"))
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

impl JobConfig {
    /// Load and validate configuration from the environment.
    pub fn from_env() -> Result<Self> {
        let source_root = PathBuf::from(required("MIRROR_SOURCE_ROOT")?);
        if !source_root.is_dir() {
            bail!(
                "MIRROR_SOURCE_ROOT is not a directory: {}",
                source_root.display()
            );
        }
        let store_dir = PathBuf::from(required("MIRROR_STORE_DIR")?);

        let mut sync = SyncConfig::default();
        if let Some(dir) = optional("MIRROR_SCRATCH_DIR") {
            sync.scratch_dir = PathBuf::from(dir);
        }
        if let Some(raw) = optional("MIRROR_CHECKPOINT_INTERVAL") {
            let interval: u64 = raw
                .parse()
                .with_context(|| format!("MIRROR_CHECKPOINT_INTERVAL is not a number: {raw:?}"))?;
            if interval == 0 {
                bail!("MIRROR_CHECKPOINT_INTERVAL must be at least 1");
            }
            sync.checkpoint_interval = interval;
        }

        let log_format = match optional("MIRROR_LOG_FORMAT").as_deref() {
            None => LogFormat::default(),
            Some(raw) => raw
                .parse()
                .map_err(|e: String| anyhow::anyhow!("MIRROR_LOG_FORMAT: {e}"))?,
        };

        Ok(Self {
            source_root,
            store_dir,
            log_format,
            sync,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Env-var tests mutate process state; keep them in one test so they
    // cannot race each other.
    #[test]
    fn from_env_reads_required_and_optional_values() {
        let dir = tempfile::tempdir().unwrap();
        std::env::set_var("MIRROR_SOURCE_ROOT", dir.path());
        std::env::set_var("MIRROR_STORE_DIR", dir.path().join("bucket"));
        std::env::set_var("MIRROR_CHECKPOINT_INTERVAL", "25");
        std::env::set_var("MIRROR_LOG_FORMAT", "json");

        let config = JobConfig::from_env().unwrap();
        assert_eq!(config.source_root, dir.path());
        assert_eq!(config.sync.checkpoint_interval, 25);
        assert_eq!(config.log_format, LogFormat::Json);

        std::env::set_var("MIRROR_CHECKPOINT_INTERVAL", "0");
        assert!(JobConfig::from_env().is_err());

        std::env::remove_var("MIRROR_SOURCE_ROOT");
        let err = JobConfig::from_env().unwrap_err();
        assert!(err.to_string().contains("MIRROR_SOURCE_ROOT"));

        std::env::remove_var("MIRROR_STORE_DIR");
        std::env::remove_var("MIRROR_CHECKPOINT_INTERVAL");
        std::env::remove_var("MIRROR_LOG_FORMAT");
    }
}
