//! Runtime configuration
//!
//! Env-driven with bench-friendly defaults; an embedding shell can also
//! build a `Config` directly.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_SUBMIT_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the device store.
    pub data_dir: PathBuf,
    pub enumerator_id: String,
    /// Base URL of the central submission endpoint.
    pub api_base: String,
    pub submit_timeout: Duration,
}

impl Config {
    /// Read `SAHAYAK_DATA_DIR`, `SAHAYAK_ENUMERATOR_ID`, `SAHAYAK_API_BASE`
    /// and `SAHAYAK_SUBMIT_TIMEOUT_SECS`, defaulting anything unset.
    pub fn from_env() -> Self {
        let data_dir = std::env::var("SAHAYAK_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                let home = std::env::var("HOME")
                    .unwrap_or_else(|_| std::env::temp_dir().to_string_lossy().to_string());
                PathBuf::from(home).join(".local/share/sahayak")
            });

        let enumerator_id = std::env::var("SAHAYAK_ENUMERATOR_ID")
            .unwrap_or_else(|_| "enumerator-001".to_string());

        let api_base = std::env::var("SAHAYAK_API_BASE")
            .unwrap_or_else(|_| "http://localhost:1604".to_string());

        let submit_timeout = std::env::var("SAHAYAK_SUBMIT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_SUBMIT_TIMEOUT);

        Self {
            data_dir,
            enumerator_id,
            api_base,
            submit_timeout,
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("surveys.db")
    }
}
