//! Session lifecycle configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::session::scheduler::DEFAULT_REVALIDATE_INTERVAL;
use crate::session::storage::FileStorage;

/// Configuration for hosting a session manager.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// File backing the persisted session.
    pub storage_path: PathBuf,
    /// Cadence of the expiry check.
    pub revalidate_interval: Duration,
}

impl SessionConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable                    | Default                          |
    /// |-----------------------------|----------------------------------|
    /// | `AGENTDESK_STATE_DIR`       | `<data_dir>/agentdesk`           |
    /// | `AGENTDESK_REVALIDATE_SECS` | `30`                             |
    pub fn from_env() -> Self {
        let storage_path = match std::env::var("AGENTDESK_STATE_DIR") {
            Ok(dir) if !dir.is_empty() => PathBuf::from(dir).join("session.json"),
            _ => FileStorage::default_path(),
        };
        let revalidate_interval = std::env::var("AGENTDESK_REVALIDATE_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_REVALIDATE_INTERVAL);
        Self {
            storage_path,
            revalidate_interval,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            storage_path: FileStorage::default_path(),
            revalidate_interval: DEFAULT_REVALIDATE_INTERVAL,
        }
    }
}
