//! HTTP client configuration.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::bootstrap::{BaseUrlSource, EnvBaseUrl, FirstAvailable, RuntimeConfigFile};

/// Default request timeout: 30 seconds.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for [`crate::ApiClient`].
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Fixed timeout applied to every request.
    pub request_timeout: Duration,
    /// Optional JSON runtime config consulted when the env var is unset.
    pub runtime_config: Option<PathBuf>,
}

impl ClientConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable                      | Default |
    /// |-------------------------------|---------|
    /// | `AGENTDESK_HTTP_TIMEOUT_SECS` | `30`    |
    /// | `AGENTDESK_RUNTIME_CONFIG`    | unset   |
    ///
    /// The base address itself (`AGENTDESK_API_URL`) is read lazily by the
    /// bootstrap guard, not here.
    pub fn from_env() -> Self {
        let request_timeout = std::env::var("AGENTDESK_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT);
        let runtime_config = std::env::var("AGENTDESK_RUNTIME_CONFIG")
            .ok()
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        Self {
            request_timeout,
            runtime_config,
        }
    }

    /// Base address sources in priority order: environment, then runtime
    /// config file.
    pub fn base_url_source(&self) -> Arc<dyn BaseUrlSource> {
        let mut sources: Vec<Arc<dyn BaseUrlSource>> = vec![Arc::new(EnvBaseUrl::default())];
        if let Some(path) = &self.runtime_config {
            sources.push(Arc::new(RuntimeConfigFile::new(path)));
        }
        Arc::new(FirstAvailable(sources))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_TIMEOUT,
            runtime_config: None,
        }
    }
}
