// @awa-component: HTTP-BootstrapGuard
//
//! Base address bootstrap for the shared HTTP client.
//!
//! The backend address comes from runtime configuration that may resolve
//! after the first request is attempted. [`BootstrapGuard`] collapses
//! concurrent configuration attempts into one in-flight future shared by
//! every caller; the slot is cleared when that attempt settles so a later
//! call can retry.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use serde::Deserialize;
use tracing::{debug, info, warn};

/// Environment variable holding the backend base address.
pub const API_URL_ENV: &str = "AGENTDESK_API_URL";

/// Provides the backend base address at runtime.
#[async_trait]
pub trait BaseUrlSource: Send + Sync {
    /// `None` when the address is not (yet) known.
    async fn resolve_base_url(&self) -> Option<String>;

    /// Name for logging.
    fn name(&self) -> &str;
}

/// A fixed address.
#[derive(Debug, Clone)]
pub struct StaticBaseUrl(pub String);

#[async_trait]
impl BaseUrlSource for StaticBaseUrl {
    async fn resolve_base_url(&self) -> Option<String> {
        Some(self.0.clone())
    }

    fn name(&self) -> &str {
        "static"
    }
}

/// Address read from an environment variable at resolution time.
#[derive(Debug, Clone)]
pub struct EnvBaseUrl {
    var: String,
}

impl EnvBaseUrl {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvBaseUrl {
    fn default() -> Self {
        Self::new(API_URL_ENV)
    }
}

#[async_trait]
impl BaseUrlSource for EnvBaseUrl {
    async fn resolve_base_url(&self) -> Option<String> {
        std::env::var(&self.var).ok()
    }

    fn name(&self) -> &str {
        "env"
    }
}

/// Runtime config file shipped next to the dashboard.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RuntimeConfig {
    api_url: Option<String>,
}

/// Address read from a JSON runtime config file (`{"apiUrl": "..."}`).
#[derive(Debug, Clone)]
pub struct RuntimeConfigFile {
    path: PathBuf,
}

impl RuntimeConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl BaseUrlSource for RuntimeConfigFile {
    async fn resolve_base_url(&self) -> Option<String> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "runtime config unavailable");
                return None;
            }
        };
        match serde_json::from_str::<RuntimeConfig>(&raw) {
            Ok(config) => config.api_url,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "invalid runtime config");
                None
            }
        }
    }

    fn name(&self) -> &str {
        "runtime-config"
    }
}

/// Tries each source in order; the first non-empty address wins.
#[derive(Clone, Default)]
pub struct FirstAvailable(pub Vec<Arc<dyn BaseUrlSource>>);

#[async_trait]
impl BaseUrlSource for FirstAvailable {
    async fn resolve_base_url(&self) -> Option<String> {
        for source in &self.0 {
            if let Some(url) = source.resolve_base_url().await
                && !url.trim().is_empty()
            {
                debug!(source = source.name(), "base address resolved");
                return Some(url);
            }
        }
        None
    }

    fn name(&self) -> &str {
        "first-available"
    }
}

type Attempt = Shared<BoxFuture<'static, bool>>;

struct Inner {
    source: Arc<dyn BaseUrlSource>,
    base_url: RwLock<String>,
    in_flight: Mutex<Option<Attempt>>,
}

/// Single-flight configuration of the client's base address.
#[derive(Clone)]
pub struct BootstrapGuard {
    inner: Arc<Inner>,
}

impl BootstrapGuard {
    pub fn new(source: Arc<dyn BaseUrlSource>) -> Self {
        Self {
            inner: Arc::new(Inner {
                source,
                base_url: RwLock::new(String::new()),
                in_flight: Mutex::new(None),
            }),
        }
    }

    /// Current base address; empty until configured.
    pub fn base_url(&self) -> String {
        self.inner
            .base_url
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn is_configured(&self) -> bool {
        !self.base_url().is_empty()
    }

    /// Make sure the base address is configured.
    ///
    /// Joins the in-flight attempt if there is one, returns at once if the
    /// address is already set, and otherwise starts exactly one attempt.
    /// Returns whether the address is configured afterwards.
    pub async fn ensure_configured(&self) -> bool {
        let attempt = {
            let mut slot = self
                .inner
                .in_flight
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            match slot.as_ref() {
                Some(attempt) => attempt.clone(),
                None if self.is_configured() => return true,
                None => {
                    let attempt = configure(self.inner.clone()).boxed().shared();
                    *slot = Some(attempt.clone());
                    attempt
                }
            }
        };
        attempt.await
    }
}

async fn configure(inner: Arc<Inner>) -> bool {
    let resolved = inner
        .source
        .resolve_base_url()
        .await
        .and_then(|raw| normalize(&raw));
    let configured = match resolved {
        Some(url) => {
            info!(base_url = %url, source = inner.source.name(), "HTTP client configured");
            *inner.base_url.write().unwrap_or_else(|e| e.into_inner()) = url;
            true
        }
        None => {
            warn!(source = inner.source.name(), "backend base address unavailable");
            false
        }
    };
    *inner.in_flight.lock().unwrap_or_else(|e| e.into_inner()) = None;
    configured
}

/// Trim and drop the trailing slash; reject anything that is not an absolute
/// http(s) URL.
fn normalize(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return None;
    }
    match url::Url::parse(trimmed) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Some(trimmed.to_string()),
        Ok(url) => {
            warn!(scheme = url.scheme(), "unsupported base address scheme");
            None
        }
        Err(e) => {
            warn!(error = %e, "unparsable base address");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use super::*;

    /// Source that resolves after a delay and counts reads.
    struct SlowSource {
        url: Option<String>,
        reads: AtomicU32,
    }

    impl SlowSource {
        fn new(url: Option<&str>) -> Arc<Self> {
            Arc::new(Self {
                url: url.map(str::to_string),
                reads: AtomicU32::new(0),
            })
        }

        fn reads(&self) -> u32 {
            self.reads.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl BaseUrlSource for SlowSource {
        async fn resolve_base_url(&self) -> Option<String> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            self.url.clone()
        }

        fn name(&self) -> &str {
            "slow"
        }
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_attempt() {
        let source = SlowSource::new(Some("http://127.0.0.1:9000/"));
        let guard = BootstrapGuard::new(source.clone());

        let results =
            futures::future::join_all((0..16).map(|_| guard.ensure_configured())).await;

        assert!(results.iter().all(|ok| *ok));
        assert_eq!(source.reads(), 1);
        assert_eq!(guard.base_url(), "http://127.0.0.1:9000");
    }

    #[tokio::test]
    async fn configured_guard_returns_without_reading() {
        let source = SlowSource::new(Some("http://127.0.0.1:9000"));
        let guard = BootstrapGuard::new(source.clone());
        assert!(guard.ensure_configured().await);
        assert!(guard.ensure_configured().await);
        assert_eq!(source.reads(), 1);
    }

    #[tokio::test]
    async fn failed_attempt_allows_retry() {
        let source = SlowSource::new(None);
        let guard = BootstrapGuard::new(source.clone());
        assert!(!guard.ensure_configured().await);
        assert!(!guard.ensure_configured().await);
        assert_eq!(source.reads(), 2);
        assert_eq!(guard.base_url(), "");
    }

    #[tokio::test]
    async fn first_available_skips_empty_sources() {
        let source = FirstAvailable(vec![
            Arc::new(StaticBaseUrl("  ".into())),
            Arc::new(EnvBaseUrl::new("AGENTDESK_TEST_UNSET_VARIABLE")),
            Arc::new(StaticBaseUrl("https://api.example.com".into())),
        ]);
        assert_eq!(
            source.resolve_base_url().await.as_deref(),
            Some("https://api.example.com")
        );
    }

    #[tokio::test]
    async fn runtime_config_file_supplies_address() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"apiUrl": "https://api.example.com/v1/"}"#).unwrap();

        let guard = BootstrapGuard::new(Arc::new(RuntimeConfigFile::new(&path)));
        assert!(guard.ensure_configured().await);
        assert_eq!(guard.base_url(), "https://api.example.com/v1");
    }

    #[tokio::test]
    async fn missing_runtime_config_is_unavailable() {
        let source = RuntimeConfigFile::new("/nonexistent/agentdesk/config.json");
        assert_eq!(source.resolve_base_url().await, None);
    }

    #[test]
    fn normalize_rejects_relative_and_foreign_schemes() {
        assert_eq!(normalize("/api"), None);
        assert_eq!(normalize("ftp://example.com"), None);
        assert_eq!(normalize(""), None);
        assert_eq!(
            normalize(" http://localhost:3001/ ").as_deref(),
            Some("http://localhost:3001")
        );
    }
}
