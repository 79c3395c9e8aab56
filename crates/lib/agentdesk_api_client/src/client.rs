// @awa-component: HTTP-ApiClient
//
//! Backend client implementing the remote auth and user lookup services.

use std::sync::Arc;

use agentdesk_core::auth::RemoteError;
use agentdesk_core::auth::remote::{AuthService, UserDirectory};
use agentdesk_core::models::auth::{AdminUser, CollaboratorUser, LoginGrant, LoginRequest};
use agentdesk_core::session::store::SessionStore;
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::ClientError;
use crate::bootstrap::{BaseUrlSource, BootstrapGuard};
use crate::config::ClientConfig;
use crate::wire::{AdminResponse, CollaboratorResponse, LoginBody, LoginResponse};

/// Shared HTTP client for the backend.
///
/// Every request first goes through the [`BootstrapGuard`]; the bearer
/// credential, if any, is read from the persisted session.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    guard: BootstrapGuard,
    store: Option<SessionStore>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig, source: Arc<dyn BaseUrlSource>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            http,
            guard: BootstrapGuard::new(source),
            store: None,
        })
    }

    /// Authorize requests with the credential of this persisted session.
    pub fn with_session_store(mut self, store: SessionStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn guard(&self) -> &BootstrapGuard {
        &self.guard
    }

    /// Base address for the next request; retries configuration once if it
    /// is still empty.
    async fn base_url(&self) -> String {
        self.guard.ensure_configured().await;
        let base = self.guard.base_url();
        if !base.is_empty() {
            return base;
        }
        self.guard.ensure_configured().await;
        self.guard.base_url()
    }

    async fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, RemoteError> {
        let base = self.base_url().await;
        let url = endpoint(&base, segments)?;
        debug!(%method, %url, "backend request");
        let mut builder = self.http.request(method, url);
        if let Some(token) = self.store.as_ref().and_then(|s| s.credential()) {
            builder = builder.bearer_auth(token);
        }
        Ok(builder)
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, RemoteError> {
        let resp = send(self.request(Method::GET, segments).await?).await?;
        resp.json::<T>()
            .await
            .map_err(|e| RemoteError::Transport(format!("decode response: {e}")))
    }
}

/// Join path segments onto the base address.
fn endpoint(base: &str, segments: &[&str]) -> Result<Url, RemoteError> {
    if base.is_empty() {
        return Err(RemoteError::Transport(
            "backend base address is not configured".into(),
        ));
    }
    let mut url = Url::parse(base).map_err(|e| RemoteError::Transport(format!("base address: {e}")))?;
    url.path_segments_mut()
        .map_err(|_| RemoteError::Transport(format!("base address cannot carry a path: {base}")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

async fn send(builder: RequestBuilder) -> Result<Response, RemoteError> {
    let resp = builder
        .send()
        .await
        .map_err(|e| RemoteError::Transport(e.to_string()))?;
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let message = resp.text().await.unwrap_or_default();
    Err(match status {
        StatusCode::NOT_FOUND => RemoteError::NotFound(message),
        _ => RemoteError::Rejected {
            status: status.as_u16(),
            message,
        },
    })
}

#[async_trait]
impl AuthService for ApiClient {
    async fn login(&self, request: &LoginRequest) -> Result<LoginGrant, RemoteError> {
        let body = LoginBody {
            username: &request.username,
            password: &request.password,
            ip_address: request.ip_address.as_deref(),
        };
        let resp = send(self.request(Method::POST, &["auth", "login"]).await?.json(&body)).await?;
        let grant: LoginResponse = resp
            .json()
            .await
            .map_err(|e| RemoteError::Transport(format!("decode login response: {e}")))?;
        Ok(grant.into())
    }

    async fn logout(&self, connection_history_id: &str) -> Result<(), RemoteError> {
        send(
            self.request(Method::POST, &["auth", "logout", connection_history_id])
                .await?,
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for ApiClient {
    async fn admin_by_uid(&self, uid: &str) -> Result<AdminUser, RemoteError> {
        self.get_json::<AdminResponse>(&["admins", uid])
            .await
            .map(AdminUser::from)
    }

    async fn collaborator_by_uid(&self, uid: &str) -> Result<CollaboratorUser, RemoteError> {
        self.get_json::<CollaboratorResponse>(&["collaborators", uid])
            .await
            .map(CollaboratorUser::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_appends_segments_to_base_path() {
        let url = endpoint("https://api.example.com/v1", &["admins", "u 1"]).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v1/admins/u%201");
        let url = endpoint("http://localhost:3001", &["auth", "login"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3001/auth/login");
    }

    #[test]
    fn empty_base_is_a_transport_error() {
        assert!(matches!(
            endpoint("", &["auth", "login"]),
            Err(RemoteError::Transport(_))
        ));
    }
}
