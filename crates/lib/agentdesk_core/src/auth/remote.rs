//! Interfaces of the remote services the session lifecycle consumes.
//!
//! Implemented over HTTP by `agentdesk_api_client`; in-memory fakes live in
//! [`crate::testing`].

use async_trait::async_trait;

use super::RemoteError;
use crate::models::auth::{AdminUser, CollaboratorUser, LoginGrant, LoginRequest};

/// Remote credential issuance.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Exchange username/password for a credential.
    async fn login(&self, request: &LoginRequest) -> Result<LoginGrant, RemoteError>;

    /// Close the connection-history entry opened by a login.
    async fn logout(&self, connection_history_id: &str) -> Result<(), RemoteError>;
}

/// Remote user lookup by subject id.
///
/// Both methods fail with [`RemoteError::NotFound`] when the id does not
/// belong to that category.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn admin_by_uid(&self, uid: &str) -> Result<AdminUser, RemoteError>;

    async fn collaborator_by_uid(&self, uid: &str) -> Result<CollaboratorUser, RemoteError>;
}
