//! Authentication domain models.
//!
//! These are client-side domain models, distinct from the wire shapes used by
//! `agentdesk_api_client` (which carry `#[serde(rename)]` for camelCase etc.).

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// JWT claims embedded in access tokens issued by the backend.
///
/// Every field defaults so that a token missing a claim still decodes; the
/// validator decides what a missing claim means.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject: user ID (standard JWT `sub` claim).
    #[serde(default)]
    pub sub: String,
    /// User email.
    #[serde(default)]
    pub email: String,
    /// User roles (e.g. `["ADMIN"]`).
    #[serde(default)]
    pub roles: Vec<String>,
    /// Expiry (unix timestamp).
    #[serde(default)]
    pub exp: i64,
    /// Issued at (unix timestamp).
    #[serde(default)]
    pub iat: i64,
}

/// Decoded credential plus the validity computed at check time.
///
/// `is_valid` is not part of the credential. It is recomputed by every call
/// to [`crate::auth::token::validate_at`] and must not be cached.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenPayload {
    pub expires_at: i64,
    pub issued_at: i64,
    pub subject_id: String,
    pub email: String,
    pub roles: BTreeSet<String>,
    pub is_valid: bool,
}

impl TokenPayload {
    /// Seconds until expiry relative to `now` (negative once expired).
    pub fn seconds_remaining(&self, now: i64) -> i64 {
        self.expires_at - now
    }
}

/// User category as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Collaborator,
    SuperAdmin,
}

impl Role {
    /// Whether this category must never be admitted into a dashboard session.
    pub fn is_privileged(self) -> bool {
        matches!(self, Role::SuperAdmin)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Collaborator => "COLLABORATOR",
            Role::SuperAdmin => "SUPER_ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(Role::Admin),
            "COLLABORATOR" => Ok(Role::Collaborator),
            "SUPER_ADMIN" => Ok(Role::SuperAdmin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Account owner of one or more agent products.
///
/// Super admins are served by the same endpoint and carry
/// `role == Role::SuperAdmin`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUser {
    pub uid: String,
    pub role: Role,
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    /// Agent products the account has subscribed to (e.g. `"support"`).
    #[serde(default)]
    pub products: Vec<String>,
}

/// Member invited by an admin, scoped to a subset of the admin's products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollaboratorUser {
    pub uid: String,
    pub role: Role,
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    /// Uid of the admin who invited this collaborator.
    #[serde(default)]
    pub admin_uid: Option<String>,
    #[serde(default)]
    pub products: Vec<String>,
}

/// The user behind a session, as resolved from a subject id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionUser {
    Admin(AdminUser),
    Collaborator(CollaboratorUser),
}

impl SessionUser {
    pub fn uid(&self) -> &str {
        match self {
            SessionUser::Admin(u) => &u.uid,
            SessionUser::Collaborator(u) => &u.uid,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            SessionUser::Admin(u) => u.role,
            SessionUser::Collaborator(u) => u.role,
        }
    }

    pub fn email(&self) -> &str {
        match self {
            SessionUser::Admin(u) => &u.email,
            SessionUser::Collaborator(u) => &u.email,
        }
    }

    pub fn is_privileged(&self) -> bool {
        self.role().is_privileged()
    }
}

/// Username/password submitted to the remote login endpoint.
#[derive(Debug, Clone, Default)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    /// Client IP reported to the backend for the connection history.
    pub ip_address: Option<String>,
    /// Where to navigate once the session is authenticated.
    pub return_to: Option<String>,
}

/// Successful response of the remote login endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginGrant {
    pub credential: String,
    pub refresh_credential: String,
    pub email: String,
    pub credential_lifetime_secs: i64,
    /// Correlates the eventual logout call with this login.
    pub connection_history_id: String,
    pub subject_id: String,
}

/// Durable projection of a successful login.
///
/// `role` and `user` are filled in once the subject has been resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedSession {
    pub credential: String,
    pub refresh_credential: String,
    pub email: String,
    pub credential_lifetime_secs: i64,
    pub connection_history_id: String,
    pub subject_id: String,
    pub role: Option<Role>,
    pub user: Option<SessionUser>,
}

impl From<LoginGrant> for PersistedSession {
    fn from(grant: LoginGrant) -> Self {
        Self {
            credential: grant.credential,
            refresh_credential: grant.refresh_credential,
            email: grant.email,
            credential_lifetime_secs: grant.credential_lifetime_secs,
            connection_history_id: grant.connection_history_id,
            subject_id: grant.subject_id,
            role: None,
            user: None,
        }
    }
}
