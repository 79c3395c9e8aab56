//! Session lifecycle: persisted store, state machine, scheduler and guard.
//!
//! # Public API
//!
//! - [`manager::SessionManager`]: owns the in-memory session and exposes
//!   `initialize`, `login`, `logout` and `revalidate`
//! - [`scheduler::RevalidationScheduler`]: periodic and visibility-driven
//!   expiry checks
//! - [`store::SessionStore`]: the persisted session slots
//! - [`guard::guard_route`]: gate routes on the committed session

pub mod guard;
pub mod machine;
pub mod manager;
pub mod scheduler;
pub mod storage;
pub mod store;

use thiserror::Error;

use crate::auth::RemoteError;
use crate::auth::resolve::ResolveError;

/// Durable storage failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Storage corrupt: {0}")]
    Corrupt(String),
}

/// Errors surfaced to callers of [`manager::SessionManager::login`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Privileged role rejected: {0}")]
    PrivilegedRoleRejected(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl SessionError {
    /// Message suitable for showing to the person signing in.
    pub fn user_message(&self) -> &'static str {
        match self {
            SessionError::InvalidCredentials => "Invalid username or password.",
            SessionError::UserNotFound(_) => {
                "No dashboard account is associated with these credentials."
            }
            SessionError::PrivilegedRoleRejected(_) => {
                "Super administrator accounts cannot sign in to the dashboard."
            }
            SessionError::Transport(_) => {
                "Unable to reach the server. Check your connection and try again."
            }
            SessionError::Storage(_) => "Unable to save the session on this device.",
        }
    }
}

impl From<RemoteError> for SessionError {
    fn from(e: RemoteError) -> Self {
        match e {
            RemoteError::Rejected { status: 400 | 401 | 403, .. } => {
                SessionError::InvalidCredentials
            }
            RemoteError::NotFound(_) => SessionError::InvalidCredentials,
            RemoteError::Rejected { status, message } => {
                SessionError::Transport(format!("server answered {status}: {message}"))
            }
            RemoteError::Transport(msg) => SessionError::Transport(msg),
        }
    }
}

impl From<ResolveError> for SessionError {
    fn from(e: ResolveError) -> Self {
        match e {
            ResolveError::UserNotFound(uid) => SessionError::UserNotFound(uid),
            ResolveError::Remote(RemoteError::Transport(msg)) => SessionError::Transport(msg),
            ResolveError::Remote(other) => SessionError::Transport(other.to_string()),
        }
    }
}
