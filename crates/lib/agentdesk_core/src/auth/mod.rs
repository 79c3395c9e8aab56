//! Authentication logic.
//!
//! Provides credential validation, the remote collaborator interfaces and the
//! role resolution chain shared by the session manager and the API client.

pub mod remote;
pub mod resolve;
pub mod token;

use thiserror::Error;

/// Failures reported by a remote collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The requested record does not exist in that category.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The backend answered but refused the request.
    #[error("Rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// Network, timeout or decode failure.
    #[error("Transport error: {0}")]
    Transport(String),
}

impl RemoteError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteError::NotFound(_))
    }
}
