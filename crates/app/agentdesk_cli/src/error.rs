use agentdesk_api_client::ClientError;
use agentdesk_core::session::SessionError;
use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{}", .0)]
    Custom(String),

    #[error("IO::{:?}: {}", .0, .0)]
    Io(#[from] std::io::Error),

    #[error("Json::{}", .0)]
    Json(#[from] serde_json::Error),

    #[error("Client::{}", .0)]
    Client(#[from] ClientError),

    #[error("Session::{}", .0)]
    Session(#[from] SessionError),
}

impl Error {
    /// Text shown to the operator on failure.
    pub fn user_message(&self) -> String {
        match self {
            Error::Session(e) => e.user_message().to_string(),
            other => other.to_string(),
        }
    }
}
