//! # agentdesk_api_client
//!
//! HTTP client for the Agentdesk backend. Implements the remote auth and user
//! lookup services consumed by `agentdesk_core`, behind a single-flight
//! bootstrap of the backend base address.

pub mod bootstrap;
pub mod client;
pub mod config;
mod wire;

use thiserror::Error;

pub use bootstrap::BootstrapGuard;
pub use client::ApiClient;
pub use config::ClientConfig;

/// Client construction errors.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}
