//! # agentdesk_core
//!
//! Session and authentication lifecycle for the Agentdesk dashboard:
//! credential validation, role resolution, the session state machine, the
//! persisted session and expiry revalidation.

pub mod auth;
pub mod clock;
pub mod config;
pub mod models;
pub mod session;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_not_empty() {
        assert!(!version().is_empty());
    }
}
