//! Domain models shared across the session lifecycle.

pub mod auth;
