// @awa-component: SESS-PersistedStore
//
//! Persisted session: the slots that let a session survive a restart.
//!
//! The subject id (`uid`) is the sentinel: it is written last and checked
//! first. A sentinel without the rest of the group reads as "no session".

use std::sync::Arc;

use tracing::{debug, warn};

use super::StorageError;
use super::storage::KeyValueStorage;
use crate::models::auth::{PersistedSession, Role, SessionUser};

pub const SLOT_CREDENTIAL: &str = "token";
pub const SLOT_REFRESH_CREDENTIAL: &str = "refreshToken";
pub const SLOT_EMAIL: &str = "email";
pub const SLOT_CREDENTIAL_LIFETIME: &str = "expiresIn";
pub const SLOT_CONNECTION_HISTORY_ID: &str = "connectionHistoryId";
pub const SLOT_SUBJECT_ID: &str = "uid";
pub const SLOT_ROLE: &str = "role";
pub const SLOT_USER: &str = "user";

/// Every slot owned by the session, in clearing order.
pub const ALL_SLOTS: [&str; 8] = [
    SLOT_SUBJECT_ID,
    SLOT_CREDENTIAL,
    SLOT_REFRESH_CREDENTIAL,
    SLOT_EMAIL,
    SLOT_CREDENTIAL_LIFETIME,
    SLOT_CONNECTION_HISTORY_ID,
    SLOT_ROLE,
    SLOT_USER,
];

/// Typed access to the persisted session slots.
#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn KeyValueStorage>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    /// Write every slot, sentinel last.
    pub fn write_session(&self, session: &PersistedSession) -> Result<(), StorageError> {
        let s = &self.storage;
        s.set(SLOT_CREDENTIAL, &session.credential)?;
        s.set(SLOT_REFRESH_CREDENTIAL, &session.refresh_credential)?;
        s.set(SLOT_EMAIL, &session.email)?;
        s.set(
            SLOT_CREDENTIAL_LIFETIME,
            &session.credential_lifetime_secs.to_string(),
        )?;
        s.set(SLOT_CONNECTION_HISTORY_ID, &session.connection_history_id)?;
        match session.role {
            Some(role) => s.set(SLOT_ROLE, role.as_str())?,
            None => s.remove(SLOT_ROLE)?,
        }
        match &session.user {
            Some(user) => s.set(SLOT_USER, &encode_user(user)?)?,
            None => s.remove(SLOT_USER)?,
        }
        s.set(SLOT_SUBJECT_ID, &session.subject_id)?;
        debug!(uid = %session.subject_id, "persisted session written");
        Ok(())
    }

    /// Record the resolved role and user snapshot of the current session.
    pub fn record_user(&self, user: &SessionUser) -> Result<(), StorageError> {
        self.storage.set(SLOT_ROLE, user.role().as_str())?;
        self.storage.set(SLOT_USER, &encode_user(user)?)
    }

    /// Read the persisted session; `None` unless the whole group is present.
    ///
    /// Storage failures read as "no session".
    pub fn read_session(&self) -> Option<PersistedSession> {
        match self.try_read() {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "persisted session unreadable, treating as absent");
                None
            }
        }
    }

    fn try_read(&self) -> Result<Option<PersistedSession>, StorageError> {
        let s = &self.storage;
        let Some(subject_id) = s.get(SLOT_SUBJECT_ID)?.filter(|v| !v.is_empty()) else {
            return Ok(None);
        };
        let credential = s.get(SLOT_CREDENTIAL)?.filter(|v| !v.is_empty());
        let lifetime = s
            .get(SLOT_CREDENTIAL_LIFETIME)?
            .and_then(|v| v.parse::<i64>().ok());
        let connection_history_id = s.get(SLOT_CONNECTION_HISTORY_ID)?;
        let (Some(credential), Some(lifetime), Some(connection_history_id)) =
            (credential, lifetime, connection_history_id)
        else {
            debug!(uid = %subject_id, "partial persisted session, treating as absent");
            return Ok(None);
        };

        let role = s.get(SLOT_ROLE)?.and_then(|v| v.parse::<Role>().ok());
        let user = s.get(SLOT_USER)?.and_then(|raw| {
            serde_json::from_str::<SessionUser>(&raw)
                .inspect_err(|e| debug!(error = %e, "discarding undecodable user snapshot"))
                .ok()
        });

        Ok(Some(PersistedSession {
            credential,
            refresh_credential: s.get(SLOT_REFRESH_CREDENTIAL)?.unwrap_or_default(),
            email: s.get(SLOT_EMAIL)?.unwrap_or_default(),
            credential_lifetime_secs: lifetime,
            connection_history_id,
            subject_id,
            role,
            user,
        }))
    }

    /// The stored credential, if any (partial sessions included).
    pub fn credential(&self) -> Option<String> {
        self.storage
            .get(SLOT_CREDENTIAL)
            .ok()
            .flatten()
            .filter(|v| !v.is_empty())
    }

    /// The stored connection-history id, if any (partial sessions included).
    pub fn connection_history_id(&self) -> Option<String> {
        self.storage
            .get(SLOT_CONNECTION_HISTORY_ID)
            .ok()
            .flatten()
            .filter(|v| !v.is_empty())
    }

    /// Remove every session slot, whether or not this flow set it.
    pub fn clear_session(&self) {
        for slot in ALL_SLOTS {
            if let Err(e) = self.storage.remove(slot) {
                warn!(slot, error = %e, "failed to clear persisted slot");
            }
        }
        debug!("persisted session cleared");
    }
}

fn encode_user(user: &SessionUser) -> Result<String, StorageError> {
    serde_json::to_string(user).map_err(|e| StorageError::Corrupt(format!("user snapshot: {e}")))
}
