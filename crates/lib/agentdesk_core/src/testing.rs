//! In-memory fakes of the session collaborators, for tests here and in
//! downstream crates (enable the `testing` feature).

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use jsonwebtoken::{EncodingKey, Header, encode};

use crate::auth::RemoteError;
use crate::auth::remote::{AuthService, UserDirectory};
use crate::models::auth::{
    AdminUser, CollaboratorUser, LoginGrant, LoginRequest, Role, SessionUser, TokenClaims,
};
use crate::session::StorageError;
use crate::session::guard::{Navigation, Navigator};
use crate::session::storage::KeyValueStorage;
use crate::session::store::SLOT_SUBJECT_ID;

/// Reference "now" for tests using a fixed clock.
pub const TEST_NOW: i64 = 1_760_000_000;

/// Mint a credential for `uid` expiring at `exp`. Signed with a throwaway key.
pub fn token_expiring_at(uid: &str, exp: i64) -> String {
    let claims = TokenClaims {
        sub: uid.to_string(),
        email: format!("{uid}@example.com"),
        roles: Vec::new(),
        exp,
        iat: exp - 3600,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"test-only"),
    )
    .unwrap_or_default()
}

/// A login grant for `uid` whose credential expires at `exp`.
///
/// The connection history id is `ch-<uid>`.
pub fn grant_for(uid: &str, exp: i64) -> LoginGrant {
    LoginGrant {
        credential: token_expiring_at(uid, exp),
        refresh_credential: format!("refresh-{uid}"),
        email: format!("{uid}@example.com"),
        credential_lifetime_secs: 3600,
        connection_history_id: format!("ch-{uid}"),
        subject_id: uid.to_string(),
    }
}

/// Scripted [`AuthService`].
#[derive(Default)]
pub struct FakeAuthService {
    grant: Option<LoginGrant>,
    login_failure: Option<RemoteError>,
    logout_failure: Option<RemoteError>,
    login_calls: AtomicU32,
    logged_out: Mutex<Vec<String>>,
}

impl FakeAuthService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_grant(mut self, grant: LoginGrant) -> Self {
        self.grant = Some(grant);
        self
    }

    pub fn with_login_failure(mut self, e: RemoteError) -> Self {
        self.login_failure = Some(e);
        self
    }

    pub fn with_logout_failure(mut self, e: RemoteError) -> Self {
        self.logout_failure = Some(e);
        self
    }

    pub fn login_calls(&self) -> u32 {
        self.login_calls.load(Ordering::SeqCst)
    }

    pub fn logout_calls(&self) -> u32 {
        self.logged_out_connections().len() as u32
    }

    pub fn logged_out_connections(&self) -> Vec<String> {
        self.logged_out
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl AuthService for FakeAuthService {
    async fn login(&self, _request: &LoginRequest) -> Result<LoginGrant, RemoteError> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(e) = &self.login_failure {
            return Err(e.clone());
        }
        self.grant.clone().ok_or_else(|| RemoteError::Rejected {
            status: 401,
            message: "Invalid credentials".into(),
        })
    }

    async fn logout(&self, connection_history_id: &str) -> Result<(), RemoteError> {
        self.logged_out
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(connection_history_id.to_string());
        match &self.logout_failure {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }
}

/// In-memory [`UserDirectory`] counting lookups per category.
#[derive(Default)]
pub struct FakeDirectory {
    admins: HashMap<String, AdminUser>,
    collaborators: HashMap<String, CollaboratorUser>,
    admin_failure: Option<RemoteError>,
    admin_calls: AtomicU32,
    collaborator_calls: AtomicU32,
}

impl FakeDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn admin_user(uid: &str, role: Role) -> AdminUser {
        AdminUser {
            uid: uid.to_string(),
            role,
            email: format!("{uid}@example.com"),
            first_name: None,
            last_name: None,
            company_name: Some("Acme".into()),
            products: vec!["support".into()],
        }
    }

    pub fn collaborator_user(uid: &str) -> CollaboratorUser {
        CollaboratorUser {
            uid: uid.to_string(),
            role: Role::Collaborator,
            email: format!("{uid}@example.com"),
            first_name: None,
            last_name: None,
            admin_uid: Some("a1".into()),
            products: vec!["support".into()],
        }
    }

    pub fn admin(uid: &str, role: Role) -> SessionUser {
        SessionUser::Admin(Self::admin_user(uid, role))
    }

    pub fn collaborator(uid: &str) -> SessionUser {
        SessionUser::Collaborator(Self::collaborator_user(uid))
    }

    pub fn with_admin(mut self, uid: &str, role: Role) -> Self {
        self.admins
            .insert(uid.to_string(), Self::admin_user(uid, role));
        self
    }

    pub fn with_collaborator(mut self, uid: &str) -> Self {
        self.collaborators
            .insert(uid.to_string(), Self::collaborator_user(uid));
        self
    }

    /// Make every admin lookup fail with `e`.
    pub fn with_admin_failure(mut self, e: RemoteError) -> Self {
        self.admin_failure = Some(e);
        self
    }

    pub fn admin_calls(&self) -> u32 {
        self.admin_calls.load(Ordering::SeqCst)
    }

    pub fn collaborator_calls(&self) -> u32 {
        self.collaborator_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserDirectory for FakeDirectory {
    async fn admin_by_uid(&self, uid: &str) -> Result<AdminUser, RemoteError> {
        self.admin_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(e) = &self.admin_failure {
            return Err(e.clone());
        }
        self.admins
            .get(uid)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound(format!("admin {uid}")))
    }

    async fn collaborator_by_uid(&self, uid: &str) -> Result<CollaboratorUser, RemoteError> {
        self.collaborator_calls.fetch_add(1, Ordering::SeqCst);
        self.collaborators
            .get(uid)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound(format!("collaborator {uid}")))
    }
}

/// Records navigation requests.
#[derive(Default)]
pub struct RecordingNavigator {
    requests: Mutex<Vec<Navigation>>,
}

impl RecordingNavigator {
    pub fn requests(&self) -> Vec<Navigation> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, to: Navigation) {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(to);
    }
}

/// Storage wrapper counting removals of the sentinel slot (one per clear).
pub struct CountingStorage<S> {
    inner: S,
    sentinel_removals: AtomicU32,
}

impl<S: KeyValueStorage> CountingStorage<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            sentinel_removals: AtomicU32::new(0),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn sentinel_removals(&self) -> u32 {
        self.sentinel_removals.load(Ordering::SeqCst)
    }
}

impl<S: KeyValueStorage> KeyValueStorage for CountingStorage<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        if key == SLOT_SUBJECT_ID {
            self.sentinel_removals.fetch_add(1, Ordering::SeqCst);
        }
        self.inner.remove(key)
    }
}
