// @awa-component: SESS-SessionManager
//
//! Session manager: the only writer of the in-memory session and of the
//! persisted session.
//!
//! Every transition goes through [`SessionManager::dispatch`], which applies
//! [`apply_transition`] to the committed state in one step. Observers see
//! each committed state in order.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::SessionError;
use super::guard::{Navigation, Navigator};
use super::machine::{Session, SessionEvent, apply_transition};
use super::store::SessionStore;
use crate::auth::remote::{AuthService, UserDirectory};
use crate::auth::resolve::{ResolveError, resolve_user};
use crate::auth::token::validate_at;
use crate::clock::{Clock, SystemClock};
use crate::models::auth::{LoginRequest, PersistedSession, SessionUser};

/// Sees every committed transition.
pub trait SessionObserver: Send + Sync {
    fn on_transition(&self, event: &SessionEvent, session: &Session);
}

/// Result of a [`SessionManager::revalidate`] check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Revalidation {
    /// No authenticated session to check.
    Idle,
    /// Credential still valid.
    Valid,
    /// Credential missing or expired; the session was logged out.
    LoggedOut,
}

/// Owns the session and exposes its mutators.
pub struct SessionManager {
    state: watch::Sender<Session>,
    store: SessionStore,
    auth: Arc<dyn AuthService>,
    directory: Arc<dyn UserDirectory>,
    navigator: Arc<dyn Navigator>,
    clock: Arc<dyn Clock>,
    observers: Vec<Arc<dyn SessionObserver>>,
}

impl SessionManager {
    pub fn new(
        store: SessionStore,
        auth: Arc<dyn AuthService>,
        directory: Arc<dyn UserDirectory>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let (state, _) = watch::channel(Session::default());
        Self {
            state,
            store,
            auth,
            directory,
            navigator,
            clock: Arc::new(SystemClock),
            observers: Vec::new(),
        }
    }

    /// Replace the clock used for expiry checks.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Register an observer of committed transitions.
    pub fn with_observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Snapshot of the committed session.
    pub fn current(&self) -> Session {
        self.state.borrow().clone()
    }

    /// Receiver that wakes on every committed change.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    fn dispatch(&self, event: SessionEvent) -> Session {
        self.dispatch_if(|_| true, event)
            .unwrap_or_else(|| self.current())
    }

    /// Apply `event` only if `admit` accepts the committed state, checked and
    /// applied in one step. Returns the new state when the event was applied.
    fn dispatch_if(
        &self,
        admit: impl FnOnce(&Session) -> bool,
        event: SessionEvent,
    ) -> Option<Session> {
        let mut committed = None;
        self.state.send_if_modified(|state| {
            if !admit(state) {
                return false;
            }
            *state = apply_transition(state, event.clone());
            committed = Some(state.clone());
            true
        });
        let session = committed?;
        debug!(event = event.name(), phase = ?session.phase(), "session transition");
        for observer in &self.observers {
            observer.on_transition(&event, &session);
        }
        Some(session)
    }

    /// Restore the session from persisted state.
    ///
    /// Never fails: every failure settles as unauthenticated, and the session
    /// is never left loading.
    pub async fn initialize(&self) -> Session {
        self.dispatch(SessionEvent::Loading);
        let user = self.restore().await;
        self.dispatch(SessionEvent::Initialized { user })
    }

    async fn restore(&self) -> Option<SessionUser> {
        let persisted = self.store.read_session()?;

        let payload = validate_at(&persisted.credential, self.clock.now());
        if !payload.is_valid {
            info!(uid = %persisted.subject_id, "persisted credential expired");
            self.end_remote_connection(Some(persisted.connection_history_id.as_str()))
                .await;
            self.store.clear_session();
            return None;
        }

        let user = match self.restore_user(&persisted).await {
            Ok(user) => user,
            Err(ResolveError::UserNotFound(uid)) => {
                warn!(uid = %uid, "persisted subject no longer resolves");
                self.store.clear_session();
                return None;
            }
            Err(ResolveError::Remote(e)) => {
                warn!(error = %e, "could not resolve persisted subject");
                return None;
            }
        };

        if user.is_privileged() {
            warn!(uid = %user.uid(), "privileged account in persisted session, clearing");
            self.store.clear_session();
            return None;
        }
        Some(user)
    }

    async fn restore_user(&self, persisted: &PersistedSession) -> Result<SessionUser, ResolveError> {
        if let Some(user) = &persisted.user {
            return Ok(user.clone());
        }
        let user = resolve_user(self.directory.as_ref(), &persisted.subject_id).await?;
        if !user.is_privileged()
            && let Err(e) = self.store.record_user(&user)
        {
            warn!(error = %e, "failed to cache resolved user");
        }
        Ok(user)
    }

    /// Sign in with username and password.
    ///
    /// A privileged account is refused with
    /// [`SessionError::PrivilegedRoleRejected`] and never reaches the
    /// authenticated phase.
    pub async fn login(&self, request: &LoginRequest) -> Result<SessionUser, SessionError> {
        match self.try_login(request).await {
            Ok(user) => {
                info!(uid = %user.uid(), role = %user.role(), "login succeeded");
                self.dispatch(SessionEvent::LoggedIn { user: user.clone() });
                if let Some(path) = &request.return_to {
                    self.navigator.navigate(Navigation::ReturnTo(path.clone()));
                }
                Ok(user)
            }
            Err(e) => {
                warn!(error = %e, "login failed");
                self.dispatch(SessionEvent::LoggedOut);
                Err(e)
            }
        }
    }

    async fn try_login(&self, request: &LoginRequest) -> Result<SessionUser, SessionError> {
        let grant = self.auth.login(request).await?;
        if let Err(e) = self.store.write_session(&PersistedSession::from(grant.clone())) {
            self.store.clear_session();
            return Err(e.into());
        }

        let user = match resolve_user(self.directory.as_ref(), &grant.subject_id).await {
            Ok(user) => user,
            Err(e) => {
                self.store.clear_session();
                return Err(e.into());
            }
        };

        if user.is_privileged() {
            self.store.clear_session();
            return Err(SessionError::PrivilegedRoleRejected(user.uid().to_string()));
        }

        if let Err(e) = self.store.record_user(&user) {
            self.store.clear_session();
            return Err(e.into());
        }
        Ok(user)
    }

    /// Sign out: local cleanup, then best-effort remote logout.
    ///
    /// The persisted session is cleared before the remote call is awaited, so
    /// a login committed meanwhile keeps its own persisted session.
    pub async fn logout(&self) {
        let connection = self.store.connection_history_id();
        self.store.clear_session();
        self.dispatch(SessionEvent::LoggedOut);
        info!("logged out");
        self.end_remote_connection(connection.as_deref()).await;
        self.navigator.navigate(Navigation::Login { return_to: None });
    }

    /// Re-check the persisted credential of an authenticated session.
    ///
    /// Acts only on the committed state; repeated failing checks log out once.
    pub async fn revalidate(&self) -> Revalidation {
        if !self.current().is_authenticated() {
            return Revalidation::Idle;
        }
        let now = self.clock.now();
        let valid = self
            .store
            .read_session()
            .is_some_and(|p| validate_at(&p.credential, now).is_valid);
        if valid {
            return Revalidation::Valid;
        }
        if self.force_logout().await {
            Revalidation::LoggedOut
        } else {
            Revalidation::Idle
        }
    }

    /// Log out an authenticated session without user action.
    ///
    /// Returns `false` if the session was not authenticated when checked.
    async fn force_logout(&self) -> bool {
        let connection = self.store.connection_history_id();
        if self
            .dispatch_if(Session::is_authenticated, SessionEvent::LoggedOut)
            .is_none()
        {
            return false;
        }
        self.store.clear_session();
        info!("credential expired, forcing logout");

        self.end_remote_connection(connection.as_deref()).await;
        self.navigator.navigate(Navigation::Login { return_to: None });
        true
    }

    async fn end_remote_connection(&self, connection_history_id: Option<&str>) {
        let Some(id) = connection_history_id else {
            debug!("no connection history id, skipping remote logout");
            return;
        };
        if let Err(e) = self.auth.logout(id).await {
            warn!(connection_history_id = id, error = %e, "remote logout failed");
        }
    }
}
