// @awa-component: SESS-StateMachine
//
//! Session state and its pure transition function.

use serde::Serialize;

use crate::models::auth::SessionUser;

/// Lifecycle phase of the in-memory session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionPhase {
    Uninitialized,
    Loading,
    Authenticated,
    Unauthenticated,
}

/// In-memory session.
///
/// Only reachable through [`apply_transition`], so `Authenticated` always
/// carries a non-privileged user and every other phase carries none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    phase: SessionPhase,
    user: Option<SessionUser>,
}

impl Session {
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn user(&self) -> Option<&SessionUser> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.phase == SessionPhase::Authenticated
    }

    pub fn is_loading(&self) -> bool {
        self.phase == SessionPhase::Loading
    }

    /// Whether `initialize` has settled at least once.
    pub fn is_settled(&self) -> bool {
        matches!(
            self.phase,
            SessionPhase::Authenticated | SessionPhase::Unauthenticated
        )
    }

    fn unauthenticated() -> Self {
        Self {
            phase: SessionPhase::Unauthenticated,
            user: None,
        }
    }

    fn authenticated_as(user: Option<SessionUser>) -> Self {
        match user {
            Some(user) if !user.is_privileged() => Self {
                phase: SessionPhase::Authenticated,
                user: Some(user),
            },
            _ => Self::unauthenticated(),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self {
            phase: SessionPhase::Uninitialized,
            user: None,
        }
    }
}

/// Events accepted by the reducer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// `initialize` started.
    Loading,
    /// `initialize` settled, with the restored user if any.
    Initialized { user: Option<SessionUser> },
    LoggedIn { user: SessionUser },
    LoggedOut,
}

impl SessionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::Loading => "loading",
            SessionEvent::Initialized { .. } => "initialized",
            SessionEvent::LoggedIn { .. } => "logged_in",
            SessionEvent::LoggedOut => "logged_out",
        }
    }
}

/// Compute the next session from the current one.
///
/// A privileged user never produces an authenticated session, whichever
/// event carries it. `Initialized` only settles a `Loading` session: a login
/// or logout committed while `initialize` was in flight wins.
pub fn apply_transition(state: &Session, event: SessionEvent) -> Session {
    match event {
        SessionEvent::Loading => Session {
            phase: SessionPhase::Loading,
            user: None,
        },
        SessionEvent::Initialized { user } if state.is_loading() => {
            Session::authenticated_as(user)
        }
        SessionEvent::Initialized { .. } => state.clone(),
        SessionEvent::LoggedIn { user } => Session::authenticated_as(Some(user)),
        SessionEvent::LoggedOut => Session::unauthenticated(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::{AdminUser, CollaboratorUser, Role};

    fn admin(role: Role) -> SessionUser {
        SessionUser::Admin(AdminUser {
            uid: "a1".into(),
            role,
            email: "a1@example.com".into(),
            first_name: None,
            last_name: None,
            company_name: None,
            products: vec![],
        })
    }

    fn collaborator() -> SessionUser {
        SessionUser::Collaborator(CollaboratorUser {
            uid: "c1".into(),
            role: Role::Collaborator,
            email: "c1@example.com".into(),
            first_name: None,
            last_name: None,
            admin_uid: None,
            products: vec![],
        })
    }

    #[test]
    fn starts_uninitialized() {
        let s = Session::default();
        assert_eq!(s.phase(), SessionPhase::Uninitialized);
        assert!(!s.is_authenticated());
        assert!(!s.is_loading());
        assert!(s.user().is_none());
    }

    #[test]
    fn initialize_without_user_is_unauthenticated() {
        let loading = apply_transition(&Session::default(), SessionEvent::Loading);
        assert!(loading.is_loading());
        let s = apply_transition(&loading, SessionEvent::Initialized { user: None });
        assert_eq!(s.phase(), SessionPhase::Unauthenticated);
        assert!(!s.is_loading());
    }

    #[test]
    fn initialize_with_user_is_authenticated() {
        let loading = apply_transition(&Session::default(), SessionEvent::Loading);
        let s = apply_transition(
            &loading,
            SessionEvent::Initialized {
                user: Some(collaborator()),
            },
        );
        assert!(s.is_authenticated());
        assert_eq!(s.user().map(|u| u.uid()), Some("c1"));
    }

    #[test]
    fn privileged_user_never_authenticates() {
        let s = apply_transition(
            &Session::default(),
            SessionEvent::LoggedIn {
                user: admin(Role::SuperAdmin),
            },
        );
        assert_eq!(s.phase(), SessionPhase::Unauthenticated);
        assert!(s.user().is_none());

        let loading = apply_transition(&Session::default(), SessionEvent::Loading);
        let s = apply_transition(
            &loading,
            SessionEvent::Initialized {
                user: Some(admin(Role::SuperAdmin)),
            },
        );
        assert!(!s.is_authenticated());
        assert!(!s.is_loading());
    }

    #[test]
    fn late_initialize_does_not_override_committed_login() {
        let loading = apply_transition(&Session::default(), SessionEvent::Loading);
        let authed = apply_transition(
            &loading,
            SessionEvent::LoggedIn {
                user: collaborator(),
            },
        );
        let s = apply_transition(&authed, SessionEvent::Initialized { user: None });
        assert_eq!(s, authed);
    }

    #[test]
    fn logout_clears_user_from_any_phase() {
        let authed = apply_transition(
            &Session::default(),
            SessionEvent::LoggedIn {
                user: admin(Role::Admin),
            },
        );
        assert!(authed.is_authenticated());
        let out = apply_transition(&authed, SessionEvent::LoggedOut);
        assert_eq!(out.phase(), SessionPhase::Unauthenticated);
        assert!(out.user().is_none());
        assert_eq!(apply_transition(&out, SessionEvent::LoggedOut), out);
    }
}
