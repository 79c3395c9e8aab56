//! Route gating on the committed session.
//!
//! Gated content must not render until `initialize` has settled; the guard
//! answers `Wait` until then.

use url::form_urlencoded;

use super::machine::Session;

/// Path of the login screen.
pub const LOGIN_PATH: &str = "/login";

/// Landing path after login when no return path was requested.
pub const DEFAULT_RETURN_PATH: &str = "/dashboard";

/// Navigation requested by the session lifecycle. Routing itself belongs to
/// the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// Go to the login screen, optionally remembering where to come back to.
    Login { return_to: Option<String> },
    /// Go to a previously requested path.
    ReturnTo(String),
}

impl Navigation {
    /// Concrete path for hosts with URL routing.
    pub fn path(&self) -> String {
        match self {
            Navigation::Login { return_to: None } => LOGIN_PATH.to_string(),
            Navigation::Login {
                return_to: Some(path),
            } => {
                let query = form_urlencoded::Serializer::new(String::new())
                    .append_pair("returnTo", path)
                    .finish();
                format!("{LOGIN_PATH}?{query}")
            }
            Navigation::ReturnTo(path) => path.clone(),
        }
    }
}

/// Receives navigation requests.
pub trait Navigator: Send + Sync {
    fn navigate(&self, to: Navigation);
}

/// Navigator that only logs the request.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate(&self, to: Navigation) {
        tracing::info!(path = %to.path(), "navigation requested");
    }
}

/// Which sessions a route admits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    /// Requires an authenticated session.
    Protected,
    /// Only for signed-out users (login page).
    GuestOnly,
    Public,
}

/// Outcome of [`guard_route`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    /// `initialize` has not settled yet.
    Wait,
    Allow,
    Redirect(Navigation),
}

/// Decide whether `requested_path` may render for `session`.
///
/// `return_to` is the path a guest-only route should send an authenticated
/// user back to.
pub fn guard_route(
    session: &Session,
    kind: RouteKind,
    requested_path: &str,
    return_to: Option<&str>,
) -> GuardOutcome {
    if kind == RouteKind::Public {
        return GuardOutcome::Allow;
    }
    if !session.is_settled() {
        return GuardOutcome::Wait;
    }
    match (kind, session.is_authenticated()) {
        (RouteKind::Protected, true) | (RouteKind::GuestOnly, false) => GuardOutcome::Allow,
        (RouteKind::Protected, false) => GuardOutcome::Redirect(Navigation::Login {
            return_to: Some(requested_path.to_string()),
        }),
        (RouteKind::GuestOnly, true) => GuardOutcome::Redirect(Navigation::ReturnTo(
            return_to.unwrap_or(DEFAULT_RETURN_PATH).to_string(),
        )),
        (RouteKind::Public, _) => GuardOutcome::Allow,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::{CollaboratorUser, Role, SessionUser};
    use crate::session::machine::{SessionEvent, apply_transition};

    fn authenticated() -> Session {
        apply_transition(
            &Session::default(),
            SessionEvent::LoggedIn {
                user: SessionUser::Collaborator(CollaboratorUser {
                    uid: "c1".into(),
                    role: Role::Collaborator,
                    email: "c1@example.com".into(),
                    first_name: None,
                    last_name: None,
                    admin_uid: None,
                    products: vec![],
                }),
            },
        )
    }

    fn signed_out() -> Session {
        apply_transition(&Session::default(), SessionEvent::LoggedOut)
    }

    #[test]
    fn unsettled_session_waits() {
        let loading = apply_transition(&Session::default(), SessionEvent::Loading);
        for s in [Session::default(), loading] {
            assert_eq!(
                guard_route(&s, RouteKind::Protected, "/seo", None),
                GuardOutcome::Wait
            );
        }
    }

    #[test]
    fn protected_route_redirects_guest_with_return_path() {
        assert_eq!(
            guard_route(&signed_out(), RouteKind::Protected, "/legal/faq", None),
            GuardOutcome::Redirect(Navigation::Login {
                return_to: Some("/legal/faq".into())
            })
        );
        assert_eq!(
            guard_route(&authenticated(), RouteKind::Protected, "/legal/faq", None),
            GuardOutcome::Allow
        );
    }

    #[test]
    fn guest_only_route_sends_user_back() {
        assert_eq!(
            guard_route(&authenticated(), RouteKind::GuestOnly, LOGIN_PATH, Some("/seo")),
            GuardOutcome::Redirect(Navigation::ReturnTo("/seo".into()))
        );
        assert_eq!(
            guard_route(&authenticated(), RouteKind::GuestOnly, LOGIN_PATH, None),
            GuardOutcome::Redirect(Navigation::ReturnTo(DEFAULT_RETURN_PATH.into()))
        );
        assert_eq!(
            guard_route(&signed_out(), RouteKind::GuestOnly, LOGIN_PATH, None),
            GuardOutcome::Allow
        );
    }

    #[test]
    fn login_navigation_path_carries_return_to() {
        let nav = Navigation::Login {
            return_to: Some("/support".into()),
        };
        assert_eq!(nav.path(), "/login?returnTo=%2Fsupport");
        assert_eq!(Navigation::Login { return_to: None }.path(), "/login");
    }

    #[test]
    fn login_navigation_path_encodes_query_characters() {
        let nav = Navigation::Login {
            return_to: Some("/seo?tab=a&b=c#top".into()),
        };
        assert_eq!(nav.path(), "/login?returnTo=%2Fseo%3Ftab%3Da%26b%3Dc%23top");
        assert!(
            url::Url::parse("http://host")
                .unwrap()
                .join(&nav.path())
                .unwrap()
                .query_pairs()
                .any(|(k, v)| k == "returnTo" && v == "/seo?tab=a&b=c#top")
        );
    }
}
