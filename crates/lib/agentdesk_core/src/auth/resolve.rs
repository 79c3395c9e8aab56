// @awa-component: AUTH-RoleResolution
//
//! Role resolution chain: which user category a subject id belongs to.
//!
//! Strategies are tried in [`RESOLUTION_ORDER`]. Only a not-found answer
//! moves on to the next strategy; any other failure aborts the chain so a
//! network problem is never reported as an unknown user.

use thiserror::Error;
use tracing::debug;

use super::RemoteError;
use super::remote::UserDirectory;
use crate::models::auth::SessionUser;

/// One typed lookup in the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupStrategy {
    Admin,
    Collaborator,
}

/// Admin first, then collaborator.
pub const RESOLUTION_ORDER: [LookupStrategy; 2] =
    [LookupStrategy::Admin, LookupStrategy::Collaborator];

impl LookupStrategy {
    async fn lookup<D>(self, directory: &D, uid: &str) -> Result<SessionUser, RemoteError>
    where
        D: UserDirectory + ?Sized,
    {
        match self {
            LookupStrategy::Admin => directory.admin_by_uid(uid).await.map(SessionUser::Admin),
            LookupStrategy::Collaborator => directory
                .collaborator_by_uid(uid)
                .await
                .map(SessionUser::Collaborator),
        }
    }
}

/// Resolution failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// Every strategy answered not-found.
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// A lookup failed for a reason other than not-found.
    #[error(transparent)]
    Remote(RemoteError),
}

/// Resolve `uid` to a session user.
///
/// A privileged user is returned like any other; refusing it is the
/// caller's decision.
pub async fn resolve_user<D>(directory: &D, uid: &str) -> Result<SessionUser, ResolveError>
where
    D: UserDirectory + ?Sized,
{
    for strategy in RESOLUTION_ORDER {
        match strategy.lookup(directory, uid).await {
            Ok(user) => {
                debug!(uid, ?strategy, role = %user.role(), "resolved user");
                return Ok(user);
            }
            Err(RemoteError::NotFound(_)) => {
                debug!(uid, ?strategy, "not found, trying next strategy");
            }
            Err(e) => return Err(ResolveError::Remote(e)),
        }
    }
    Err(ResolveError::UserNotFound(uid.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::Role;
    use crate::testing::FakeDirectory;

    #[tokio::test]
    async fn admin_lookup_wins_first() {
        let dir = FakeDirectory::new().with_admin("u0", Role::Admin);
        let user = resolve_user(&dir, "u0").await.unwrap();
        assert!(matches!(user, SessionUser::Admin(_)));
        assert_eq!(dir.collaborator_calls(), 0);
    }

    #[tokio::test]
    async fn falls_back_to_collaborator_on_not_found() {
        let dir = FakeDirectory::new().with_collaborator("u1");
        let user = resolve_user(&dir, "u1").await.unwrap();
        assert!(matches!(user, SessionUser::Collaborator(_)));
        assert_eq!(user.uid(), "u1");
        assert_eq!(dir.admin_calls(), 1);
        assert_eq!(dir.collaborator_calls(), 1);
    }

    #[tokio::test]
    async fn both_not_found_is_user_not_found() {
        let dir = FakeDirectory::new();
        let err = resolve_user(&dir, "u2").await.unwrap_err();
        assert_eq!(err, ResolveError::UserNotFound("u2".into()));
    }

    #[tokio::test]
    async fn transport_failure_aborts_the_chain() {
        let dir = FakeDirectory::new()
            .with_collaborator("u3")
            .with_admin_failure(RemoteError::Transport("connection reset".into()));
        let err = resolve_user(&dir, "u3").await.unwrap_err();
        assert_eq!(
            err,
            ResolveError::Remote(RemoteError::Transport("connection reset".into()))
        );
        assert_eq!(dir.collaborator_calls(), 0);
    }

    #[tokio::test]
    async fn privileged_user_is_resolved_not_rejected() {
        let dir = FakeDirectory::new().with_admin("root", Role::SuperAdmin);
        let user = resolve_user(&dir, "root").await.unwrap();
        assert!(user.is_privileged());
    }
}
