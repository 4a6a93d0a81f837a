/// Token authentication and role checks for protected operations
///
/// [`AuthGuard::authenticate`] turns a bearer token into an [`Identity`]. Tokens
/// are stateless and cannot be revoked, so the guard re-reads the user on every
/// call: a token that outlives its user is rejected with
/// [`AuthError::UserNotFound`].
///
/// Role checks are per organization. An admin of one organization has no
/// special rights in another.
///
/// # Example
///
/// ```no_run
/// use volunteer_shared::auth::guard::AuthGuard;
/// use volunteer_shared::models::role::PermissionLevel;
///
/// # async fn example(guard: AuthGuard, token: &str) -> Result<(), Box<dyn std::error::Error>> {
/// let identity = guard.authenticate(token).await?;
/// guard
///     .require_role(&identity, 42, &[PermissionLevel::Admin])
///     .await?;
/// # Ok(())
/// # }
/// ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{
    error::AuthError,
    jwt::{TokenPurpose, TokenService},
};
use crate::{
    models::{
        organization::OrganizationId,
        role::PermissionLevel,
        user::{User, UserId},
    },
    store::{CredentialStore, RoleStore, Store},
};

/// The authenticated caller, as read from the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<User> for Identity {
    fn from(user: User) -> Self {
        Self {
            user_id: user.user_id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
        }
    }
}

/// Resolves access tokens and enforces organization roles
#[derive(Clone)]
pub struct AuthGuard {
    store: Arc<dyn Store>,
    tokens: Arc<TokenService>,
}

impl std::fmt::Debug for AuthGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthGuard")
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}

impl AuthGuard {
    pub fn new(store: Arc<dyn Store>, tokens: Arc<TokenService>) -> Self {
        Self { store, tokens }
    }

    /// Verifies an access token and loads its user
    ///
    /// # Errors
    ///
    /// - `InvalidOrExpiredToken` for a bad signature, malformed token or expiry
    /// - `WrongTokenPurpose` for a password reset token
    /// - `UserNotFound` if the subject was deleted after issuance
    pub async fn authenticate(&self, token: &str) -> Result<Identity, AuthError> {
        let claims = self.tokens.verify_purpose(token, TokenPurpose::Access)?;
        let user_id = claims.user_id()?;

        match self.store.find_by_id(user_id).await? {
            Some(user) => Ok(user.into()),
            None => {
                tracing::debug!(user_id, "Token subject no longer exists");
                Err(AuthError::UserNotFound)
            }
        }
    }

    /// Requires the caller to hold one of `allowed` in the organization
    ///
    /// Returns the caller's level on success and `Forbidden` if they have no
    /// role there or a level outside `allowed`.
    pub async fn require_role(
        &self,
        identity: &Identity,
        organization_id: OrganizationId,
        allowed: &[PermissionLevel],
    ) -> Result<PermissionLevel, AuthError> {
        let level = self
            .store
            .get_role(identity.user_id, organization_id)
            .await?;

        match level {
            Some(level) if allowed.contains(&level) => Ok(level),
            other => {
                tracing::debug!(
                    user_id = identity.user_id,
                    organization_id,
                    level = ?other,
                    "Role check denied"
                );
                Err(AuthError::Forbidden)
            }
        }
    }

    /// Passes when the caller acts on themself, else falls back to `require_role`
    pub async fn require_self_or_role(
        &self,
        identity: &Identity,
        target_user_id: UserId,
        organization_id: OrganizationId,
        allowed: &[PermissionLevel],
    ) -> Result<(), AuthError> {
        if identity.user_id == target_user_id {
            return Ok(());
        }

        self.require_role(identity, organization_id, allowed)
            .await
            .map(|_| ())
    }
}
