/// Signup, login, password reset and account deletion
///
/// [`AuthService`] ties the hasher, the token service and the store together.
/// It keeps no per-request state; one instance is built at startup and shared.
///
/// Failures that could reveal whether an account exists are flattened:
///
/// - login reports [`AuthError::InvalidCredentials`] for an unknown email, a
///   missing credential and a wrong password alike, and spends the same hashing
///   effort in each case
/// - a reset request succeeds whether or not the email is registered
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use volunteer_shared::auth::{
///     flow::AuthService, jwt::TokenService, notifier::LogNotifier,
///     password::{HashParams, PasswordHasher},
/// };
/// use volunteer_shared::models::user::NewUser;
/// use volunteer_shared::store::MemoryStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let auth = AuthService::new(
///     Arc::new(MemoryStore::new()),
///     Arc::new(TokenService::new("a-secret-of-at-least-thirty-two-bytes")),
///     PasswordHasher::new(HashParams::default())?,
///     Arc::new(LogNotifier),
/// )?;
///
/// auth.signup(
///     NewUser {
///         email: "ada@example.com".to_string(),
///         first_name: "Ada".to_string(),
///         last_name: "Lovelace".to_string(),
///     },
///     "correct horse".to_string(),
/// )
/// .await?;
///
/// let token = auth.login("ada@example.com", "correct horse".to_string()).await?;
/// # Ok(())
/// # }
/// ```

use std::sync::Arc;

use super::{
    error::AuthError,
    guard::Identity,
    jwt::{TokenPurpose, TokenService},
    notifier::ResetNotifier,
    password::{PasswordError, PasswordHasher},
};
use crate::{
    models::user::{NewUser, User},
    store::{CredentialStore, Store, StoreError},
};

/// Orchestrates the credential lifecycle
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn Store>,
    tokens: Arc<TokenService>,
    hasher: PasswordHasher,
    notifier: Arc<dyn ResetNotifier>,
    /// Verified against when there is no real digest, to keep timing uniform
    dummy_digest: String,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("tokens", &self.tokens)
            .field("hasher", &self.hasher)
            .finish_non_exhaustive()
    }
}

impl AuthService {
    /// Builds the service, hashing a throwaway password for timing cover
    pub fn new(
        store: Arc<dyn Store>,
        tokens: Arc<TokenService>,
        hasher: PasswordHasher,
        notifier: Arc<dyn ResetNotifier>,
    ) -> Result<Self, PasswordError> {
        let dummy_digest = hasher.hash("volunteer-hub-timing-cover")?;

        Ok(Self {
            store,
            tokens,
            hasher,
            notifier,
            dummy_digest,
        })
    }

    /// Gets the token service used for issuance
    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Registers a user and stores the hash of their password
    ///
    /// # Errors
    ///
    /// `DuplicateEmail` if the email is taken, including when a concurrent
    /// signup wins the race between the check and the insert.
    pub async fn signup(&self, user: NewUser, password: String) -> Result<User, AuthError> {
        if self.store.find_by_email(&user.email).await?.is_some() {
            tracing::debug!("Signup rejected: email already registered");
            return Err(AuthError::DuplicateEmail);
        }

        let digest = self.hasher.hash_async(password).await?;

        let created = self.store.insert(&user, &digest).await.map_err(|e| match e {
            StoreError::DuplicateEmail => AuthError::DuplicateEmail,
            other => AuthError::Store(other),
        })?;

        tracing::info!(user_id = created.user_id, "User signed up");
        Ok(created)
    }

    /// Checks credentials and issues an access token
    ///
    /// Every failure is `InvalidCredentials`.
    pub async fn login(&self, email: &str, password: String) -> Result<String, AuthError> {
        let user = self.store.find_by_email(email).await?;

        let digest = match &user {
            Some(user) => self.store.get_hash(user.user_id).await?,
            None => None,
        };

        let (digest, known) = match digest {
            Some(digest) => (digest, true),
            None => (self.dummy_digest.clone(), false),
        };

        let verified = self.hasher.verify_async(password, digest).await?;

        match user {
            Some(user) if known && verified => {
                let token = self.tokens.issue(user.user_id, TokenPurpose::Access)?;
                tracing::info!(user_id = user.user_id, "User logged in");
                Ok(token)
            }
            _ => {
                tracing::debug!("Login rejected");
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    /// Starts a password reset
    ///
    /// Returns `Ok(())` whether or not the email is registered. For a known
    /// email a reset token is minted and handed to the notifier on a spawned
    /// task, so a slow notifier does not make known emails answer slower than
    /// unknown ones. Issuance and delivery failures are logged, not returned.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), AuthError> {
        let Some(user) = self.store.find_by_email(email).await? else {
            tracing::debug!("Password reset requested for unknown email");
            return Ok(());
        };

        let token = match self.tokens.issue(user.user_id, TokenPurpose::PasswordReset) {
            Ok(token) => token,
            Err(e) => {
                tracing::error!(user_id = user.user_id, error = %e, "Failed to issue reset token");
                return Ok(());
            }
        };

        let notifier = self.notifier.clone();
        tokio::spawn(async move {
            if let Err(e) = notifier.deliver(&user.email, &token).await {
                tracing::error!(user_id = user.user_id, error = %e, "Failed to deliver reset token");
            }
        });

        Ok(())
    }

    /// Sets a new password using a reset token
    ///
    /// # Errors
    ///
    /// - `InvalidOrExpiredToken` for a bad or expired token
    /// - `WrongTokenPurpose` for an access token
    /// - `UserNotFound` if the user was deleted after the token was issued
    pub async fn reset_password(&self, token: &str, new_password: String) -> Result<(), AuthError> {
        let claims = self
            .tokens
            .verify_purpose(token, TokenPurpose::PasswordReset)?;
        let user_id = claims.user_id()?;

        let digest = self.hasher.hash_async(new_password).await?;

        if self.store.replace_hash(user_id, &digest).await? == 0 {
            tracing::debug!(user_id, "Reset token subject no longer exists");
            return Err(AuthError::UserNotFound);
        }

        tracing::info!(user_id, "Password reset");
        Ok(())
    }

    /// Deletes the caller's credential and user record
    ///
    /// # Errors
    ///
    /// `Store(Restricted)` if the user created an organization; `UserNotFound`
    /// if the record is already gone.
    pub async fn delete_account(&self, identity: &Identity) -> Result<(), AuthError> {
        if !self
            .store
            .delete_user_and_credential(identity.user_id)
            .await?
        {
            return Err(AuthError::UserNotFound);
        }

        tracing::info!(user_id = identity.user_id, "Account deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{
        guard::AuthGuard,
        notifier::NotifyError,
        password::HashParams,
    };
    use crate::models::organization::NewOrganization;
    use crate::store::{MemoryStore, RoleStore};
    use async_trait::async_trait;
    use chrono::Duration;
    use tokio::sync::Mutex;

    const SECRET: &str = "flow-test-secret-at-least-32-bytes!!";

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl ResetNotifier for RecordingNotifier {
        async fn deliver(&self, email: &str, token: &str) -> Result<(), NotifyError> {
            self.sent
                .lock()
                .await
                .push((email.to_string(), token.to_string()));
            Ok(())
        }
    }

    impl RecordingNotifier {
        /// Waits for the spawned delivery task to report in
        async fn delivered(&self) -> Vec<(String, String)> {
            for _ in 0..50 {
                let sent = self.sent.lock().await.clone();
                if !sent.is_empty() {
                    return sent;
                }
                tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            }
            Vec::new()
        }
    }

    struct FailingNotifier;

    struct StalledNotifier;

    #[async_trait]
    impl ResetNotifier for StalledNotifier {
        async fn deliver(&self, _email: &str, _token: &str) -> Result<(), NotifyError> {
            tokio::time::sleep(std::time::Duration::from_secs(60)).await;
            Ok(())
        }
    }

    #[async_trait]
    impl ResetNotifier for FailingNotifier {
        async fn deliver(&self, _email: &str, _token: &str) -> Result<(), NotifyError> {
            Err(NotifyError("smtp down".to_string()))
        }
    }

    struct Fixture {
        store: Arc<MemoryStore>,
        tokens: Arc<TokenService>,
        notifier: Arc<RecordingNotifier>,
        auth: AuthService,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let tokens = Arc::new(TokenService::new(SECRET));
        let notifier = Arc::new(RecordingNotifier::default());
        let hasher = PasswordHasher::new(HashParams {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap();
        let auth = AuthService::new(store.clone(), tokens.clone(), hasher, notifier.clone()).unwrap();

        Fixture {
            store,
            tokens,
            notifier,
            auth,
        }
    }

    fn ada() -> NewUser {
        NewUser {
            email: "ada@example.com".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
        }
    }

    #[tokio::test]
    async fn test_signup_stores_hash_not_plaintext() {
        let f = fixture();
        let user = f.auth.signup(ada(), "pw1".to_string()).await.unwrap();

        assert_eq!(user.email, "ada@example.com");
        let digest = f.store.get_hash(user.user_id).await.unwrap().unwrap();
        assert_ne!(digest, "pw1");
        assert!(digest.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn test_signup_duplicate_email() {
        let f = fixture();
        f.auth.signup(ada(), "pw1".to_string()).await.unwrap();

        let err = f.auth.signup(ada(), "pw2".to_string()).await.unwrap_err();
        assert!(matches!(err, AuthError::DuplicateEmail));
    }

    #[tokio::test]
    async fn test_login_issues_token_for_user() {
        let f = fixture();
        let user = f.auth.signup(ada(), "pw1".to_string()).await.unwrap();

        let token = f.auth.login("ada@example.com", "pw1".to_string()).await.unwrap();
        let claims = f.tokens.verify_purpose(&token, TokenPurpose::Access).unwrap();
        assert_eq!(claims.user_id().unwrap(), user.user_id);
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let f = fixture();
        f.auth.signup(ada(), "pw1".to_string()).await.unwrap();

        let wrong_password = f
            .auth
            .login("ada@example.com", "wrong".to_string())
            .await
            .unwrap_err();
        let unknown_email = f
            .auth
            .login("nobody@example.com", "pw1".to_string())
            .await
            .unwrap_err();

        assert!(matches!(wrong_password, AuthError::InvalidCredentials));
        assert!(matches!(unknown_email, AuthError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    }

    #[tokio::test]
    async fn test_request_reset_unknown_email_is_silent() {
        let f = fixture();

        f.auth.request_password_reset("nobody@example.com").await.unwrap();
        assert!(f.notifier.delivered().await.is_empty());
    }

    #[tokio::test]
    async fn test_reset_password_roundtrip() {
        let f = fixture();
        f.auth.signup(ada(), "old".to_string()).await.unwrap();

        f.auth.request_password_reset("ada@example.com").await.unwrap();
        let (email, token) = f.notifier.delivered().await[0].clone();
        assert_eq!(email, "ada@example.com");

        f.auth.reset_password(&token, "new".to_string()).await.unwrap();

        assert!(matches!(
            f.auth.login("ada@example.com", "old".to_string()).await.unwrap_err(),
            AuthError::InvalidCredentials
        ));
        assert!(f.auth.login("ada@example.com", "new".to_string()).await.is_ok());
    }

    #[tokio::test]
    async fn test_reset_password_rejects_access_token() {
        let f = fixture();
        let user = f.auth.signup(ada(), "pw1".to_string()).await.unwrap();
        let access = f.tokens.issue(user.user_id, TokenPurpose::Access).unwrap();

        let err = f.auth.reset_password(&access, "new".to_string()).await.unwrap_err();
        assert!(matches!(err, AuthError::WrongTokenPurpose));
    }

    #[tokio::test]
    async fn test_reset_password_rejects_expired_token() {
        let f = fixture();
        let user = f.auth.signup(ada(), "pw1".to_string()).await.unwrap();
        let expired = f
            .tokens
            .issue_with_ttl(user.user_id, TokenPurpose::PasswordReset, Duration::seconds(-5))
            .unwrap();

        let err = f.auth.reset_password(&expired, "new".to_string()).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidOrExpiredToken));
    }

    #[tokio::test]
    async fn test_reset_password_for_deleted_user() {
        let f = fixture();
        let user = f.auth.signup(ada(), "pw1".to_string()).await.unwrap();
        let token = f.tokens.issue(user.user_id, TokenPurpose::PasswordReset).unwrap();

        f.auth.delete_account(&user.into()).await.unwrap();

        let err = f.auth.reset_password(&token, "new".to_string()).await.unwrap_err();
        assert!(matches!(err, AuthError::UserNotFound));
    }

    #[tokio::test]
    async fn test_notifier_failure_does_not_surface() {
        let store = Arc::new(MemoryStore::new());
        let hasher = PasswordHasher::new(HashParams {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap();
        let auth = AuthService::new(
            store,
            Arc::new(TokenService::new(SECRET)),
            hasher,
            Arc::new(FailingNotifier),
        )
        .unwrap();
        auth.signup(ada(), "pw1".to_string()).await.unwrap();

        assert!(auth.request_password_reset("ada@example.com").await.is_ok());
    }

    #[tokio::test]
    async fn test_request_reset_does_not_wait_for_delivery() {
        let hasher = PasswordHasher::new(HashParams {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap();
        let auth = AuthService::new(
            Arc::new(MemoryStore::new()),
            Arc::new(TokenService::new(SECRET)),
            hasher,
            Arc::new(StalledNotifier),
        )
        .unwrap();
        auth.signup(ada(), "pw1".to_string()).await.unwrap();

        let answered = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            auth.request_password_reset("ada@example.com"),
        )
        .await;
        assert!(matches!(answered, Ok(Ok(()))));
    }

    #[tokio::test]
    async fn test_delete_account_invalidates_token() {
        let f = fixture();
        f.auth.signup(ada(), "pw1".to_string()).await.unwrap();
        let token = f.auth.login("ada@example.com", "pw1".to_string()).await.unwrap();

        let guard = AuthGuard::new(f.store.clone(), f.tokens.clone());
        let identity = guard.authenticate(&token).await.unwrap();

        f.auth.delete_account(&identity).await.unwrap();

        assert!(matches!(
            guard.authenticate(&token).await.unwrap_err(),
            AuthError::UserNotFound
        ));
        assert!(matches!(
            f.auth.login("ada@example.com", "pw1".to_string()).await.unwrap_err(),
            AuthError::InvalidCredentials
        ));
    }

    #[tokio::test]
    async fn test_delete_account_refused_for_organization_creator() {
        let f = fixture();
        let user = f.auth.signup(ada(), "pw1".to_string()).await.unwrap();
        f.store
            .create_organization(&NewOrganization {
                name: "Analytical Society".to_string(),
                description: None,
                created_by_user_id: user.user_id,
            })
            .await
            .unwrap();

        let err = f.auth.delete_account(&user.clone().into()).await.unwrap_err();
        assert!(matches!(err, AuthError::Store(StoreError::Restricted(_))));
        assert!(f.store.find_by_id(user.user_id).await.unwrap().is_some());
    }
}
