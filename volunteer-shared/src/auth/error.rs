/// Error taxonomy for authentication and authorization
///
/// The first six variants are expected outcomes of user input and are reported
/// to callers with a stable message. The wrapped variants are infrastructure
/// failures that surface as a generic server error.

use super::{jwt::TokenError, password::PasswordError};
use crate::store::StoreError;

/// Error type for the auth flows and the guard
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Signup with an email that is already registered
    #[error("A user with this email already exists")]
    DuplicateEmail,

    /// Login failed; never says which check failed
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Bad signature, malformed token or past expiry
    #[error("Invalid or expired token")]
    InvalidOrExpiredToken,

    /// Token was minted for a different purpose
    #[error("Invalid token purpose")]
    WrongTokenPurpose,

    /// Token subject no longer exists
    #[error("User not found")]
    UserNotFound,

    /// Authenticated but lacking the required role
    #[error("Forbidden")]
    Forbidden,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    /// Failure to mint a token
    #[error(transparent)]
    Token(TokenError),
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired | TokenError::Invalid(_) => AuthError::InvalidOrExpiredToken,
            TokenError::WrongPurpose { .. } => AuthError::WrongTokenPurpose,
            TokenError::CreateError(_) => AuthError::Token(err),
        }
    }
}

impl AuthError {
    /// True for failures caused by the caller rather than the system
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            AuthError::Store(_) | AuthError::Password(_) | AuthError::Token(_)
        )
    }
}
