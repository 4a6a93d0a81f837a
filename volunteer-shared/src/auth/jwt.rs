/// JWT token issuance and validation
///
/// Tokens are stateless: they are signed with HS256 (HMAC-SHA256) using a
/// server-held secret and carry everything needed to validate them. Nothing is
/// persisted, so a token stays valid for its whole lifetime regardless of what
/// happens to the account afterwards. Consumers that care about the account
/// still existing must re-check it (see [`crate::auth::guard`]).
///
/// # Purposes
///
/// Every token carries a `purpose` claim:
///
/// - **access** (30 minutes by default): authenticates API requests
/// - **password_reset** (15 minutes by default): authorizes one password change
///
/// A consumer must check the purpose explicitly via
/// [`TokenService::verify_purpose`]; a reset token is never an access token and
/// vice versa.
///
/// # Example
///
/// ```
/// use volunteer_shared::auth::jwt::{TokenPurpose, TokenService};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let tokens = TokenService::new("test-secret-key-at-least-32-bytes-long");
///
/// let token = tokens.issue(42, TokenPurpose::Access)?;
/// let claims = tokens.verify_purpose(&token, TokenPurpose::Access)?;
/// assert_eq!(claims.user_id()?, 42);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};

use crate::models::user::UserId;

/// Issuer written into every token unless overridden
pub const DEFAULT_ISSUER: &str = "volunteer-hub";

/// Error type for token operations
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// Failed to sign a token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Token lifetime has passed
    #[error("Token has expired")]
    Expired,

    /// Signature, format, issuer or claims are not acceptable
    #[error("Invalid token: {0}")]
    Invalid(String),

    /// Token is valid but was minted for something else
    #[error("Wrong token purpose: expected {expected:?}, got {actual:?}")]
    WrongPurpose {
        expected: TokenPurpose,
        actual: TokenPurpose,
    },
}

/// What a token may be used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenPurpose {
    /// Authenticates API requests
    Access,

    /// Authorizes a single password reset
    PasswordReset,
}

impl TokenPurpose {
    /// Gets the purpose as it appears in the claims
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenPurpose::Access => "access",
            TokenPurpose::PasswordReset => "password_reset",
        }
    }
}

/// JWT claims
///
/// # Standard Claims
///
/// - `sub`: Subject (user ID, stringified as JWT requires)
/// - `iss`: Issuer
/// - `iat`: Issued at timestamp
/// - `nbf`: Not before timestamp
/// - `exp`: Expiration timestamp
///
/// # Custom Claims
///
/// - `purpose`: access or password_reset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - user ID
    pub sub: String,

    /// Issuer
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Token purpose (custom claim)
    pub purpose: TokenPurpose,
}

impl Claims {
    /// Parses the subject back into a user ID
    pub fn user_id(&self) -> Result<UserId, TokenError> {
        self.sub
            .parse::<UserId>()
            .map_err(|_| TokenError::Invalid("subject is not a user id".to_string()))
    }
}

/// Signs and verifies tokens with a symmetric secret
///
/// Built once at startup from configuration and shared read-only; it holds no
/// mutable state.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    access_ttl: Duration,
    reset_ttl: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("issuer", &self.issuer)
            .field("access_ttl", &self.access_ttl)
            .field("reset_ttl", &self.reset_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// Creates a token service with default issuer and lifetimes
    ///
    /// The secret should be at least 32 bytes; the API configuration enforces it.
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer: DEFAULT_ISSUER.to_string(),
            access_ttl: Duration::minutes(30),
            reset_ttl: Duration::minutes(15),
        }
    }

    /// Overrides the issuer claim
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    /// Overrides the default lifetimes
    pub fn with_ttls(mut self, access_ttl: Duration, reset_ttl: Duration) -> Self {
        self.access_ttl = access_ttl;
        self.reset_ttl = reset_ttl;
        self
    }

    /// Gets the default lifetime for a purpose
    pub fn default_ttl(&self, purpose: TokenPurpose) -> Duration {
        match purpose {
            TokenPurpose::Access => self.access_ttl,
            TokenPurpose::PasswordReset => self.reset_ttl,
        }
    }

    /// Issues a token with the default lifetime for its purpose
    pub fn issue(&self, user_id: UserId, purpose: TokenPurpose) -> Result<String, TokenError> {
        self.issue_with_ttl(user_id, purpose, self.default_ttl(purpose))
    }

    /// Issues a token that expires `ttl` from now
    pub fn issue_with_ttl(
        &self,
        user_id: UserId,
        purpose: TokenPurpose,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: (now + ttl).timestamp(),
            purpose,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::CreateError(e.to_string()))
    }

    /// Validates signature, issuer and expiry, returning the claims
    ///
    /// No leeway is applied: a token is rejected as soon as `now > exp`.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            }
        })?;

        Ok(data.claims)
    }

    /// Validates a token and checks it was minted for `expected`
    pub fn verify_purpose(
        &self,
        token: &str,
        expected: TokenPurpose,
    ) -> Result<Claims, TokenError> {
        let claims = self.verify(token)?;

        if claims.purpose != expected {
            return Err(TokenError::WrongPurpose {
                expected,
                actual: claims.purpose,
            });
        }

        Ok(claims)
    }
}
