/// Authentication and authorization for Volunteer Hub
///
/// # Modules
///
/// - [`password`]: Argon2id hashing and verification
/// - [`jwt`]: signed, expiring, purpose-tagged tokens
/// - [`flow`]: signup, login, password reset and account deletion
/// - [`guard`]: bearer token resolution and per-organization role checks
/// - [`notifier`]: out-of-band delivery of reset tokens
/// - [`error`]: the shared error taxonomy
///
/// # Security Properties
///
/// - **Hashes only**: plaintext passwords never reach the store
/// - **Enumeration resistance**: login and reset requests answer the same way
///   for known and unknown emails
/// - **Purpose separation**: reset tokens are refused as access tokens and the
///   other way round
/// - **Live identity**: every authenticated request re-reads the user, so
///   tokens of deleted users stop working
///
/// # Example
///
/// ```no_run
/// use volunteer_shared::auth::jwt::{TokenPurpose, TokenService};
/// use volunteer_shared::auth::password::{HashParams, PasswordHasher};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hasher = PasswordHasher::new(HashParams::default())?;
/// let digest = hasher.hash("user_password")?;
/// assert!(hasher.verify("user_password", &digest));
///
/// let tokens = TokenService::new("a-secret-of-at-least-thirty-two-bytes");
/// let token = tokens.issue(7, TokenPurpose::Access)?;
/// assert_eq!(tokens.verify(&token)?.user_id()?, 7);
/// # Ok(())
/// # }
/// ```

pub mod error;
pub mod flow;
pub mod guard;
pub mod jwt;
pub mod notifier;
pub mod password;

pub use error::AuthError;
pub use flow::AuthService;
pub use guard::{AuthGuard, Identity};
