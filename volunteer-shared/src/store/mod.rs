/// Persistence boundary for the auth layer
///
/// The auth flows and the guard never issue SQL themselves. They talk to the
/// store through two traits:
///
/// - [`CredentialStore`]: user identity and the matching password digest
/// - [`RoleStore`]: organizations and per-organization roles
/// - [`EventStore`]: events and their registrations
///
/// [`Store`] combines them and is what the application holds behind an `Arc`.
///
/// # Implementations
///
/// - [`postgres::PgStore`]: production store on a `sqlx` PostgreSQL pool
/// - [`memory::MemoryStore`]: in-process store for tests and local runs
///
/// Both enforce the same constraints: unique email, one credential per user,
/// one role per user per organization, one registration per user per event,
/// organization creators cannot be deleted, deletes cascade to dependent
/// rows, and multi-row writes are all-or-nothing.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::models::{
    event::{Event, EventId, EventQuery, NewEvent, UpdateEvent},
    organization::{NewOrganization, Organization, OrganizationId, OrganizationQuery, UpdateOrganization},
    registration::{Registration, RegistrationQuery},
    role::{Member, PermissionLevel, Role},
    user::{NewUser, User, UserId, UserQuery},
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Email is already registered
    #[error("A user with this email already exists")]
    DuplicateEmail,

    /// A uniqueness rule other than email was violated
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The write would orphan or remove a row other rows depend on
    #[error("Restricted: {0}")]
    Restricted(String),

    /// A referenced user, organization or event does not exist
    #[error("Not found: {0}")]
    MissingReference(String),

    /// Unexpected database failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Store result type alias
pub type StoreResult<T> = Result<T, StoreError>;

/// Maps user identity to hashed credentials
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Finds a user by exact email
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Finds a user by ID
    async fn find_by_id(&self, user_id: UserId) -> StoreResult<Option<User>>;

    /// Lists users matching a query, ordered by ID
    async fn list_users(&self, query: &UserQuery) -> StoreResult<Vec<User>>;

    /// Creates the user and its credential together
    ///
    /// Fails with [`StoreError::DuplicateEmail`] without writing anything if
    /// the email is taken.
    async fn insert(&self, user: &NewUser, hashed_password: &str) -> StoreResult<User>;

    /// Gets the stored digest
    async fn get_hash(&self, user_id: UserId) -> StoreResult<Option<String>>;

    /// Replaces the digest, returning the number of credentials updated
    async fn replace_hash(&self, user_id: UserId, hashed_password: &str) -> StoreResult<u64>;

    /// Removes the credential and then the user, atomically
    ///
    /// Returns false if the user didn't exist. Fails with
    /// [`StoreError::Restricted`] if the user created an organization.
    async fn delete_user_and_credential(&self, user_id: UserId) -> StoreResult<bool>;
}

/// Organizations and per-organization roles
#[async_trait]
pub trait RoleStore: Send + Sync {
    /// Gets a user's permission level in an organization
    async fn get_role(
        &self,
        user_id: UserId,
        organization_id: OrganizationId,
    ) -> StoreResult<Option<PermissionLevel>>;

    /// Lists the members of an organization
    async fn list_members(&self, organization_id: OrganizationId) -> StoreResult<Vec<Member>>;

    /// Grants a role
    ///
    /// Fails with [`StoreError::Conflict`] if the user already has one there and
    /// [`StoreError::MissingReference`] if the user or organization is unknown.
    async fn insert_role(&self, role: &Role) -> StoreResult<Role>;

    /// Changes a permission level; None if the user has no role there
    async fn update_role(
        &self,
        user_id: UserId,
        organization_id: OrganizationId,
        level: PermissionLevel,
    ) -> StoreResult<Option<Role>>;

    /// Removes a role; false if there was none
    async fn delete_role(&self, user_id: UserId, organization_id: OrganizationId) -> StoreResult<bool>;

    /// Creates an organization and makes its creator admin, atomically
    async fn create_organization(&self, data: &NewOrganization) -> StoreResult<Organization>;

    /// Finds an organization by ID
    async fn find_organization(&self, organization_id: OrganizationId) -> StoreResult<Option<Organization>>;

    /// Lists organizations matching a query
    async fn list_organizations(&self, query: &OrganizationQuery) -> StoreResult<Vec<Organization>>;

    /// Updates an organization; None if it doesn't exist
    async fn update_organization(
        &self,
        organization_id: OrganizationId,
        data: &UpdateOrganization,
    ) -> StoreResult<Option<Organization>>;

    /// Deletes an organization with every role, event and registration in it
    async fn delete_organization(&self, organization_id: OrganizationId) -> StoreResult<bool>;
}

/// Events and event registrations
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Creates an event; [`StoreError::MissingReference`] if the organization is unknown
    async fn create_event(&self, data: &NewEvent) -> StoreResult<Event>;

    async fn find_event(&self, event_id: EventId) -> StoreResult<Option<Event>>;

    /// Lists events matching a query, ordered by ID
    async fn list_events(&self, query: &EventQuery) -> StoreResult<Vec<Event>>;

    /// Updates an event; None if it doesn't exist
    async fn update_event(&self, event_id: EventId, data: &UpdateEvent) -> StoreResult<Option<Event>>;

    /// Deletes an event and its registrations
    async fn delete_event(&self, event_id: EventId) -> StoreResult<bool>;

    /// Registers a user for an event
    ///
    /// Fails with [`StoreError::Conflict`] if already registered and
    /// [`StoreError::MissingReference`] if the user or event is unknown.
    async fn insert_registration(&self, user_id: UserId, event_id: EventId) -> StoreResult<Registration>;

    /// Lists registrations matching a query, newest first
    async fn list_registrations(&self, query: &RegistrationQuery) -> StoreResult<Vec<Registration>>;

    /// Removes a registration, returning it if it existed
    async fn delete_registration(&self, user_id: UserId, event_id: EventId) -> StoreResult<Option<Registration>>;
}

/// Everything the application needs from persistence
#[async_trait]
pub trait Store: CredentialStore + RoleStore + EventStore {
    /// Checks the store is reachable
    async fn ping(&self) -> StoreResult<()>;
}
