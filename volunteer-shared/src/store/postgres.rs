/// PostgreSQL-backed store
///
/// Thin layer over the model queries that adds transactions where a write
/// spans several rows and turns constraint violations into [`StoreError`]
/// variants. Concurrency control is left to PostgreSQL: uniqueness and foreign
/// keys reject invalid end states, and everything else is last-writer-wins.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use volunteer_shared::db::pool::{create_pool, DatabaseConfig};
/// use volunteer_shared::store::{PgStore, Store};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
/// let store: Arc<dyn Store> = Arc::new(PgStore::new(pool));
/// store.ping().await?;
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use sqlx::PgPool;

use super::{CredentialStore, EventStore, RoleStore, Store, StoreError, StoreResult};
use crate::models::{
    credential::Credential,
    event::{Event, EventId, EventQuery, NewEvent, UpdateEvent},
    organization::{NewOrganization, Organization, OrganizationId, OrganizationQuery, UpdateOrganization},
    registration::{Registration, RegistrationQuery},
    role::{Member, PermissionLevel, Role},
    user::{NewUser, User, UserId, UserQuery},
};

/// Store on a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wraps an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(User::find_by_email(&self.pool, email).await?)
    }

    async fn find_by_id(&self, user_id: UserId) -> StoreResult<Option<User>> {
        Ok(User::find_by_id(&self.pool, user_id).await?)
    }

    async fn list_users(&self, query: &UserQuery) -> StoreResult<Vec<User>> {
        Ok(User::list(&self.pool, query).await?)
    }

    async fn insert(&self, user: &NewUser, hashed_password: &str) -> StoreResult<User> {
        let mut tx = self.pool.begin().await?;

        let created = User::create(&mut *tx, user).await.map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::DuplicateEmail
            } else {
                StoreError::Database(e)
            }
        })?;

        Credential::create(&mut *tx, created.user_id, hashed_password).await?;

        tx.commit().await?;

        tracing::debug!(user_id = created.user_id, "Inserted user and credential");
        Ok(created)
    }

    async fn get_hash(&self, user_id: UserId) -> StoreResult<Option<String>> {
        Ok(Credential::find_hash(&self.pool, user_id).await?)
    }

    async fn replace_hash(&self, user_id: UserId, hashed_password: &str) -> StoreResult<u64> {
        Ok(Credential::replace_hash(&self.pool, user_id, hashed_password).await?)
    }

    async fn delete_user_and_credential(&self, user_id: UserId) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;

        Credential::delete(&mut *tx, user_id).await?;

        let deleted = User::delete(&mut *tx, user_id).await.map_err(|e| {
            if is_foreign_key_violation(&e) {
                StoreError::Restricted("user created an organization".to_string())
            } else {
                StoreError::Database(e)
            }
        })?;

        tx.commit().await?;

        Ok(deleted)
    }
}

#[async_trait]
impl RoleStore for PgStore {
    async fn get_role(
        &self,
        user_id: UserId,
        organization_id: OrganizationId,
    ) -> StoreResult<Option<PermissionLevel>> {
        Ok(Role::get_level(&self.pool, user_id, organization_id).await?)
    }

    async fn list_members(&self, organization_id: OrganizationId) -> StoreResult<Vec<Member>> {
        Ok(Role::list_members(&self.pool, organization_id).await?)
    }

    async fn insert_role(&self, role: &Role) -> StoreResult<Role> {
        Role::create(&self.pool, role).await.map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::Conflict("user already has a role in this organization".to_string())
            } else if is_foreign_key_violation(&e) {
                StoreError::MissingReference("user or organization".to_string())
            } else {
                StoreError::Database(e)
            }
        })
    }

    async fn update_role(
        &self,
        user_id: UserId,
        organization_id: OrganizationId,
        level: PermissionLevel,
    ) -> StoreResult<Option<Role>> {
        Ok(Role::update_level(&self.pool, user_id, organization_id, level).await?)
    }

    async fn delete_role(&self, user_id: UserId, organization_id: OrganizationId) -> StoreResult<bool> {
        Ok(Role::delete(&self.pool, user_id, organization_id).await?)
    }

    async fn create_organization(&self, data: &NewOrganization) -> StoreResult<Organization> {
        let mut tx = self.pool.begin().await?;

        let organization = Organization::create(&mut *tx, data).await.map_err(|e| {
            if is_foreign_key_violation(&e) {
                StoreError::MissingReference("user".to_string())
            } else {
                StoreError::Database(e)
            }
        })?;

        Role::create(
            &mut *tx,
            &Role {
                user_id: data.created_by_user_id,
                organization_id: organization.organization_id,
                permission_level: PermissionLevel::Admin,
            },
        )
        .await?;

        tx.commit().await?;

        Ok(organization)
    }

    async fn find_organization(&self, organization_id: OrganizationId) -> StoreResult<Option<Organization>> {
        Ok(Organization::find_by_id(&self.pool, organization_id).await?)
    }

    async fn list_organizations(&self, query: &OrganizationQuery) -> StoreResult<Vec<Organization>> {
        Ok(Organization::list(&self.pool, query).await?)
    }

    async fn update_organization(
        &self,
        organization_id: OrganizationId,
        data: &UpdateOrganization,
    ) -> StoreResult<Option<Organization>> {
        Ok(Organization::update(&self.pool, organization_id, data).await?)
    }

    async fn delete_organization(&self, organization_id: OrganizationId) -> StoreResult<bool> {
        Ok(Organization::delete(&self.pool, organization_id).await?)
    }
}

#[async_trait]
impl EventStore for PgStore {
    async fn create_event(&self, data: &NewEvent) -> StoreResult<Event> {
        Event::create(&self.pool, data).await.map_err(|e| {
            if is_foreign_key_violation(&e) {
                StoreError::MissingReference("organization".to_string())
            } else {
                StoreError::Database(e)
            }
        })
    }

    async fn find_event(&self, event_id: EventId) -> StoreResult<Option<Event>> {
        Ok(Event::find_by_id(&self.pool, event_id).await?)
    }

    async fn list_events(&self, query: &EventQuery) -> StoreResult<Vec<Event>> {
        Ok(Event::list(&self.pool, query).await?)
    }

    async fn update_event(&self, event_id: EventId, data: &UpdateEvent) -> StoreResult<Option<Event>> {
        Ok(Event::update(&self.pool, event_id, data).await?)
    }

    async fn delete_event(&self, event_id: EventId) -> StoreResult<bool> {
        Ok(Event::delete(&self.pool, event_id).await?)
    }

    async fn insert_registration(&self, user_id: UserId, event_id: EventId) -> StoreResult<Registration> {
        Registration::create(&self.pool, user_id, event_id)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StoreError::Conflict("user is already registered for this event".to_string())
                } else if is_foreign_key_violation(&e) {
                    StoreError::MissingReference("user or event".to_string())
                } else {
                    StoreError::Database(e)
                }
            })
    }

    async fn list_registrations(&self, query: &RegistrationQuery) -> StoreResult<Vec<Registration>> {
        Ok(Registration::list(&self.pool, query).await?)
    }

    async fn delete_registration(&self, user_id: UserId, event_id: EventId) -> StoreResult<Option<Registration>> {
        Ok(Registration::delete(&self.pool, user_id, event_id).await?)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(crate::db::pool::health_check(&self.pool).await?)
    }
}
