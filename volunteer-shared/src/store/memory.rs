/// In-memory store
///
/// Holds every table behind a single `tokio::sync::RwLock`, so each trait
/// method observes and produces a consistent snapshot. Multi-row writes happen
/// under one write guard, which gives them the same all-or-nothing behavior
/// the PostgreSQL store gets from transactions.
///
/// Used by the API integration tests and handy for running the server without
/// a database.
///
/// # Example
///
/// ```
/// use volunteer_shared::models::user::NewUser;
/// use volunteer_shared::store::{CredentialStore, MemoryStore};
///
/// # #[tokio::main]
/// # async fn main() {
/// let store = MemoryStore::new();
/// let user = store
///     .insert(
///         &NewUser {
///             email: "ada@example.com".to_string(),
///             first_name: "Ada".to_string(),
///             last_name: "Lovelace".to_string(),
///         },
///         "$argon2id$...",
///     )
///     .await
///     .unwrap();
/// assert_eq!(store.get_hash(user.user_id).await.unwrap().as_deref(), Some("$argon2id$..."));
/// # }
/// ```

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{CredentialStore, EventStore, RoleStore, Store, StoreError, StoreResult};
use crate::models::{
    event::{Event, EventId, EventQuery, NewEvent, UpdateEvent},
    organization::{NewOrganization, Organization, OrganizationId, OrganizationQuery, UpdateOrganization},
    registration::{Registration, RegistrationQuery},
    role::{Member, PermissionLevel, Role},
    user::{NewUser, User, UserId, UserQuery},
};

#[derive(Debug, Default)]
struct Tables {
    last_user_id: UserId,
    last_organization_id: OrganizationId,
    last_event_id: EventId,
    users: BTreeMap<UserId, User>,
    credentials: HashMap<UserId, String>,
    organizations: BTreeMap<OrganizationId, Organization>,
    /// Insertion order doubles as membership age
    roles: Vec<Role>,
    events: BTreeMap<EventId, Event>,
    /// Oldest first
    registrations: Vec<Registration>,
}

impl Tables {
    fn role_position(&self, user_id: UserId, organization_id: OrganizationId) -> Option<usize> {
        self.roles
            .iter()
            .position(|r| r.user_id == user_id && r.organization_id == organization_id)
    }

    fn registration_position(&self, user_id: UserId, event_id: EventId) -> Option<usize> {
        self.registrations
            .iter()
            .position(|r| r.user_id == user_id && r.event_id == event_id)
    }
}

fn page<T>(items: impl Iterator<Item = T>, offset: i64, limit: i64) -> Vec<T> {
    items
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect()
}

/// Store backed by process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, user_id: UserId) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.get(&user_id).cloned())
    }

    async fn list_users(&self, query: &UserQuery) -> StoreResult<Vec<User>> {
        let tables = self.tables.read().await;

        Ok(page(
            tables.users.values().filter(|u| query.matches(u)).cloned(),
            query.offset,
            query.limit,
        ))
    }

    async fn insert(&self, user: &NewUser, hashed_password: &str) -> StoreResult<User> {
        let mut tables = self.tables.write().await;

        if tables.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::DuplicateEmail);
        }

        tables.last_user_id += 1;
        let created = User {
            user_id: tables.last_user_id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            created_at: Utc::now(),
        };

        tables.users.insert(created.user_id, created.clone());
        tables
            .credentials
            .insert(created.user_id, hashed_password.to_string());

        Ok(created)
    }

    async fn get_hash(&self, user_id: UserId) -> StoreResult<Option<String>> {
        let tables = self.tables.read().await;
        Ok(tables.credentials.get(&user_id).cloned())
    }

    async fn replace_hash(&self, user_id: UserId, hashed_password: &str) -> StoreResult<u64> {
        let mut tables = self.tables.write().await;

        match tables.credentials.get_mut(&user_id) {
            Some(hash) => {
                *hash = hashed_password.to_string();
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_user_and_credential(&self, user_id: UserId) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;

        if tables
            .organizations
            .values()
            .any(|o| o.created_by_user_id == user_id)
        {
            return Err(StoreError::Restricted(
                "user created an organization".to_string(),
            ));
        }

        tables.credentials.remove(&user_id);
        let deleted = tables.users.remove(&user_id).is_some();
        tables.roles.retain(|r| r.user_id != user_id);
        tables.registrations.retain(|r| r.user_id != user_id);

        Ok(deleted)
    }
}

#[async_trait]
impl RoleStore for MemoryStore {
    async fn get_role(
        &self,
        user_id: UserId,
        organization_id: OrganizationId,
    ) -> StoreResult<Option<PermissionLevel>> {
        let tables = self.tables.read().await;
        Ok(tables
            .role_position(user_id, organization_id)
            .map(|i| tables.roles[i].permission_level))
    }

    async fn list_members(&self, organization_id: OrganizationId) -> StoreResult<Vec<Member>> {
        let tables = self.tables.read().await;

        let members = tables
            .roles
            .iter()
            .filter(|r| r.organization_id == organization_id)
            .filter_map(|r| {
                tables.users.get(&r.user_id).map(|u| Member {
                    user_id: u.user_id,
                    organization_id: r.organization_id,
                    email: u.email.clone(),
                    first_name: u.first_name.clone(),
                    last_name: u.last_name.clone(),
                    permission_level: r.permission_level,
                })
            })
            .collect();

        Ok(members)
    }

    async fn insert_role(&self, role: &Role) -> StoreResult<Role> {
        let mut tables = self.tables.write().await;

        if !tables.users.contains_key(&role.user_id)
            || !tables.organizations.contains_key(&role.organization_id)
        {
            return Err(StoreError::MissingReference(
                "user or organization".to_string(),
            ));
        }

        if tables
            .role_position(role.user_id, role.organization_id)
            .is_some()
        {
            return Err(StoreError::Conflict(
                "user already has a role in this organization".to_string(),
            ));
        }

        tables.roles.push(role.clone());
        Ok(role.clone())
    }

    async fn update_role(
        &self,
        user_id: UserId,
        organization_id: OrganizationId,
        level: PermissionLevel,
    ) -> StoreResult<Option<Role>> {
        let mut tables = self.tables.write().await;

        let Some(i) = tables.role_position(user_id, organization_id) else {
            return Ok(None);
        };

        tables.roles[i].permission_level = level;
        Ok(Some(tables.roles[i].clone()))
    }

    async fn delete_role(&self, user_id: UserId, organization_id: OrganizationId) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;

        match tables.role_position(user_id, organization_id) {
            Some(i) => {
                tables.roles.remove(i);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn create_organization(&self, data: &NewOrganization) -> StoreResult<Organization> {
        let mut tables = self.tables.write().await;

        if !tables.users.contains_key(&data.created_by_user_id) {
            return Err(StoreError::MissingReference("user".to_string()));
        }

        tables.last_organization_id += 1;
        let organization = Organization {
            organization_id: tables.last_organization_id,
            name: data.name.clone(),
            description: data.description.clone(),
            created_by_user_id: data.created_by_user_id,
            created_at: Utc::now(),
        };

        tables
            .organizations
            .insert(organization.organization_id, organization.clone());
        tables.roles.push(Role {
            user_id: data.created_by_user_id,
            organization_id: organization.organization_id,
            permission_level: PermissionLevel::Admin,
        });

        Ok(organization)
    }

    async fn find_organization(&self, organization_id: OrganizationId) -> StoreResult<Option<Organization>> {
        let tables = self.tables.read().await;
        Ok(tables.organizations.get(&organization_id).cloned())
    }

    async fn list_organizations(&self, query: &OrganizationQuery) -> StoreResult<Vec<Organization>> {
        let tables = self.tables.read().await;

        Ok(page(
            tables.organizations.values().filter(|o| query.matches(o)).cloned(),
            query.offset,
            query.limit,
        ))
    }

    async fn update_organization(
        &self,
        organization_id: OrganizationId,
        data: &UpdateOrganization,
    ) -> StoreResult<Option<Organization>> {
        let mut tables = self.tables.write().await;

        let Some(organization) = tables.organizations.get_mut(&organization_id) else {
            return Ok(None);
        };

        if let Some(name) = &data.name {
            organization.name = name.clone();
        }
        if let Some(description) = &data.description {
            organization.description = Some(description.clone());
        }

        Ok(Some(organization.clone()))
    }

    async fn delete_organization(&self, organization_id: OrganizationId) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;

        let deleted = tables.organizations.remove(&organization_id).is_some();
        tables.roles.retain(|r| r.organization_id != organization_id);
        tables.events.retain(|_, e| e.organization_id != organization_id);
        tables
            .registrations
            .retain(|r| r.organization_id != organization_id);

        Ok(deleted)
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn create_event(&self, data: &NewEvent) -> StoreResult<Event> {
        let mut tables = self.tables.write().await;

        if !tables.organizations.contains_key(&data.organization_id) {
            return Err(StoreError::MissingReference("organization".to_string()));
        }

        tables.last_event_id += 1;
        let event = Event {
            event_id: tables.last_event_id,
            organization_id: data.organization_id,
            name: data.name.clone(),
            description: data.description.clone(),
            location: data.location.clone(),
            starts_at: data.starts_at,
            created_at: Utc::now(),
        };

        tables.events.insert(event.event_id, event.clone());
        Ok(event)
    }

    async fn find_event(&self, event_id: EventId) -> StoreResult<Option<Event>> {
        let tables = self.tables.read().await;
        Ok(tables.events.get(&event_id).cloned())
    }

    async fn list_events(&self, query: &EventQuery) -> StoreResult<Vec<Event>> {
        let tables = self.tables.read().await;

        Ok(page(
            tables.events.values().filter(|e| query.matches(e)).cloned(),
            query.offset,
            query.limit,
        ))
    }

    async fn update_event(&self, event_id: EventId, data: &UpdateEvent) -> StoreResult<Option<Event>> {
        let mut tables = self.tables.write().await;

        let Some(event) = tables.events.get_mut(&event_id) else {
            return Ok(None);
        };

        if let Some(name) = &data.name {
            event.name = name.clone();
        }
        if let Some(description) = &data.description {
            event.description = Some(description.clone());
        }
        if let Some(location) = &data.location {
            event.location = Some(location.clone());
        }
        if let Some(starts_at) = data.starts_at {
            event.starts_at = starts_at;
        }

        Ok(Some(event.clone()))
    }

    async fn delete_event(&self, event_id: EventId) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;

        let deleted = tables.events.remove(&event_id).is_some();
        tables.registrations.retain(|r| r.event_id != event_id);

        Ok(deleted)
    }

    async fn insert_registration(&self, user_id: UserId, event_id: EventId) -> StoreResult<Registration> {
        let mut tables = self.tables.write().await;

        let organization_id = match (tables.users.contains_key(&user_id), tables.events.get(&event_id)) {
            (true, Some(event)) => event.organization_id,
            _ => return Err(StoreError::MissingReference("user or event".to_string())),
        };

        if tables.registration_position(user_id, event_id).is_some() {
            return Err(StoreError::Conflict(
                "user is already registered for this event".to_string(),
            ));
        }

        let registration = Registration {
            user_id,
            event_id,
            organization_id,
            registered_at: Utc::now(),
        };
        tables.registrations.push(registration.clone());

        Ok(registration)
    }

    async fn list_registrations(&self, query: &RegistrationQuery) -> StoreResult<Vec<Registration>> {
        let tables = self.tables.read().await;

        Ok(page(
            tables
                .registrations
                .iter()
                .rev()
                .filter(|r| query.matches(r))
                .cloned(),
            query.offset,
            query.limit,
        ))
    }

    async fn delete_registration(&self, user_id: UserId, event_id: EventId) -> StoreResult<Option<Registration>> {
        let mut tables = self.tables.write().await;

        Ok(tables
            .registration_position(user_id, event_id)
            .map(|i| tables.registrations.remove(i)))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
