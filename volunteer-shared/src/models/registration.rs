/// Event registration model and database operations
///
/// A registration signs one user up for one event. The organization is not
/// stored on the row; it is read from the event so the two cannot disagree.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE event_registrations (
///     user_id BIGINT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
///     event_id BIGINT NOT NULL REFERENCES events(event_id) ON DELETE CASCADE,
///     registered_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (user_id, event_id)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;

use super::{event::EventId, organization::OrganizationId, user::UserId};

/// A user's registration for an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Registration {
    pub user_id: UserId,
    pub event_id: EventId,

    /// Organization running the event
    pub organization_id: OrganizationId,

    pub registered_at: DateTime<Utc>,
}

/// Filter and page for registration listings
///
/// Unset filters match everything. Results are newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationQuery {
    pub organization_id: Option<OrganizationId>,
    pub event_id: Option<EventId>,
    pub user_id: Option<UserId>,
    pub limit: i64,
    pub offset: i64,
}

impl Default for RegistrationQuery {
    fn default() -> Self {
        Self {
            organization_id: None,
            event_id: None,
            user_id: None,
            limit: 10,
            offset: 0,
        }
    }
}

impl RegistrationQuery {
    pub fn matches(&self, registration: &Registration) -> bool {
        self.organization_id
            .map_or(true, |id| id == registration.organization_id)
            && self.event_id.map_or(true, |id| id == registration.event_id)
            && self.user_id.map_or(true, |id| id == registration.user_id)
    }
}

impl Registration {
    /// Registers a user for an event
    ///
    /// # Errors
    ///
    /// - Unique violation if the user is already registered
    /// - Foreign key violation if the user or event doesn't exist
    pub async fn create<'e, E>(executor: E, user_id: UserId, event_id: EventId) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Registration>(
            r#"
            WITH inserted AS (
                INSERT INTO event_registrations (user_id, event_id)
                VALUES ($1, $2)
                RETURNING user_id, event_id, registered_at
            )
            SELECT i.user_id, i.event_id, e.organization_id, i.registered_at
            FROM inserted i
            JOIN events e ON e.event_id = i.event_id
            "#,
        )
        .bind(user_id)
        .bind(event_id)
        .fetch_one(executor)
        .await
    }

    /// Lists registrations, newest first
    pub async fn list<'e, E>(executor: E, query: &RegistrationQuery) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Registration>(
            r#"
            SELECT r.user_id, r.event_id, e.organization_id, r.registered_at
            FROM event_registrations r
            JOIN events e ON e.event_id = r.event_id
            WHERE ($1::BIGINT IS NULL OR e.organization_id = $1)
              AND ($2::BIGINT IS NULL OR r.event_id = $2)
              AND ($3::BIGINT IS NULL OR r.user_id = $3)
            ORDER BY r.registered_at DESC, r.event_id, r.user_id
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(query.organization_id)
        .bind(query.event_id)
        .bind(query.user_id)
        .bind(query.limit)
        .bind(query.offset)
        .fetch_all(executor)
        .await
    }

    /// Removes a registration, returning it if it existed
    pub async fn delete<'e, E>(
        executor: E,
        user_id: UserId,
        event_id: EventId,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Registration>(
            r#"
            WITH deleted AS (
                DELETE FROM event_registrations
                WHERE user_id = $1 AND event_id = $2
                RETURNING user_id, event_id, registered_at
            )
            SELECT d.user_id, d.event_id, e.organization_id, d.registered_at
            FROM deleted d
            JOIN events e ON e.event_id = d.event_id
            "#,
        )
        .bind(user_id)
        .bind(event_id)
        .fetch_optional(executor)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_filters_combine() {
        let registration = Registration {
            user_id: 3,
            event_id: 5,
            organization_id: 2,
            registered_at: Utc::now(),
        };

        assert!(RegistrationQuery::default().matches(&registration));
        assert!(RegistrationQuery {
            event_id: Some(5),
            user_id: Some(3),
            ..Default::default()
        }
        .matches(&registration));
        assert!(!RegistrationQuery {
            event_id: Some(5),
            user_id: Some(4),
            ..Default::default()
        }
        .matches(&registration));
        assert!(!RegistrationQuery {
            organization_id: Some(9),
            ..Default::default()
        }
        .matches(&registration));
    }
}
