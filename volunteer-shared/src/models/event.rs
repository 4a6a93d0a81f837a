/// Event model and database operations
///
/// Events belong to one organization and go away with it.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE events (
///     event_id BIGSERIAL PRIMARY KEY,
///     organization_id BIGINT NOT NULL REFERENCES organizations(organization_id) ON DELETE CASCADE,
///     name TEXT NOT NULL,
///     description TEXT,
///     location TEXT,
///     starts_at TIMESTAMPTZ NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;

use super::organization::OrganizationId;

/// Surrogate key of an event row
pub type EventId = i64;

/// Event record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Event {
    pub event_id: EventId,
    pub organization_id: OrganizationId,
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEvent {
    pub organization_id: OrganizationId,
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub starts_at: DateTime<Utc>,
}

/// Input for updating an event
///
/// Only fields that are `Some` are changed. An event never moves to another
/// organization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateEvent {
    pub name: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
}

/// Filter and page for event listings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
    pub organization_id: Option<OrganizationId>,
    pub limit: i64,
    pub offset: i64,
}

impl Default for EventQuery {
    fn default() -> Self {
        Self {
            organization_id: None,
            limit: 10,
            offset: 0,
        }
    }
}

impl EventQuery {
    pub fn matches(&self, event: &Event) -> bool {
        self.organization_id
            .map_or(true, |id| id == event.organization_id)
    }
}

impl Event {
    /// Inserts an event row
    ///
    /// # Errors
    ///
    /// Foreign key violation if the organization doesn't exist.
    pub async fn create<'e, E>(executor: E, data: &NewEvent) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Event>(
            r#"
            INSERT INTO events (organization_id, name, description, location, starts_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING event_id, organization_id, name, description, location, starts_at, created_at
            "#,
        )
        .bind(data.organization_id)
        .bind(&data.name)
        .bind(&data.description)
        .bind(&data.location)
        .bind(data.starts_at)
        .fetch_one(executor)
        .await
    }

    /// Finds an event by ID
    pub async fn find_by_id<'e, E>(executor: E, event_id: EventId) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Event>(
            r#"
            SELECT event_id, organization_id, name, description, location, starts_at, created_at
            FROM events
            WHERE event_id = $1
            "#,
        )
        .bind(event_id)
        .fetch_optional(executor)
        .await
    }

    /// Lists events ordered by ID
    pub async fn list<'e, E>(executor: E, query: &EventQuery) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Event>(
            r#"
            SELECT event_id, organization_id, name, description, location, starts_at, created_at
            FROM events
            WHERE $1::BIGINT IS NULL OR organization_id = $1
            ORDER BY event_id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(query.organization_id)
        .bind(query.limit)
        .bind(query.offset)
        .fetch_all(executor)
        .await
    }

    /// Updates the given fields, keeping current values for `None`
    pub async fn update<'e, E>(
        executor: E,
        event_id: EventId,
        data: &UpdateEvent,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Event>(
            r#"
            UPDATE events
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                location = COALESCE($4, location),
                starts_at = COALESCE($5, starts_at)
            WHERE event_id = $1
            RETURNING event_id, organization_id, name, description, location, starts_at, created_at
            "#,
        )
        .bind(event_id)
        .bind(&data.name)
        .bind(&data.description)
        .bind(&data.location)
        .bind(data.starts_at)
        .fetch_optional(executor)
        .await
    }

    /// Deletes an event; its registrations go with it
    pub async fn delete<'e, E>(executor: E, event_id: EventId) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM events WHERE event_id = $1")
            .bind(event_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_filters_by_organization() {
        let event = Event {
            event_id: 1,
            organization_id: 7,
            name: "Beach cleanup".to_string(),
            description: None,
            location: Some("Pier 3".to_string()),
            starts_at: Utc::now(),
            created_at: Utc::now(),
        };

        assert!(EventQuery::default().matches(&event));
        assert!(EventQuery {
            organization_id: Some(7),
            ..Default::default()
        }
        .matches(&event));
        assert!(!EventQuery {
            organization_id: Some(8),
            ..Default::default()
        }
        .matches(&event));
    }

    #[test]
    fn test_starts_at_is_rfc3339() {
        let json = r#"{"organization_id":1,"name":"Drive","description":null,"location":null,"starts_at":"2026-06-01T12:00:00Z"}"#;
        let event: NewEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.starts_at.to_rfc3339(), "2026-06-01T12:00:00+00:00");
    }
}
