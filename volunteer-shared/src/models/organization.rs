/// Organization model and database operations
///
/// Organizations group volunteers. The creating user is recorded and becomes
/// the first admin; that user cannot be deleted while the organization exists.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE organizations (
///     organization_id BIGSERIAL PRIMARY KEY,
///     name TEXT NOT NULL,
///     description TEXT,
///     created_by_user_id BIGINT NOT NULL REFERENCES users(user_id) ON DELETE RESTRICT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;

use super::user::UserId;

/// Surrogate key of an organization row
pub type OrganizationId = i64;

/// Organization record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Organization {
    pub organization_id: OrganizationId,
    pub name: String,
    pub description: Option<String>,

    /// The user who created the organization
    pub created_by_user_id: UserId,

    pub created_at: DateTime<Utc>,
}

/// Input for creating an organization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrganization {
    pub name: String,
    pub description: Option<String>,
    pub created_by_user_id: UserId,
}

/// Input for updating an organization
///
/// Only fields that are `Some` are changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateOrganization {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Filter and page for organization listings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganizationQuery {
    /// Case-insensitive substring matched against name and description
    pub search: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

impl Default for OrganizationQuery {
    fn default() -> Self {
        Self {
            search: None,
            limit: 10,
            offset: 0,
        }
    }
}

impl OrganizationQuery {
    /// Checks whether an organization matches the search term
    pub fn matches(&self, organization: &Organization) -> bool {
        let Some(term) = self.search.as_deref() else {
            return true;
        };
        let term = term.to_lowercase();

        organization.name.to_lowercase().contains(&term)
            || organization
                .description
                .as_deref()
                .map(|d| d.to_lowercase().contains(&term))
                .unwrap_or(false)
    }
}

impl Organization {
    /// Inserts an organization row
    pub async fn create<'e, E>(executor: E, data: &NewOrganization) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Organization>(
            r#"
            INSERT INTO organizations (name, description, created_by_user_id)
            VALUES ($1, $2, $3)
            RETURNING organization_id, name, description, created_by_user_id, created_at
            "#,
        )
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.created_by_user_id)
        .fetch_one(executor)
        .await
    }

    /// Finds an organization by ID
    pub async fn find_by_id<'e, E>(
        executor: E,
        organization_id: OrganizationId,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Organization>(
            r#"
            SELECT organization_id, name, description, created_by_user_id, created_at
            FROM organizations
            WHERE organization_id = $1
            "#,
        )
        .bind(organization_id)
        .fetch_optional(executor)
        .await
    }

    /// Updates name and/or description, keeping current values for `None`
    pub async fn update<'e, E>(
        executor: E,
        organization_id: OrganizationId,
        data: &UpdateOrganization,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Organization>(
            r#"
            UPDATE organizations
            SET name = COALESCE($2, name),
                description = COALESCE($3, description)
            WHERE organization_id = $1
            RETURNING organization_id, name, description, created_by_user_id, created_at
            "#,
        )
        .bind(organization_id)
        .bind(&data.name)
        .bind(&data.description)
        .fetch_optional(executor)
        .await
    }

    /// Deletes an organization; its roles go with it
    pub async fn delete<'e, E>(executor: E, organization_id: OrganizationId) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM organizations WHERE organization_id = $1")
            .bind(organization_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists organizations ordered by ID
    ///
    /// The search term is matched literally; `%` and `_` carry no meaning.
    pub async fn list<'e, E>(executor: E, query: &OrganizationQuery) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let term = query.search.as_deref().map(str::to_lowercase);

        sqlx::query_as::<_, Organization>(
            r#"
            SELECT organization_id, name, description, created_by_user_id, created_at
            FROM organizations
            WHERE $1::TEXT IS NULL
               OR strpos(lower(name), $1) > 0
               OR strpos(lower(COALESCE(description, '')), $1) > 0
            ORDER BY organization_id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(term)
        .bind(query.limit)
        .bind(query.offset)
        .fetch_all(executor)
        .await
    }
}
