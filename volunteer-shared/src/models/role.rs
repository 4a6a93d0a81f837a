/// Role model and database operations
///
/// A role grants a user one permission level inside one organization. The pair
/// `(user_id, organization_id)` is the primary key, so a user holds at most one
/// role per organization.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE permission_level AS ENUM ('admin', 'volunteer');
///
/// CREATE TABLE roles (
///     user_id BIGINT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
///     organization_id BIGINT NOT NULL REFERENCES organizations(organization_id) ON DELETE CASCADE,
///     permission_level permission_level NOT NULL DEFAULT 'volunteer',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (user_id, organization_id)
/// );
/// ```
///
/// # Levels
///
/// - **admin**: manage the organization and its members
/// - **volunteer**: participate; may only manage their own membership

use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;

use super::organization::OrganizationId;
use super::user::UserId;

/// Permission level within one organization
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "permission_level", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PermissionLevel {
    /// Manages the organization and its members
    Admin,

    /// Regular member
    #[default]
    Volunteer,
}

impl PermissionLevel {
    /// Converts level to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionLevel::Admin => "admin",
            PermissionLevel::Volunteer => "volunteer",
        }
    }

    /// Can edit organization metadata and other members' roles
    pub fn can_manage_organization(&self) -> bool {
        matches!(self, PermissionLevel::Admin)
    }
}

/// A user's role in an organization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Role {
    pub user_id: UserId,
    pub organization_id: OrganizationId,
    pub permission_level: PermissionLevel,
}

/// Role joined with the member's public profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Member {
    pub user_id: UserId,
    pub organization_id: OrganizationId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub permission_level: PermissionLevel,
}

impl Role {
    /// Inserts a role
    ///
    /// # Errors
    ///
    /// - Unique violation if the user already has a role in the organization
    /// - Foreign key violation if the user or organization doesn't exist
    pub async fn create<'e, E>(executor: E, role: &Role) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Role>(
            r#"
            INSERT INTO roles (user_id, organization_id, permission_level)
            VALUES ($1, $2, $3)
            RETURNING user_id, organization_id, permission_level
            "#,
        )
        .bind(role.user_id)
        .bind(role.organization_id)
        .bind(role.permission_level)
        .fetch_one(executor)
        .await
    }

    /// Gets a user's permission level in an organization
    pub async fn get_level<'e, E>(
        executor: E,
        user_id: UserId,
        organization_id: OrganizationId,
    ) -> Result<Option<PermissionLevel>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar::<_, PermissionLevel>(
            r#"
            SELECT permission_level
            FROM roles
            WHERE user_id = $1 AND organization_id = $2
            "#,
        )
        .bind(user_id)
        .bind(organization_id)
        .fetch_optional(executor)
        .await
    }

    /// Changes a user's permission level
    ///
    /// Returns the updated role, or None if the user has no role there.
    pub async fn update_level<'e, E>(
        executor: E,
        user_id: UserId,
        organization_id: OrganizationId,
        level: PermissionLevel,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Role>(
            r#"
            UPDATE roles
            SET permission_level = $3
            WHERE user_id = $1 AND organization_id = $2
            RETURNING user_id, organization_id, permission_level
            "#,
        )
        .bind(user_id)
        .bind(organization_id)
        .bind(level)
        .fetch_optional(executor)
        .await
    }

    /// Removes a user's role, returning true if one existed
    pub async fn delete<'e, E>(
        executor: E,
        user_id: UserId,
        organization_id: OrganizationId,
    ) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM roles WHERE user_id = $1 AND organization_id = $2")
            .bind(user_id)
            .bind(organization_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists members of an organization, oldest first
    pub async fn list_members<'e, E>(
        executor: E,
        organization_id: OrganizationId,
    ) -> Result<Vec<Member>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Member>(
            r#"
            SELECT r.user_id, r.organization_id, u.email, u.first_name, u.last_name,
                   r.permission_level
            FROM roles r
            JOIN users u ON u.user_id = r.user_id
            WHERE r.organization_id = $1
            ORDER BY r.created_at ASC, r.user_id ASC
            "#,
        )
        .bind(organization_id)
        .fetch_all(executor)
        .await
    }
}
