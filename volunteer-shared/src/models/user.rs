/// User model and database operations
///
/// A user is the identity record. Credentials live in their own table (see
/// [`super::credential`]) so that the user row can be read and returned to
/// clients without ever touching the password digest.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     user_id BIGSERIAL PRIMARY KEY,
///     email TEXT NOT NULL,
///     first_name TEXT NOT NULL,
///     last_name TEXT NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT users_email_key UNIQUE (email)
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use volunteer_shared::models::user::{NewUser, User};
/// use volunteer_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let user = User::create(&pool, &NewUser {
///     email: "user@example.com".to_string(),
///     first_name: "Ada".to_string(),
///     last_name: "Lovelace".to_string(),
/// }).await?;
///
/// let found = User::find_by_email(&pool, "user@example.com").await?;
/// assert_eq!(found.map(|u| u.user_id), Some(user.user_id));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;

/// Surrogate key of a user row
pub type UserId = i64;

/// User identity record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Immutable surrogate key
    pub user_id: UserId,

    /// Email address, unique and compared exactly as stored
    pub email: String,

    pub first_name: String,

    pub last_name: String,

    /// When the account was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

/// Filter and page for user listings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserQuery {
    /// Case-insensitive substring matched against email, first and last name
    pub search: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

impl Default for UserQuery {
    fn default() -> Self {
        Self {
            search: None,
            limit: 10,
            offset: 0,
        }
    }
}

impl UserQuery {
    /// Checks whether a user matches the search term
    pub fn matches(&self, user: &User) -> bool {
        let Some(term) = self.search.as_deref() else {
            return true;
        };
        let term = term.to_lowercase();

        [&user.email, &user.first_name, &user.last_name]
            .iter()
            .any(|field| field.to_lowercase().contains(&term))
    }
}

impl User {
    /// Inserts a user row
    ///
    /// # Errors
    ///
    /// Fails with a unique violation on `users_email_key` if the email exists.
    pub async fn create<'e, E>(executor: E, data: &NewUser) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, first_name, last_name)
            VALUES ($1, $2, $3)
            RETURNING user_id, email, first_name, last_name, created_at
            "#,
        )
        .bind(&data.email)
        .bind(&data.first_name)
        .bind(&data.last_name)
        .fetch_one(executor)
        .await
    }

    /// Finds a user by ID
    pub async fn find_by_id<'e, E>(executor: E, user_id: UserId) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, email, first_name, last_name, created_at
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(executor)
        .await
    }

    /// Finds a user by exact email match
    pub async fn find_by_email<'e, E>(executor: E, email: &str) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, email, first_name, last_name, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(executor)
        .await
    }

    /// Lists users ordered by ID, matching the search term literally
    pub async fn list<'e, E>(executor: E, query: &UserQuery) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let term = query.search.as_deref().map(str::to_lowercase);

        sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, email, first_name, last_name, created_at
            FROM users
            WHERE $1::TEXT IS NULL
               OR strpos(lower(email), $1) > 0
               OR strpos(lower(first_name), $1) > 0
               OR strpos(lower(last_name), $1) > 0
            ORDER BY user_id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(term)
        .bind(query.limit)
        .bind(query.offset)
        .fetch_all(executor)
        .await
    }

    /// Deletes a user row
    ///
    /// Returns true if a row was removed. Fails with a foreign key violation
    /// while the user still owns an organization.
    pub async fn delete<'e, E>(executor: E, user_id: UserId) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM users WHERE user_id = $1")
            .bind(user_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_serialization_has_no_secret_fields() {
        let user = User {
            user_id: 1,
            email: "a@x.com".to_string(),
            first_name: "A".to_string(),
            last_name: "B".to_string(),
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["email"], "a@x.com");
        assert!(json.get("hashed_password").is_none());
        assert!(json.get("password_hash").is_none());
    }

    #[test]
    fn test_query_matches_any_name_field() {
        let user = User {
            user_id: 1,
            email: "grace@navy.mil".to_string(),
            first_name: "Grace".to_string(),
            last_name: "Hopper".to_string(),
            created_at: Utc::now(),
        };
        let search = |term: &str| UserQuery {
            search: Some(term.to_string()),
            ..Default::default()
        };

        assert!(search("NAVY").matches(&user));
        assert!(search("grace").matches(&user));
        assert!(search("hop").matches(&user));
        assert!(!search("lovelace").matches(&user));
        assert!(!search("%").matches(&user));
        assert!(UserQuery::default().matches(&user));
    }

    // Database-backed tests live in tests/postgres_store_tests.rs
}
