/// Credential model and database operations
///
/// One row per user holding the Argon2id digest. The digest is replaced
/// wholesale on password reset and removed together with the user.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE credentials (
///     user_id BIGINT PRIMARY KEY REFERENCES users(user_id) ON DELETE CASCADE,
///     hashed_password TEXT NOT NULL,
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use sqlx::PgExecutor;

use super::user::UserId;

/// Stored credential for a user
///
/// Deliberately not `Serialize`: digests never leave the store layer.
#[derive(Clone, sqlx::FromRow)]
pub struct Credential {
    pub user_id: UserId,

    /// PHC-format Argon2id digest
    pub hashed_password: String,

    /// When the digest was last written
    pub updated_at: DateTime<Utc>,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("user_id", &self.user_id)
            .field("hashed_password", &"<redacted>")
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

impl Credential {
    /// Inserts the credential row for a freshly created user
    pub async fn create<'e, E>(
        executor: E,
        user_id: UserId,
        hashed_password: &str,
    ) -> Result<(), sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query("INSERT INTO credentials (user_id, hashed_password) VALUES ($1, $2)")
            .bind(user_id)
            .bind(hashed_password)
            .execute(executor)
            .await?;

        Ok(())
    }

    /// Gets the stored digest for a user
    pub async fn find_hash<'e, E>(executor: E, user_id: UserId) -> Result<Option<String>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar::<_, String>(
            "SELECT hashed_password FROM credentials WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(executor)
        .await
    }

    /// Replaces the digest, returning the number of rows updated
    pub async fn replace_hash<'e, E>(
        executor: E,
        user_id: UserId,
        hashed_password: &str,
    ) -> Result<u64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            r#"
            UPDATE credentials
            SET hashed_password = $2, updated_at = NOW()
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(hashed_password)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    /// Deletes the credential row
    pub async fn delete<'e, E>(executor: E, user_id: UserId) -> Result<u64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM credentials WHERE user_id = $1")
            .bind(user_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }
}
