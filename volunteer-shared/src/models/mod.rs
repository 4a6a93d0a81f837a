/// Database models for Volunteer Hub
///
/// Typed records for each table plus the parameterized queries that read and
/// write them. Query methods accept any `PgExecutor`, so they work against the
/// pool directly or inside a transaction.
///
/// # Models
///
/// - `user`: identity records
/// - `credential`: password digests, one per user
/// - `organization`: organizations and their creator
/// - `role`: per-organization permission levels
/// - `event`: events run by an organization
/// - `registration`: users signed up for events
///
/// # Example
///
/// ```no_run
/// use volunteer_shared::models::role::{PermissionLevel, Role};
/// use volunteer_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let level = Role::get_level(&pool, 1, 1).await?;
/// assert_eq!(level, Some(PermissionLevel::Admin));
/// # Ok(())
/// # }
/// ```

pub mod credential;
pub mod event;
pub mod organization;
pub mod registration;
pub mod role;
pub mod user;
