/// Embedded schema migrations
///
/// Migrations live in the workspace-level `migrations/` directory and are
/// compiled into the binary with `sqlx::migrate!`, so a deployed server can
/// bring an empty database up to date on startup.
///
/// The schema encodes the referential rules the auth layer relies on:
///
/// - deleting a user cascades to their credential and roles
/// - deleting a user who created an organization is refused
/// - deleting an organization cascades to its roles
///
/// # Example
///
/// ```no_run
/// use volunteer_shared::db::pool::{create_pool, DatabaseConfig};
/// use volunteer_shared::db::migrations::run_migrations;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
/// run_migrations(&pool).await?;
/// # Ok(())
/// # }
/// ```

use sqlx::{migrate::MigrateDatabase, postgres::PgPool, Postgres};
use tracing::{debug, info, warn};

/// Applies every pending migration
///
/// Each migration runs in its own transaction; a failing migration is rolled
/// back and reported.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!("Running database migrations");

    match sqlx::migrate!("../migrations").run(pool).await {
        Ok(()) => {
            info!("Database schema is up to date");
            Ok(())
        }
        Err(e) => {
            warn!(error = %e, "Migration failed");
            Err(e)
        }
    }
}

/// Creates the database named in the URL if it doesn't exist
///
/// Meant for development and tests; production databases are provisioned
/// separately.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), sqlx::Error> {
    if Postgres::database_exists(database_url).await? {
        debug!("Database already exists");
        return Ok(());
    }

    info!("Database does not exist, creating it");
    Postgres::create_database(database_url).await?;
    Ok(())
}
