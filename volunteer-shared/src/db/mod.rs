/// Database layer for Volunteer Hub
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool with a startup health check
/// - `migrations`: embedded schema migrations
///
/// Typed records and their queries are in [`crate::models`]; the store traits
/// the auth layer consumes are in [`crate::store`].

pub mod migrations;
pub mod pool;
