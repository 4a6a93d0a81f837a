/// API route handlers
///
/// - `health`: liveness and store connectivity
/// - `auth`: signup, login, password reset and account deletion
/// - `users`: the current user and user lookup
/// - `organizations`: organizations and their members
/// - `events`: events and event registrations
/// - `paging`: shared `skip`/`limit` validation

pub mod auth;
pub mod events;
pub mod health;
pub mod organizations;
pub mod paging;
pub mod users;
