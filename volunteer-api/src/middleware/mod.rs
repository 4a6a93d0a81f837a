/// Middleware for the API server
///
/// - `auth`: resolves the bearer token on protected routes
/// - `headers`: security headers on every response

pub mod auth;
pub mod headers;
