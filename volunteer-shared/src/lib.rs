//! # Volunteer Hub Shared Library
//!
//! Domain types, persistence and the authentication core used by the
//! Volunteer Hub API server.
//!
//! ## Module Organization
//!
//! - `auth`: password hashing, tokens, auth flows and the authorization guard
//! - `db`: connection pool and embedded migrations
//! - `models`: database records and their queries
//! - `store`: the persistence traits the auth layer is written against

pub mod auth;
pub mod db;
pub mod models;
pub mod store;

/// Current version of the Volunteer Hub shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
