//! # Volunteer Hub API Server Library
//!
//! HTTP surface of Volunteer Hub: the axum router, its state and the mapping
//! from domain errors to responses.
//!
//! ## Modules
//!
//! - `app`: application state and router builder
//! - `config`: configuration from the environment
//! - `error`: error handling and HTTP response mapping
//! - `middleware`: bearer authentication and security headers
//! - `routes`: route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
