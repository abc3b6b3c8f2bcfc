//! # Feedtrack Shared Library
//!
//! Types, persistence and policy shared by the Feedtrack API server.
//!
//! ## Module Organization
//!
//! - `auth`: Password hashing, JWT tokens, request identity and the
//!   manager/employee authorization policy
//! - `db`: Connection pool and migrations
//! - `models`: Users, feedback and forms with their queries
//! - `dashboard`: Read-only rollups computed from feedback and users

pub mod auth;
pub mod dashboard;
pub mod db;
pub mod models;

/// Current version of the Feedtrack shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
