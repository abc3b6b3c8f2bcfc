//! # Feedtrack API Server Library
//!
//! HTTP surface of Feedtrack: managers write feedback and custom forms for
//! their team, employees read and acknowledge what they receive.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: Request extractors that reject with [`error::ApiError`]
//! - `middleware`: Security headers
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
