//! postline-server: HTTP API for users, posts and post search
//!
//! Layout:
//! - `models`: validated input newtypes
//! - `db`: pool, schema and repositories (sqlx/PostgreSQL)
//! - `auth`: password hashing and JWTs
//! - `http`: axum router, extractors, rate limiting and handlers

pub mod auth;
pub mod db;
pub mod http;
pub mod models;

pub use http::{build_router, run_server, AppState, ServerConfig};
