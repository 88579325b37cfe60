//! HTTP server layer
//!
//! Axum server with:
//! - CORS (localhost only by default)
//! - Request tracing
//! - Per-client rate limiting on public reads
//! - Graceful shutdown
//! - JSON error responses

pub mod error;
pub mod extractors;
pub mod rate_limit;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use rate_limit::RateLimiter;
pub use server::{build_router, run_server, AppState, ServerConfig, ServerError};
