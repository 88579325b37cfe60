//! postline-core: transport-free logic for the postline backend.
//!
//! Search filter parsing and date-range resolution live here so they can be
//! exercised without a database or HTTP stack. Configuration loading is
//! shared by the server and the CLI.

pub mod config;
pub mod error;
pub mod search;

pub use config::{
    AuthConfig, DatabaseConfig, PostlineConfig, RateLimitConfig, ServerSection, TokenAlgorithm,
    MAX_ACCESS_TOKEN_MINUTES, MAX_REFRESH_TOKEN_DAYS,
};
pub use error::{CoreError, Result};
pub use search::{DateRange, SearchFilter, SearchQuery};
