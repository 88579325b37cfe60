//! Database layer - connection pool, schema and repositories
//!
//! - Connection pool with an explicit limit, shared through `AppState`
//! - Rely on DB constraints and map conflicts, no check-then-insert
//! - Every value reaches SQL as a bind parameter

pub mod migrations;
pub mod pool;
pub mod repos;

pub use pool::{create_pool, create_pool_with_options};
pub use repos::*;
