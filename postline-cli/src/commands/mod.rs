//! Subcommand implementations

pub mod config;
pub mod migrate;
pub mod search;
pub mod serve;

use anyhow::{Context, Result};
use postline_core::PostlineConfig;
use postline_server::db::create_pool_with_options;
use sqlx::PgPool;

/// Connect using the configured URL and pool size.
pub(crate) async fn connect(config: &PostlineConfig) -> Result<PgPool> {
    create_pool_with_options(&config.database.url, config.database.max_connections)
        .await
        .context("Failed to create database pool")
}
