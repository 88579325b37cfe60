//! Schema command

use anyhow::{Context, Result};
use clap::Parser;
use postline_core::PostlineConfig;
use postline_server::db::migrations;

#[derive(Parser, Debug)]
pub struct MigrateArgs {
    /// Database URL (overrides config)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,
}

pub async fn run_migrate(args: MigrateArgs, config: &PostlineConfig) -> Result<()> {
    let mut config = config.clone();
    if let Some(url) = args.database_url {
        config.database.url = url;
    }

    let pool = super::connect(&config).await?;
    migrations::run(&pool)
        .await
        .context("Failed to apply database schema")?;

    tracing::info!("schema is up to date");
    println!("Schema is up to date");
    Ok(())
}
