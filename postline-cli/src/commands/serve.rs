//! HTTP server command

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Parser;
use postline_core::PostlineConfig;
use postline_server::db::migrations;
use postline_server::run_server;

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to (overrides config)
    #[arg(long, short = 'b')]
    pub bind: Option<SocketAddr>,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,

    /// Database URL (overrides config)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Skip schema creation on startup
    #[arg(long)]
    pub no_migrate: bool,
}

/// Run the HTTP server until ctrl-c or SIGTERM
pub async fn run_serve(args: ServeArgs, mut config: PostlineConfig) -> Result<()> {
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    if args.cors_permissive {
        config.server.cors_permissive = true;
    }
    if let Some(url) = args.database_url {
        config.database.url = url;
    }
    config.validate().context("Invalid configuration")?;

    let pool = super::connect(&config).await?;
    if !args.no_migrate {
        migrations::run(&pool)
            .await
            .context("Failed to apply database schema")?;
    }

    run_server(pool, &config).await.context("Server error")?;
    Ok(())
}
