//! postline CLI - run and inspect the postline backend
//!
//! - `serve`: run the HTTP API
//! - `migrate`: create or update the database schema
//! - `search`: resolve a search filter, optionally against the database
//! - `config`: show the effective configuration or its file path

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use postline_core::PostlineConfig;

mod commands;
mod tracing_setup;

use tracing_setup::TracingConfig;

#[derive(Parser, Debug)]
#[command(
    name = "postline",
    author,
    version,
    about = "Social posting backend with slash-delimited post search"
)]
struct Cli {
    /// Enable debug logging (RUST_LOG still wins when set)
    #[arg(long, global = true)]
    debug: bool,

    /// Config file (default: ~/.postline/config.toml)
    #[arg(long, short = 'c', global = true, env = "POSTLINE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API server
    Serve(commands::serve::ServeArgs),
    /// Create or update the database schema
    Migrate(commands::migrate::MigrateArgs),
    /// Resolve a search filter like `alice/2023-08-29/-5`
    Search(commands::search::SearchArgs),
    /// Inspect configuration
    Config(commands::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    tracing_setup::init_tracing(&TracingConfig { debug: cli.debug }).ok();

    match cli.command {
        Commands::Serve(args) => {
            let config = load_config(cli.config.as_deref())?;
            commands::serve::run_serve(args, config).await?
        }
        Commands::Migrate(args) => {
            let config = load_config(cli.config.as_deref())?;
            commands::migrate::run_migrate(args, &config).await?
        }
        Commands::Search(args) => {
            let config = load_config(cli.config.as_deref())?;
            commands::search::run_search(args, &config).await?
        }
        Commands::Config(args) => commands::config::run_config(args, cli.config.as_deref())?,
    }
    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> Result<PostlineConfig> {
    PostlineConfig::load(path).context("Failed to load configuration")
}
