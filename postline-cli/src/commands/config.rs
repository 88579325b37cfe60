//! Config inspection command

use std::path::Path;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use postline_core::PostlineConfig;

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective configuration with secrets redacted
    Show,
    /// Show config file path
    Path,
    /// Check the effective configuration for invalid values
    Validate,
}

pub fn run_config(args: ConfigArgs, path: Option<&Path>) -> Result<()> {
    match args.command {
        ConfigCommands::Show => run_show(path),
        ConfigCommands::Path => run_path(path),
        ConfigCommands::Validate => run_validate(path),
    }
}

fn run_show(path: Option<&Path>) -> Result<()> {
    let config = PostlineConfig::load(path).context("Failed to load configuration")?;
    print!("{}", config.redacted().to_toml()?);
    Ok(())
}

fn run_path(path: Option<&Path>) -> Result<()> {
    let path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(PostlineConfig::config_path);
    println!("{}", path.display());
    Ok(())
}

fn run_validate(path: Option<&Path>) -> Result<()> {
    let config = PostlineConfig::load(path).context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;
    println!("Configuration is valid");
    Ok(())
}
