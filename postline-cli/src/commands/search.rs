//! Search command
//!
//! Without `--run` this only parses and resolves the filter, which needs no
//! database and is handy for checking what a URL path will match.

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::Parser;
use postline_core::{PostlineConfig, SearchFilter};
use postline_server::db::PostRepo;
use serde_json::json;

#[derive(Parser, Debug)]
pub struct SearchArgs {
    /// Filter in `[@]username/YYYY-MM-DD/days` form; empty matches everything
    #[arg(default_value = "", allow_hyphen_values = true)]
    pub filter: String,

    /// Date used as "today" (YYYY-MM-DD); defaults to the current UTC date
    #[arg(long)]
    pub today: Option<NaiveDate>,

    /// Execute the search against the database and print matching posts
    #[arg(long)]
    pub run: bool,

    /// Database URL (overrides config)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,
}

pub async fn run_search(args: SearchArgs, config: &PostlineConfig) -> Result<()> {
    let today = args.today.unwrap_or_else(|| Utc::now().date_naive());
    let filter = SearchFilter::parse(&args.filter);
    let query = filter
        .resolve(today)
        .with_context(|| format!("Cannot resolve search filter '{}'", args.filter))?;

    if !args.run {
        let out = json!({
            "filter": filter,
            "today": today,
            "query": query,
            "days_covered": query.range.map(|r| r.len_days()).unwrap_or(0),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let mut config = config.clone();
    if let Some(url) = args.database_url {
        config.database.url = url;
    }
    let pool = super::connect(&config).await?;
    let posts = PostRepo::new(&pool).search(&query).await?;
    tracing::debug!(count = posts.len(), "search finished");

    for post in posts {
        let line = json!({
            "post_id": post.id,
            "post_text": post.text,
            "username": post.username,
            "created_at": post.created_at.to_rfc3339(),
        });
        println!("{}", line);
    }
    Ok(())
}
