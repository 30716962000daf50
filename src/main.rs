//! CLI entry point for the mobile-feed renderer.

use std::fs;
use std::io::{self, IsTerminal, Read, Write};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use mobile_feed::config::TWITTER_TOKEN_ENV;
use mobile_feed::{MediaResolver, MemoryCache, Pipeline, build_default_media_resolver};
use tracing::{debug, info};

mod app_config;
mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (warn)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    // stdout carries the rendered JSON; logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let file_config = app_config::load_file_config(args.config.as_deref())?;
    let config = app_config::build_pipeline_config(
        &file_config,
        args.concurrency,
        std::env::var(TWITTER_TOKEN_ENV).ok(),
    )
    .context("Invalid configuration")?;
    debug!(?config, "configuration resolved");

    let cache = Arc::new(MemoryCache::new());
    let media = if args.no_lookups {
        info!("lookups disabled; embeds render with fallback fields");
        MediaResolver::new(cache).with_ttl(config.cache_ttl)
    } else {
        build_default_media_resolver(&config, cache)
    };
    let pipeline = Pipeline::new(Arc::new(media)).with_concurrency(config.concurrency);

    let input = read_article_input(&args)?;
    let article = Pipeline::parse_article(&input).context("Cannot read article")?;
    info!(article_id = article.id, "rendering article");

    let envelope = pipeline.render(&article).await;
    let json = if args.pretty {
        serde_json::to_string_pretty(&envelope)
    } else {
        serde_json::to_string(&envelope)
    }
    .context("Failed to encode envelope")?;

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{json}").context("Failed to write output")?;
    Ok(())
}

fn read_article_input(args: &Args) -> Result<String> {
    if let Some(path) = args.article_path() {
        return fs::read_to_string(path)
            .with_context(|| format!("Failed to read article file '{}'", path.display()));
    }

    if io::stdin().is_terminal() {
        bail!("No article provided. Pass a JSON file or pipe one via stdin.");
    }
    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .context("Failed to read article from stdin")?;
    Ok(buffer)
}
