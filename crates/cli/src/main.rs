//! tweet-archive CLI entry point

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod args;
mod commands;
mod config;

use args::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; the flag wins over the config file
    let log_level = match &cli.log_level {
        Some(level) => level.clone(),
        None => crate::config::AppConfig::load(cli.config.as_deref())
            .map(|c| c.general.log_level)
            .unwrap_or_else(|_| "info".to_string()),
    };
    init_logging(&log_level)?;

    match cli.command {
        Commands::Show(args) => commands::show::execute(args, cli.config).await,
        Commands::Search(args) => commands::search::execute(args, cli.config).await,
        Commands::Latest(args) => commands::latest::execute(args, cli.config).await,
        Commands::Ids(args) => commands::ids::execute(args, cli.config).await,
        Commands::Stats(args) => commands::stats::execute(args, cli.config).await,
        Commands::Config(args) => commands::config::execute(args).await,
        Commands::Doctor(args) => commands::doctor::execute(args, cli.config).await,
    }
}

fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();

    Ok(())
}
