//! Config command - writes a starter configuration

use anyhow::{Context, Result, bail};
use std::fs;
use std::path::Path;

use crate::args::{ConfigArgs, ConfigCommands};
use crate::config::AppConfig;

pub async fn execute(args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Init { path, force } => {
            write_example(&path, force)?;
            print_next_steps(&path);
            Ok(())
        }
    }
}

fn write_example(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    fs::write(path, AppConfig::example_toml())
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;
    tracing::debug!(path = %path.display(), "Wrote example config");
    Ok(())
}

fn print_next_steps(path: &Path) {
    println!("Created config file: {}", path.display());
    println!();
    println!("Next steps:");
    println!("  1. Set general.backend and fill in [search_index] or [sqlite]");
    println!("  2. Pick how media is served under [media]");
    println!("  3. Optionally enable [external] and export the Twitter credentials it names");
    println!("     (any key can also be overridden as TWEET_ARCHIVE__<SECTION>__<KEY>)");
    println!(
        "  4. Run 'tweet-archive --config {} doctor' to validate your setup",
        path.display()
    );
}
