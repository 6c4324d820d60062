//! Show command - display a single post

use anyhow::{Context, Result};
use std::path::PathBuf;
use tweet_archive_domain::usecases::{PostReader, Renderer};

use super::archive::{external_cache, open_backend, render_config};
use super::output;
use crate::args::{OutputFormat, ShowArgs};
use crate::config::AppConfig;

pub async fn execute(args: ShowArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let backend = open_backend(&config).await?;
    let cache = external_cache(&config).await?;

    let mut reader = PostReader::new(backend.as_ref());
    if let Some(cache) = &cache {
        reader = reader.with_external(cache);
    }

    let loaded = reader
        .get(&args.id)
        .await
        .with_context(|| format!("Failed to load post {}", args.id))?;

    tracing::debug!(id = %args.id, origin = ?loaded.origin, "Loaded post");

    match args.format {
        OutputFormat::Txt => print!("{}", output::post_text(&loaded.post)),
        OutputFormat::Json => {
            let json = serde_json::to_string(&loaded.post).context("Failed to serialize post")?;
            println!("{}", json);
        }
        OutputFormat::Html => {
            let renderer = Renderer::new(render_config(&config)?);
            print!("{}", output::post_html(&renderer.render(&loaded)));
        }
    }

    Ok(())
}
