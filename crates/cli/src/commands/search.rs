//! Search command - keyword search over the archive

use anyhow::{Context, Result};
use std::path::PathBuf;
use tweet_archive_domain::usecases::Renderer;
use tweet_archive_domain::{LoadedPost, PostOrigin, SearchQuery};

use super::archive::{open_backend, render_config};
use super::output;
use crate::args::{OutputFormat, SearchArgs};
use crate::config::AppConfig;

pub async fn execute(args: SearchArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let backend = open_backend(&config).await?;

    let query = SearchQuery::new(args.keyword)
        .with_user(args.user.unwrap_or_default())
        .with_index(args.index.unwrap_or_default())
        .with_limit(args.limit);

    let posts = backend
        .search(&query)
        .await
        .with_context(|| format!("Search for '{}' failed", query.keyword))?;

    tracing::info!(keyword = %query.keyword, hits = posts.len(), "Search finished");

    match args.format {
        OutputFormat::Txt => {
            for post in &posts {
                println!("{}", output::post_text(post));
            }
        }
        OutputFormat::Json => {
            let json = serde_json::to_string(&posts).context("Failed to serialize posts")?;
            println!("{}", json);
        }
        OutputFormat::Html => {
            let renderer = Renderer::new(render_config(&config)?);
            for post in posts {
                let view = renderer.render(&LoadedPost {
                    post,
                    origin: PostOrigin::Archive,
                });
                print!("{}", output::post_html(&view));
            }
        }
    }

    Ok(())
}
