//! Latest command - newest posts in the archive

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;
use tweet_archive_domain::Post;
use tweet_archive_domain::usecases::PostReader;

use super::archive::open_backend;
use super::output;
use crate::args::LatestArgs;
use crate::config::AppConfig;

#[derive(Serialize)]
struct LatestReport<'a> {
    total: u64,
    posts: &'a [Post],
}

pub async fn execute(args: LatestArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let backend = open_backend(&config).await?;

    let total = backend.count().await.context("Failed to count posts")?;
    let posts = PostReader::new(backend.as_ref())
        .latest(args.limit, config.general.default_user.as_deref())
        .await
        .context("Failed to load latest posts")?;

    if args.json {
        let report = LatestReport {
            total,
            posts: &posts,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{} posts archived", total);
    println!();
    for post in &posts {
        println!("{}", output::post_text(post));
    }

    Ok(())
}
