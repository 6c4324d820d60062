//! Stats command - post counts per author and partition

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;
use tweet_archive_domain::Bucket;

use super::archive::open_backend;
use crate::args::StatsArgs;
use crate::config::AppConfig;

#[derive(Debug, Serialize)]
struct StatsReport {
    backend: &'static str,
    total: u64,
    authors: Vec<Bucket>,
    partitions: Vec<Bucket>,
}

pub async fn execute(args: StatsArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let backend = open_backend(&config).await?;

    let report = StatsReport {
        backend: backend.name(),
        total: backend.count().await.context("Failed to count posts")?,
        authors: backend
            .list_authors()
            .await
            .context("Failed to list authors")?,
        partitions: backend
            .list_partitions()
            .await
            .context("Failed to list partitions")?,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Backend: {}", report.backend);
    println!("Total posts: {}", report.total);
    println!();
    println!("Authors:");
    for bucket in &report.authors {
        println!("  {:>8}  {}", bucket.count, bucket.key);
    }
    println!();
    println!("Partitions:");
    for bucket in &report.partitions {
        println!("  {:>8}  {}", bucket.count, bucket.key);
    }

    Ok(())
}
