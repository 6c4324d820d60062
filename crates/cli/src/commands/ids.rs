//! Ids command - stream post ids in timestamp order

use anyhow::{Context, Result};
use futures::{StreamExt, TryStreamExt};
use std::io::{self, Write};
use std::path::PathBuf;

use super::archive::open_backend;
use crate::args::IdsArgs;
use crate::config::AppConfig;

pub async fn execute(args: IdsArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let backend = open_backend(&config).await?;

    let ids = if args.desc {
        backend.iter_descending()
    } else {
        backend.iter_ascending()
    };
    let mut ids = ids.take(args.limit.unwrap_or(usize::MAX));

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut written = 0usize;
    while let Some(id) = ids.try_next().await.context("Failed to list post ids")? {
        writeln!(out, "{}", id)?;
        written += 1;
    }

    tracing::debug!(written, descending = args.desc, "Listed ids");
    Ok(())
}
