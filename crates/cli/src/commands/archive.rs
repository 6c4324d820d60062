//! Builds backends, the external-fetch cache and the renderer from configuration

use anyhow::{Context, Result, bail};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use std::time::Duration;
use tweet_archive_adapters::archive::{
    SearchIndexArchive, SearchIndexConfig, SqliteArchive, SqliteArchiveConfig,
};
use tweet_archive_adapters::twitter::{TwitterStatusFetcher, obtain_bearer_token};
use tweet_archive_domain::ArchiveBackend;
use tweet_archive_domain::usecases::{
    ExternalFetchCache, LinkConfig, MediaStrategy, MirrorRule, RenderConfig,
};

use crate::config::AppConfig;

/// Open the configured archive backend
pub async fn open_backend(config: &AppConfig) -> Result<Box<dyn ArchiveBackend>> {
    let timeout = Duration::from_secs(config.general.query_timeout_secs);

    let backend: Box<dyn ArchiveBackend> = match config.general.backend.as_str() {
        "search_index" => Box::new(
            SearchIndexArchive::new(SearchIndexConfig {
                host: config.search_index.host.clone(),
                index: config.search_index.index.clone(),
                aggregation_size: config.search_index.aggregation_size,
                page_size: config.general.page_size,
                timeout,
            })
            .context("Failed to initialize search index backend")?,
        ),
        "sqlite" => Box::new(
            SqliteArchive::open(
                &config.sqlite.path,
                SqliteArchiveConfig {
                    partition: config.sqlite.partition.clone(),
                    page_size: config.general.page_size,
                    query_timeout: timeout,
                },
            )
            .await
            .context("Failed to open SQLite archive")?,
        ),
        other => bail!(
            "Unknown backend: {} (expected search_index or sqlite)",
            other
        ),
    };

    tracing::debug!(backend = backend.name(), "Archive backend ready");
    Ok(backend)
}

/// Build the external-fetch cache, if fetching from the origin platform is enabled
pub async fn external_cache(config: &AppConfig) -> Result<Option<ExternalFetchCache>> {
    let external = &config.external;
    if !external.enabled {
        return Ok(None);
    }

    let timeout = Duration::from_secs(external.timeout_secs);
    let token = match read_secret(&external.bearer_token_env) {
        Some(token) => token,
        None => {
            let key = read_secret(&external.consumer_key_env);
            let secret = read_secret(&external.consumer_secret_env);
            let (Some(key), Some(secret)) = (key, secret) else {
                bail!(
                    "External posts are enabled but neither {} nor {}/{} are set",
                    external.bearer_token_env,
                    external.consumer_key_env,
                    external.consumer_secret_env
                );
            };
            obtain_bearer_token(
                &external.api_base_url,
                key.expose_secret(),
                &secret,
                timeout,
            )
            .await
            .context("Failed to obtain bearer token")?
        }
    };

    let fetcher = TwitterStatusFetcher::with_base_url(token, external.api_base_url.clone(), timeout)
        .context("Failed to initialize Twitter client")?;

    Ok(Some(ExternalFetchCache::new(
        Arc::new(fetcher),
        external.cache_capacity,
    )))
}

fn read_secret(env_var: &str) -> Option<SecretString> {
    if env_var.trim().is_empty() {
        return None;
    }
    std::env::var(env_var)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(|value| SecretString::new(value.into()))
}

/// Media strategy selected by `media.from`
pub fn media_strategy(config: &AppConfig) -> Result<MediaStrategy> {
    let media = &config.media;
    let strategy = match media.from.as_str() {
        "direct" => MediaStrategy::Direct,
        "mirror" => {
            if media.mirrors.is_empty() {
                bail!("media.from = \"mirror\" requires at least one [[media.mirrors]] entry");
            }
            MediaStrategy::Mirror(
                media
                    .mirrors
                    .iter()
                    .map(|m| MirrorRule {
                        from: m.from.clone(),
                        to: m.to.clone(),
                    })
                    .collect(),
            )
        }
        "filesystem" => MediaStrategy::Filesystem {
            route: media.filesystem_route.clone(),
        },
        "object_storage" => {
            let storage = &media.object_storage;
            if storage.bucket.is_empty() || storage.region.is_empty() {
                bail!("media.from = \"object_storage\" requires media.object_storage.bucket and region");
            }
            MediaStrategy::ObjectStorage {
                bucket: storage.bucket.clone(),
                region: storage.region.clone(),
                template: storage.template.clone(),
            }
        }
        "hotlink_base" => {
            if media.hotlink_base.is_empty() {
                bail!("media.from = \"hotlink_base\" requires media.hotlink_base");
            }
            MediaStrategy::HotlinkBase {
                base_url: media.hotlink_base.clone(),
            }
        }
        other => bail!("Unknown media source: {}", other),
    };
    Ok(strategy)
}

pub fn render_config(config: &AppConfig) -> Result<RenderConfig> {
    Ok(RenderConfig {
        links: LinkConfig {
            local_base: config.links.local_base.clone(),
            twitter_base: config.links.twitter_base.clone(),
        },
        media: media_strategy(config)?,
        timestamp_pattern: config.general.timestamp_pattern.clone(),
    })
}
