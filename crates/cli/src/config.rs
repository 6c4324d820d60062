//! Configuration loading and management

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub search_index: SearchIndexSection,

    #[serde(default)]
    pub sqlite: SqliteSection,

    #[serde(default)]
    pub media: MediaConfig,

    #[serde(default)]
    pub external: ExternalConfig,

    #[serde(default)]
    pub links: LinksConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// `search_index` or `sqlite`
    #[serde(default = "default_backend")]
    pub backend: String,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Author shown by `latest` when set
    #[serde(default)]
    pub default_user: Option<String>,

    #[serde(default = "default_page_size")]
    pub page_size: u32,

    #[serde(default = "default_query_timeout")]
    pub query_timeout_secs: u64,

    /// `time` format description for rendered timestamps
    #[serde(default = "default_timestamp_pattern")]
    pub timestamp_pattern: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchIndexSection {
    #[serde(default = "default_search_host")]
    pub host: String,

    #[serde(default = "default_search_index")]
    pub index: String,

    #[serde(default = "default_aggregation_size")]
    pub aggregation_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqliteSection {
    #[serde(default = "default_sqlite_path")]
    pub path: PathBuf,

    /// Name reported as the only partition
    #[serde(default = "default_sqlite_partition")]
    pub partition: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// direct, mirror, filesystem, object_storage or hotlink_base
    #[serde(default = "default_media_from")]
    pub from: String,

    #[serde(default)]
    pub mirrors: Vec<MirrorConfig>,

    #[serde(default = "default_filesystem_route")]
    pub filesystem_route: String,

    #[serde(default)]
    pub object_storage: ObjectStorageConfig,

    #[serde(default)]
    pub hotlink_base: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorConfig {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectStorageConfig {
    #[serde(default)]
    pub bucket: String,

    #[serde(default)]
    pub region: String,

    #[serde(default = "default_object_storage_template")]
    pub template: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalConfig {
    /// Fetch posts missing from the archive from the Twitter API
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_bearer_token_env")]
    pub bearer_token_env: String,

    #[serde(default = "default_consumer_key_env")]
    pub consumer_key_env: String,

    #[serde(default = "default_consumer_secret_env")]
    pub consumer_secret_env: String,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    #[serde(default = "default_external_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinksConfig {
    #[serde(default = "default_local_base")]
    pub local_base: String,

    #[serde(default = "default_twitter_base")]
    pub twitter_base: String,
}

// Default value functions
fn default_backend() -> String {
    "search_index".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_page_size() -> u32 {
    1000
}

fn default_query_timeout() -> u64 {
    10
}

fn default_timestamp_pattern() -> String {
    tweet_archive_domain::usecases::render::DEFAULT_TIMESTAMP_PATTERN.to_string()
}

fn default_search_host() -> String {
    "http://localhost:9200".to_string()
}

fn default_search_index() -> String {
    "tweets-*,toots-*".to_string()
}

fn default_aggregation_size() -> u32 {
    100
}

fn default_sqlite_path() -> PathBuf {
    PathBuf::from("./tweets.db")
}

fn default_sqlite_partition() -> String {
    "tweets".to_string()
}

fn default_media_from() -> String {
    "direct".to_string()
}

fn default_filesystem_route() -> String {
    "/tweet/media".to_string()
}

fn default_object_storage_template() -> String {
    tweet_archive_domain::usecases::media::DEFAULT_OBJECT_STORAGE_TEMPLATE.to_string()
}

fn default_bearer_token_env() -> String {
    "TWITTER_BEARER_TOKEN".to_string()
}

fn default_consumer_key_env() -> String {
    "TWITTER_CONSUMER_KEY".to_string()
}

fn default_consumer_secret_env() -> String {
    "TWITTER_CONSUMER_SECRET".to_string()
}

fn default_api_base_url() -> String {
    tweet_archive_adapters::twitter::DEFAULT_API_BASE_URL.to_string()
}

fn default_cache_capacity() -> usize {
    tweet_archive_domain::usecases::DEFAULT_EXTERNAL_CACHE_CAPACITY
}

fn default_external_timeout() -> u64 {
    30
}

fn default_local_base() -> String {
    "/tweet".to_string()
}

fn default_twitter_base() -> String {
    "https://twitter.com".to_string()
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            log_level: default_log_level(),
            default_user: None,
            page_size: default_page_size(),
            query_timeout_secs: default_query_timeout(),
            timestamp_pattern: default_timestamp_pattern(),
        }
    }
}

impl Default for SearchIndexSection {
    fn default() -> Self {
        Self {
            host: default_search_host(),
            index: default_search_index(),
            aggregation_size: default_aggregation_size(),
        }
    }
}

impl Default for SqliteSection {
    fn default() -> Self {
        Self {
            path: default_sqlite_path(),
            partition: default_sqlite_partition(),
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            from: default_media_from(),
            mirrors: vec![],
            filesystem_route: default_filesystem_route(),
            object_storage: ObjectStorageConfig::default(),
            hotlink_base: String::new(),
        }
    }
}

impl Default for ObjectStorageConfig {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            region: String::new(),
            template: default_object_storage_template(),
        }
    }
}

impl Default for ExternalConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bearer_token_env: default_bearer_token_env(),
            consumer_key_env: default_consumer_key_env(),
            consumer_secret_env: default_consumer_secret_env(),
            api_base_url: default_api_base_url(),
            cache_capacity: default_cache_capacity(),
            timeout_secs: default_external_timeout(),
        }
    }
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            local_base: default_local_base(),
            twitter_base: default_twitter_base(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        // Try default config path if none specified
        let default_path = PathBuf::from("./config.toml");
        let path = config_path.unwrap_or(&default_path);

        if path.exists() {
            builder = builder.add_source(config::File::from(path));
        } else if config_path.is_some() {
            anyhow::bail!("Config file not found: {}", path.display());
        }

        builder = builder.add_source(
            config::Environment::with_prefix("TWEET_ARCHIVE")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Generate example configuration as TOML string
    pub fn example_toml() -> String {
        r#"# tweet-archive configuration

[general]
backend = "search_index"  # search_index, sqlite
log_level = "info"
# Author shown by `latest`
# default_user = "jack"
page_size = 1000
query_timeout_secs = 10
timestamp_pattern = "[year]-[month]-[day] [hour]:[minute]:[second] [offset_hour sign:mandatory][offset_minute]"

[search_index]
host = "http://localhost:9200"
index = "tweets-*,toots-*"
aggregation_size = 100

[sqlite]
path = "./tweets.db"
partition = "tweets"

[media]
from = "direct"  # direct, mirror, filesystem, object_storage, hotlink_base
filesystem_route = "/tweet/media"
# hotlink_base = "https://media.example.com"

# Domain substitutions, first match wins
[[media.mirrors]]
from = "pbs.twimg.com"
to = "d1111111111.cloudfront.net/pbs.twimg.com"

[[media.mirrors]]
from = "video.twimg.com"
to = "d1111111111.cloudfront.net/video.twimg.com"

[media.object_storage]
bucket = ""
region = ""
template = "https://{bucket}.s3.{region}.amazonaws.com/{filename}"

[external]
enabled = false
bearer_token_env = "TWITTER_BEARER_TOKEN"
# Used to obtain a bearer token when none is set
consumer_key_env = "TWITTER_CONSUMER_KEY"
consumer_secret_env = "TWITTER_CONSUMER_SECRET"
api_base_url = "https://api.twitter.com"
cache_capacity = 1024
timeout_secs = 30

[links]
local_base = "/tweet"
twitter_base = "https://twitter.com"
"#
        .to_string()
    }
}
