//! tweet-archive adapters crate
//!
//! This crate contains infrastructure adapters implementing the domain ports:
//! - `archive`: Search-index and SQLite archive backends
//! - `twitter`: Twitter API adapter for posts missing from the archive

mod archive_search;
mod archive_sqlite;
mod twitter_api;

/// Re-exports for archive backends
pub mod archive {
    pub use crate::archive_search::{SearchIndexArchive, SearchIndexConfig};
    pub use crate::archive_sqlite::{SCHEMA as SQLITE_SCHEMA, SqliteArchive, SqliteArchiveConfig};
}

/// Re-exports for the Twitter API adapter
pub mod twitter {
    pub use crate::twitter_api::{DEFAULT_API_BASE_URL, TwitterStatusFetcher, obtain_bearer_token};
}
