//! Port definitions (traits) for external dependencies
//!
//! These traits define the boundaries between the domain and the storage
//! engines or remote platforms. Adapters implement them.

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use crate::model::{Bucket, Post, PostId, SearchQuery, SortOrder};

/// Error type for normalizing raw records
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("Record is not a JSON object")]
    NotAnObject,
    #[error("Foreign record is missing field '{0}'")]
    MissingField(&'static str),
    #[error("Record does not match the canonical schema: {0}")]
    Schema(String),
}

/// Error type for archive backend operations
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Post not found: {0}")]
    NotFound(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Upstream returned HTTP {status}: {message}")]
    Upstream { status: u16, message: String },
    #[error("Malformed record: {0}")]
    Malformed(#[from] NormalizeError),
    #[error("Backend error: {0}")]
    Backend(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Timed out after {0:?}")]
    Timeout(Duration),
}

/// Read-only query interface over an archive of posts
///
/// Implemented identically by every storage engine so that the rendering
/// pipeline never needs to know which one is in use.
#[async_trait]
pub trait ArchiveBackend: Send + Sync {
    /// Exact lookup by primary key
    async fn get(&self, id: &str) -> Result<Post, ArchiveError>;

    /// All ids ordered by timestamp, fetched page by page
    ///
    /// Every call yields a fresh finite stream whose length equals `count()`.
    /// Dropping the stream early is allowed.
    fn ids(&self, order: SortOrder) -> BoxStream<'_, Result<PostId, ArchiveError>>;

    /// Ids oldest first
    fn iter_ascending(&self) -> BoxStream<'_, Result<PostId, ArchiveError>> {
        self.ids(SortOrder::Ascending)
    }

    /// Ids newest first, the exact reverse of `iter_ascending`
    fn iter_descending(&self) -> BoxStream<'_, Result<PostId, ArchiveError>> {
        self.ids(SortOrder::Descending)
    }

    /// Total number of posts
    async fn count(&self) -> Result<u64, ArchiveError>;

    /// AND-of-tokens keyword search, newest first, truncated to `query.limit`
    async fn search(&self, query: &SearchQuery) -> Result<Vec<Post>, ArchiveError>;

    /// Distinct authors with their post counts
    async fn list_authors(&self) -> Result<Vec<Bucket>, ArchiveError>;

    /// Distinct partitions with their post counts
    async fn list_partitions(&self) -> Result<Vec<Bucket>, ArchiveError>;

    /// Backend name for logs and diagnostics (e.g., "sqlite")
    fn name(&self) -> &'static str;
}

/// Error type for fetching posts from the origin platform
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Remote returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Authentication failed: {0}")]
    Auth(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Invalid response: {0}")]
    Decode(String),
}

impl From<FetchError> for ArchiveError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Status { status, body } => ArchiveError::Upstream {
                status,
                message: body,
            },
            FetchError::Auth(msg) => ArchiveError::Upstream {
                status: 401,
                message: msg,
            },
            FetchError::Network(msg) => ArchiveError::Network(msg),
            FetchError::Decode(msg) => ArchiveError::Backend(msg),
        }
    }
}

/// Port for fetching a single post by id from the origin platform
#[async_trait]
pub trait StatusFetcher: Send + Sync {
    /// Fetch the raw record of a post
    async fn fetch_status(&self, id: &str) -> Result<Value, FetchError>;
}
