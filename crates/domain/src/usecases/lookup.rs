//! Post lookup use case - archive first, then the origin platform

use futures::{StreamExt, TryStreamExt};

use crate::model::{LoadedPost, Post, PostOrigin, SearchQuery};
use crate::ports::{ArchiveBackend, ArchiveError};
use crate::usecases::cache::ExternalFetchCache;
use crate::usecases::normalize::normalize;

/// Reads posts through a backend, falling back to the external-fetch cache
/// for posts the archive does not hold.
///
/// Constructed per request around that request's backend handle.
pub struct PostReader<'a> {
    backend: &'a dyn ArchiveBackend,
    external: Option<&'a ExternalFetchCache>,
}

impl<'a> PostReader<'a> {
    pub fn new(backend: &'a dyn ArchiveBackend) -> Self {
        Self {
            backend,
            external: None,
        }
    }

    /// Enable the fallback to the origin platform
    pub fn with_external(mut self, cache: &'a ExternalFetchCache) -> Self {
        self.external = Some(cache);
        self
    }

    /// Load one post; `NotFound` propagates unless external fetching is enabled
    pub async fn get(&self, id: &str) -> Result<LoadedPost, ArchiveError> {
        match self.backend.get(id).await {
            Ok(post) => Ok(LoadedPost {
                post,
                origin: PostOrigin::Archive,
            }),
            Err(ArchiveError::NotFound(missing)) => match self.external {
                Some(cache) => {
                    tracing::debug!(id = %id, backend = self.backend.name(), "Not archived, trying origin platform");
                    let raw = cache.get(id).await?;
                    Ok(LoadedPost {
                        post: normalize(raw, None)?,
                        origin: PostOrigin::External,
                    })
                }
                None => Err(ArchiveError::NotFound(missing)),
            },
            Err(e) => Err(e),
        }
    }

    /// Newest posts, optionally limited to one author
    pub async fn latest(
        &self,
        limit: usize,
        default_user: Option<&str>,
    ) -> Result<Vec<Post>, ArchiveError> {
        if let Some(user) = default_user.filter(|u| !u.is_empty()) {
            let query = SearchQuery::new("*").with_user(user).with_limit(limit);
            return self.backend.search(&query).await;
        }

        let ids: Vec<_> = self
            .backend
            .iter_descending()
            .take(limit)
            .try_collect()
            .await?;

        let mut posts = Vec::with_capacity(ids.len());
        for id in ids {
            posts.push(self.backend.get(&id.to_string()).await?);
        }
        Ok(posts)
    }
}
