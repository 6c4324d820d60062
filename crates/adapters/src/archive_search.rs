//! Search-index archive backend (Elasticsearch-compatible REST API)
//!
//! Every document is a raw post stored under its post id. Partitions are the
//! concrete indices matched by the configured index name or pattern.

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::time::Duration;
use tweet_archive_domain::usecases::normalize;
use tweet_archive_domain::{
    ArchiveBackend, ArchiveError, Bucket, Post, PostId, SearchQuery, SortOrder,
};

const PIT_KEEP_ALIVE: &str = "1m";
const SEARCH_FIELDS: [&str; 4] = [
    "text",
    "full_text",
    "content_text",
    "media_attachments.description",
];

/// Configuration for the search-index backend
#[derive(Debug, Clone)]
pub struct SearchIndexConfig {
    /// Base URL, e.g. `http://localhost:9200`
    pub host: String,
    /// Index name or pattern, e.g. `tweets-*`
    pub index: String,
    /// Bucket count requested per terms aggregation
    pub aggregation_size: u32,
    /// Ids fetched per page while iterating
    pub page_size: u32,
    pub timeout: Duration,
}

impl Default for SearchIndexConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost:9200".to_string(),
            index: "tweets-*".to_string(),
            aggregation_size: 100,
            page_size: 1000,
            timeout: Duration::from_secs(10),
        }
    }
}

/// Archive backed by a search index
pub struct SearchIndexArchive {
    client: Client,
    config: SearchIndexConfig,
}

impl SearchIndexArchive {
    pub fn new(config: SearchIndexConfig) -> Result<Self, ArchiveError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ArchiveError::Backend(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config: SearchIndexConfig {
                host: config.host.trim_end_matches('/').to_string(),
                ..config
            },
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.host, path.trim_start_matches('/'))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ArchiveError> {
        let response = request.send().await.map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ArchiveError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| ArchiveError::Backend(format!("Invalid search response: {}", e)))
    }

    fn transport_error(&self, err: reqwest::Error) -> ArchiveError {
        if err.is_timeout() {
            ArchiveError::Timeout(self.config.timeout)
        } else {
            ArchiveError::Network(err.to_string())
        }
    }

    async fn search_hits(&self, index: &str, body: Value) -> Result<Vec<Hit>, ArchiveError> {
        let url = self.url(&format!("{}/_search", index));
        let response: SearchResponse = self.send(self.client.post(&url).json(&body)).await?;
        Ok(response.hits.hits)
    }

    fn decode(hit: Hit) -> Result<Post, ArchiveError> {
        let source = hit.source.ok_or_else(|| {
            ArchiveError::Backend(format!("Document {} returned without source", hit.id))
        })?;
        Ok(normalize(source, Some(&hit.index))?)
    }

    async fn open_pit(&self) -> Result<String, ArchiveError> {
        let url = self.url(&format!("{}/_pit", self.config.index));
        let pit: PitResponse = self
            .send(self.client.post(&url).query(&[("keep_alive", PIT_KEEP_ALIVE)]))
            .await?;
        tracing::trace!(index = %self.config.index, "Opened point in time");
        Ok(pit.id)
    }

    async fn close_pit(&self, pit_id: &str) {
        let result = self
            .client
            .delete(self.url("_pit"))
            .json(&json!({ "id": pit_id }))
            .send()
            .await;
        if let Err(e) = result {
            // The point in time expires on its own after the keep-alive
            tracing::debug!(error = %e, "Failed to close point in time");
        }
    }

    async fn next_page(
        &self,
        pit_id: String,
        search_after: Option<Vec<Value>>,
        order: SortOrder,
    ) -> Result<Option<(Vec<PostId>, PageState)>, ArchiveError> {
        let dir = order.as_str();
        let missing = match order {
            SortOrder::Ascending => "_first",
            SortOrder::Descending => "_last",
        };
        let mut body = json!({
            "size": self.config.page_size.max(1),
            "pit": { "id": pit_id, "keep_alive": PIT_KEEP_ALIVE },
            "sort": [
                { "@timestamp": { "order": dir, "missing": missing } },
                { "_shard_doc": dir }
            ],
            "_source": false,
            "track_total_hits": false
        });
        if let Some(after) = search_after {
            body["search_after"] = Value::Array(after);
        }

        let response: SearchResponse = self
            .send(self.client.post(self.url("_search")).json(&body))
            .await?;
        let pit_id = response.pit_id.unwrap_or(pit_id);
        let hits = response.hits.hits;
        tracing::trace!(hits = hits.len(), "Fetched id page");

        if hits.is_empty() {
            self.close_pit(&pit_id).await;
            return Ok(None);
        }

        let search_after = hits.last().and_then(|hit| hit.sort.clone());
        let exhausted = hits.len() < self.config.page_size.max(1) as usize;
        let ids = hits.iter().map(|hit| PostId::parse(&hit.id)).collect();

        let next = match search_after {
            Some(after) if !exhausted => PageState::Open {
                pit_id,
                search_after: Some(after),
            },
            _ => {
                self.close_pit(&pit_id).await;
                PageState::Done
            }
        };
        Ok(Some((ids, next)))
    }

    async fn terms(&self, field: &str) -> Result<Vec<Bucket>, ArchiveError> {
        let mut aggregations = self.aggregate(&[("terms", field)]).await?;
        Ok(aggregations.remove("terms").unwrap_or_default())
    }

    async fn aggregate(
        &self,
        fields: &[(&str, &str)],
    ) -> Result<HashMap<String, Vec<Bucket>>, ArchiveError> {
        let aggs: serde_json::Map<String, Value> = fields
            .iter()
            .map(|(name, field)| {
                (
                    name.to_string(),
                    json!({ "terms": { "field": field, "size": self.config.aggregation_size } }),
                )
            })
            .collect();
        let body = json!({ "size": 0, "aggs": aggs });

        let url = self.url(&format!("{}/_search", self.config.index));
        let response: AggregationResponse = self.send(self.client.post(&url).json(&body)).await?;

        Ok(response
            .aggregations
            .into_iter()
            .map(|(name, agg)| {
                let buckets = agg
                    .buckets
                    .into_iter()
                    .map(|b| Bucket {
                        key: match b.key {
                            Value::String(s) => s,
                            other => other.to_string(),
                        },
                        count: b.doc_count,
                    })
                    .collect();
                (name, buckets)
            })
            .collect())
    }
}

enum PageState {
    Start,
    Open {
        pit_id: String,
        search_after: Option<Vec<Value>>,
    },
    Done,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    pit_id: Option<String>,
    hits: Hits,
}

#[derive(Deserialize)]
struct Hits {
    hits: Vec<Hit>,
}

#[derive(Deserialize)]
struct Hit {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_index", default)]
    index: String,
    #[serde(rename = "_source", default)]
    source: Option<Value>,
    #[serde(default)]
    sort: Option<Vec<Value>>,
}

#[derive(Deserialize)]
struct PitResponse {
    id: String,
}

#[derive(Deserialize)]
struct CountResponse {
    count: u64,
}

#[derive(Deserialize)]
struct AggregationResponse {
    #[serde(default)]
    aggregations: HashMap<String, TermsAggregation>,
}

#[derive(Deserialize)]
struct TermsAggregation {
    buckets: Vec<TermsBucket>,
}

#[derive(Deserialize)]
struct TermsBucket {
    key: Value,
    doc_count: u64,
}

#[async_trait]
impl ArchiveBackend for SearchIndexArchive {
    async fn get(&self, id: &str) -> Result<Post, ArchiveError> {
        let body = json!({
            "query": { "term": { "_id": id } },
            "size": 1
        });
        let hits = self.search_hits(&self.config.index, body).await?;
        match hits.into_iter().next() {
            Some(hit) => Self::decode(hit),
            None => Err(ArchiveError::NotFound(id.to_string())),
        }
    }

    fn ids(&self, order: SortOrder) -> BoxStream<'_, Result<PostId, ArchiveError>> {
        stream::try_unfold(PageState::Start, move |state| async move {
            match state {
                PageState::Start => {
                    let pit_id = self.open_pit().await?;
                    self.next_page(pit_id, None, order).await
                }
                PageState::Open {
                    pit_id,
                    search_after,
                } => self.next_page(pit_id, search_after, order).await,
                PageState::Done => Ok(None),
            }
        })
        .map_ok(|ids: Vec<PostId>| stream::iter(ids.into_iter().map(Ok)))
        .try_flatten()
        .boxed()
    }

    async fn count(&self) -> Result<u64, ArchiveError> {
        let url = self.url(&format!("{}/_count", self.config.index));
        let response: CountResponse = self.send(self.client.get(&url)).await?;
        Ok(response.count)
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<Post>, ArchiveError> {
        let must = if query.tokens().is_empty() && query.keyword.trim() != "*" {
            json!({ "match_all": {} })
        } else {
            json!({
                "simple_query_string": {
                    "query": query.keyword,
                    "fields": SEARCH_FIELDS,
                    "default_operator": "AND"
                }
            })
        };

        let mut bool_query = json!({ "must": must });
        if let Some(user) = &query.user_filter {
            let field = if query.filters_foreign_account() {
                "account.fqn.keyword"
            } else {
                "user.screen_name.keyword"
            };
            bool_query["filter"] = json!({ "term": { field: user } });
        }

        let body = json!({
            "query": { "bool": bool_query },
            "sort": [{ "@timestamp": { "order": "desc" } }],
            "size": query.limit
        });

        let index = query.index_filter.as_deref().unwrap_or(&self.config.index);
        let hits = self.search_hits(index, body).await?;

        tracing::debug!(
            keyword = %query.keyword,
            user = ?query.user_filter,
            index = %index,
            hits = hits.len(),
            "Index search"
        );

        hits.into_iter().map(Self::decode).collect()
    }

    async fn list_authors(&self) -> Result<Vec<Bucket>, ArchiveError> {
        let mut aggregations = self
            .aggregate(&[
                ("user_screen_names", "user.screen_name.keyword"),
                ("account_fqns", "account.fqn.keyword"),
            ])
            .await?;

        let mut authors = aggregations.remove("user_screen_names").unwrap_or_default();
        authors.extend(aggregations.remove("account_fqns").unwrap_or_default());
        Ok(authors)
    }

    async fn list_partitions(&self) -> Result<Vec<Bucket>, ArchiveError> {
        self.terms("_index").await
    }

    fn name(&self) -> &'static str {
        "search-index"
    }
}
