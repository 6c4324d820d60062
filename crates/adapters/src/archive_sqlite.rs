//! SQLite archive backend
//!
//! Reads the single-table layout written by the archive loader:
//! `tweets(id INTEGER PRIMARY KEY, text TEXT, raw_json TEXT)`, where
//! `raw_json` holds the full source record. Lookups and aggregations run
//! against `raw_json` through SQLite's JSON functions.
//!
//! Records carry their time in one of several text layouts (`@timestamp`
//! when indexed, otherwise the loader's raw `created_at`). Ordering runs on
//! a UTC key derived from whichever is present.

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::future::Future;
use std::path::Path;
use std::time::Duration;
use tweet_archive_domain::usecases::normalize;
use tweet_archive_domain::{
    ArchiveBackend, ArchiveError, Bucket, Post, PostId, SearchQuery, SortOrder,
};

/// Table layout shared with the ingestion tooling
pub const SCHEMA: &str =
    "CREATE TABLE IF NOT EXISTS tweets (id INTEGER PRIMARY KEY, text TEXT, raw_json TEXT)";

/// `tweets` plus a `recency` column: the record time as UTC
/// `YYYY-MM-DD HH:MM:SS.SSS`, NULL when absent or unreadable.
///
/// `Wed Jan 18 07:20:00 +0000 2023` and `2017-08-17 12:57:51 +0000` style
/// values are rewritten to ISO 8601 with a `+HH:MM` offset first; every
/// other layout is left to `strftime`.
const RECENCY_SOURCE: &str = r#"(
    SELECT id, text, raw_json, strftime('%Y-%m-%d %H:%M:%f', CASE
        WHEN raw GLOB '[A-Z][a-z][a-z] [A-Z][a-z][a-z] [0-9][0-9] *' THEN
            substr(raw, 27, 4) || '-'
            || printf('%02d', (instr('JanFebMarAprMayJunJulAugSepOctNovDec', substr(raw, 5, 3)) + 2) / 3)
            || '-' || substr(raw, 9, 2) || 'T' || substr(raw, 12, 8)
            || substr(raw, 21, 3) || ':' || substr(raw, 24, 2)
        WHEN raw GLOB '[0-9][0-9][0-9][0-9]-[0-9][0-9]-[0-9][0-9]?[0-9][0-9]:[0-9][0-9]:[0-9][0-9]*[+-][0-9][0-9][0-9][0-9]' THEN
            substr(raw, 1, 10) || 'T' || substr(raw, 12, 8)
            || substr(raw, -5, 3) || ':' || substr(raw, -2, 2)
        ELSE raw
    END) AS recency
    FROM (
        SELECT id, text, raw_json, CAST(COALESCE(
            json_extract(raw_json, '$."@timestamp"'),
            json_extract(raw_json, '$.created_at')
        ) AS TEXT) AS raw
        FROM tweets
    )
) AS tweets"#;

/// One keyword token, matched against every searchable text field
const TOKEN_CLAUSE: &str = r#"(
    text LIKE ? ESCAPE '\'
    OR json_extract(raw_json, '$.full_text') LIKE ? ESCAPE '\'
    OR json_extract(raw_json, '$.content') LIKE ? ESCAPE '\'
    OR json_extract(raw_json, '$.content_text') LIKE ? ESCAPE '\'
    OR EXISTS (SELECT 1 FROM json_each(raw_json, '$.media_attachments') AS att
               WHERE json_extract(att.value, '$.description') LIKE ? ESCAPE '\')
    OR EXISTS (SELECT 1 FROM json_each(raw_json, '$.extended_entities.media') AS m
               WHERE json_extract(m.value, '$.description') LIKE ? ESCAPE '\')
)"#;
const TOKEN_BINDS: usize = 6;

/// Configuration for the SQLite backend
#[derive(Debug, Clone)]
pub struct SqliteArchiveConfig {
    /// Name reported as the only partition
    pub partition: String,
    /// Ids fetched per page while iterating
    pub page_size: u32,
    /// Upper bound on every query, including waiting for a connection
    pub query_timeout: Duration,
}

impl Default for SqliteArchiveConfig {
    fn default() -> Self {
        Self {
            partition: "tweets".to_string(),
            page_size: 1000,
            query_timeout: Duration::from_secs(10),
        }
    }
}

/// SQLite-backed archive
pub struct SqliteArchive {
    pool: SqlitePool,
    config: SqliteArchiveConfig,
}

impl SqliteArchive {
    /// Open an existing archive database read-only
    pub async fn open(
        db_path: impl AsRef<Path>,
        config: SqliteArchiveConfig,
    ) -> Result<Self, ArchiveError> {
        let db_path = db_path.as_ref();
        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .read_only(true)
            .busy_timeout(config.query_timeout);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(config.query_timeout)
            .connect_with(options)
            .await
            .map_err(|e| {
                ArchiveError::Backend(format!(
                    "Failed to open {}: {}",
                    db_path.display(),
                    e
                ))
            })?;

        tracing::debug!(path = %db_path.display(), partition = %config.partition, "Opened SQLite archive");

        Ok(Self::from_pool(pool, config))
    }

    /// Wrap an existing pool
    pub fn from_pool(pool: SqlitePool, config: SqliteArchiveConfig) -> Self {
        Self { pool, config }
    }

    async fn run<T, F>(&self, query: F) -> Result<T, ArchiveError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.config.query_timeout, query).await {
            Ok(result) => result.map_err(|e| ArchiveError::Backend(e.to_string())),
            Err(_) => Err(ArchiveError::Timeout(self.config.query_timeout)),
        }
    }

    fn decode(&self, raw_json: &str) -> Result<Post, ArchiveError> {
        let raw: Value = serde_json::from_str(raw_json)
            .map_err(|e| ArchiveError::Backend(format!("Invalid raw_json: {}", e)))?;
        Ok(normalize(raw, Some(&self.config.partition))?)
    }
}

fn post_id(id: i64) -> PostId {
    u64::try_from(id)
        .map(PostId::Number)
        .unwrap_or_else(|_| PostId::Text(id.to_string()))
}

/// `%token%` with LIKE wildcards in the token escaped
fn like_pattern(token: &str) -> String {
    let mut escaped = String::with_capacity(token.len() + 2);
    escaped.push('%');
    for c in token.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[async_trait]
impl ArchiveBackend for SqliteArchive {
    async fn get(&self, id: &str) -> Result<Post, ArchiveError> {
        let key: i64 = id.trim().parse().map_err(|_| {
            ArchiveError::InvalidArgument(format!("Post id must be an integer: {}", id))
        })?;

        let row: Option<(String,)> = self
            .run(
                sqlx::query_as("SELECT raw_json FROM tweets WHERE id = ?")
                    .bind(key)
                    .fetch_optional(&self.pool),
            )
            .await?;

        match row {
            Some((raw_json,)) => self.decode(&raw_json),
            None => Err(ArchiveError::NotFound(id.to_string())),
        }
    }

    fn ids(&self, order: SortOrder) -> BoxStream<'_, Result<PostId, ArchiveError>> {
        // Records without a time sort first ascending; ties break on id
        let sql = format!(
            "SELECT id FROM {src} ORDER BY recency {dir}, id {dir} LIMIT ? OFFSET ?",
            src = RECENCY_SOURCE,
            dir = order.as_str()
        );
        let page_size = i64::from(self.config.page_size.max(1));

        stream::try_unfold(Some(0i64), move |offset| {
            let sql = sql.clone();
            async move {
                let Some(offset) = offset else {
                    return Ok::<_, ArchiveError>(None);
                };
                let rows: Vec<(i64,)> = self
                    .run(
                        sqlx::query_as::<_, (i64,)>(&sql)
                            .bind(page_size)
                            .bind(offset)
                            .fetch_all(&self.pool),
                    )
                    .await?;
                tracing::trace!(offset, rows = rows.len(), "Fetched id page");

                if rows.is_empty() {
                    return Ok(None);
                }
                let next = (rows.len() as i64 == page_size).then_some(offset + page_size);
                Ok(Some((rows, next)))
            }
        })
        .map_ok(|rows| {
            stream::iter(
                rows.into_iter()
                    .map(|(id,)| Ok::<_, ArchiveError>(post_id(id))),
            )
        })
        .try_flatten()
        .boxed()
    }

    async fn count(&self) -> Result<u64, ArchiveError> {
        let (count,): (i64,) = self
            .run(sqlx::query_as("SELECT COUNT(*) FROM tweets").fetch_one(&self.pool))
            .await?;
        Ok(count.max(0) as u64)
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<Post>, ArchiveError> {
        if let Some(index) = &query.index_filter {
            if index != &self.config.partition {
                tracing::debug!(index = %index, "Partition not held by this archive");
                return Ok(vec![]);
            }
        }

        let mut sql = format!("SELECT raw_json FROM {} WHERE 1 = 1", RECENCY_SOURCE);
        let mut binds: Vec<String> = Vec::new();

        for token in query.tokens() {
            sql.push_str(" AND ");
            sql.push_str(TOKEN_CLAUSE);
            let pattern = like_pattern(token);
            binds.extend(std::iter::repeat_n(pattern, TOKEN_BINDS));
        }

        if let Some(user) = &query.user_filter {
            let field = if query.filters_foreign_account() {
                "$.account.fqn"
            } else {
                "$.user.screen_name"
            };
            sql.push_str(&format!(" AND json_extract(raw_json, '{}') = ?", field));
            binds.push(user.clone());
        }

        sql.push_str(" ORDER BY recency DESC, id DESC LIMIT ?");

        let mut statement = sqlx::query_as::<_, (String,)>(&sql);
        for bind in &binds {
            statement = statement.bind(bind);
        }
        let limit = i64::try_from(query.limit).unwrap_or(i64::MAX);
        let rows = self
            .run(statement.bind(limit).fetch_all(&self.pool))
            .await?;

        tracing::debug!(
            keyword = %query.keyword,
            user = ?query.user_filter,
            hits = rows.len(),
            "SQLite search"
        );

        rows.iter().map(|(raw_json,)| self.decode(raw_json)).collect()
    }

    async fn list_authors(&self) -> Result<Vec<Bucket>, ArchiveError> {
        let rows: Vec<(String, i64)> = self
            .run(
                sqlx::query_as(
                    r#"
                    SELECT author, COUNT(*) AS n FROM (
                        SELECT COALESCE(
                            json_extract(raw_json, '$.user.screen_name'),
                            json_extract(raw_json, '$.account.fqn')
                        ) AS author
                        FROM tweets
                    )
                    WHERE author IS NOT NULL
                    GROUP BY author
                    ORDER BY n DESC, author
                    "#,
                )
                .fetch_all(&self.pool),
            )
            .await?;

        Ok(rows
            .into_iter()
            .map(|(key, count)| Bucket {
                key,
                count: count.max(0) as u64,
            })
            .collect())
    }

    async fn list_partitions(&self) -> Result<Vec<Bucket>, ArchiveError> {
        let count = self.count().await?;
        if count == 0 {
            return Ok(vec![]);
        }
        Ok(vec![Bucket {
            key: self.config.partition.clone(),
            count,
        }])
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }
}
