//! Domain models and value objects

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Identifier of an archived post.
///
/// Tweets carry 64-bit integer ids, toots carry platform-native string ids.
/// Both shapes are preserved so that JSON output matches the stored record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PostId {
    Number(u64),
    Text(String),
}

impl PostId {
    /// Build an id from its textual form, preferring the numeric shape
    pub fn parse(raw: &str) -> Self {
        match raw.parse::<u64>() {
            Ok(n) => PostId::Number(n),
            Err(_) => PostId::Text(raw.to_string()),
        }
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostId::Number(n) => write!(f, "{}", n),
            PostId::Text(s) => f.write_str(s),
        }
    }
}

impl From<u64> for PostId {
    fn from(value: u64) -> Self {
        PostId::Number(value)
    }
}

/// A canonical post (tweet-shaped) after normalization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    /// Post text, HTML-escaped the way the source platform delivers it
    #[serde(default)]
    pub full_text: String,
    #[serde(default)]
    pub entities: Entities,
    /// Richer media list, preferred over `entities.media` when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extended_entities: Option<ExtendedEntities>,
    pub user: User,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Indexing timestamp (RFC 3339) used for recency ordering
    #[serde(
        rename = "@timestamp",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub in_reply_to_status_id: Option<PostId>,
    #[serde(default)]
    pub in_reply_to_screen_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retweeted_status: Option<RetweetedStatus>,
    /// Boosted status of a foreign-schema post
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reblog: Option<Reblog>,
    /// Foreign-schema author, kept after normalization for reply links
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<Account>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_reply_to_account_id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_reply_to_id: Option<PostId>,
    /// Web URL of a foreign-schema post
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Partition (search index) the record was read from
    #[serde(rename = "@index", default, skip_serializing_if = "Option::is_none")]
    pub partition: Option<String>,
    /// Every other source field, preserved verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Post {
    /// Whether the record came from the foreign (Mastodon-like) schema
    pub fn is_foreign(&self) -> bool {
        self.account.is_some()
    }

    /// Media list, taking `extended_entities` over `entities` when present
    pub fn media(&self) -> &[MediaItem] {
        match &self.extended_entities {
            Some(extended) => &extended.media,
            None => &self.entities.media,
        }
    }

    /// Text fields a keyword search is matched against
    pub fn searchable_text(&self) -> Vec<&str> {
        let mut fields = vec![self.full_text.as_str()];
        for key in ["text", "content_text"] {
            if let Some(Value::String(s)) = self.extra.get(key) {
                fields.push(s);
            }
        }
        fields.extend(self.media().iter().filter_map(|m| m.description.as_deref()));
        fields
    }
}

/// Author summary embedded in a post
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub screen_name: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub profile_image_url_https: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Structured annotations on post text
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Entities {
    #[serde(default)]
    pub urls: Vec<UrlEntity>,
    #[serde(default)]
    pub hashtags: Vec<HashtagEntity>,
    #[serde(default)]
    pub user_mentions: Vec<MentionEntity>,
    #[serde(default)]
    pub media: Vec<MediaItem>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtendedEntities {
    #[serde(default)]
    pub media: Vec<MediaItem>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A shortened link in the text and what it expands to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlEntity {
    /// Short token as it appears in the text
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub expanded_url: Option<String>,
    #[serde(default)]
    pub display_url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashtagEntity {
    pub text: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MentionEntity {
    pub screen_name: String,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Kind of an attached media item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Photo,
    Video,
    #[default]
    #[serde(other)]
    Other,
}

/// Attached media (photo, video, ...)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaItem {
    #[serde(rename = "type", default)]
    pub kind: MediaKind,
    /// Short token for the media link in the text
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expanded_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_url: Option<String>,
    #[serde(default)]
    pub media_url_https: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_info: Option<VideoInfo>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VideoInfo {
    #[serde(default)]
    pub variants: Vec<VideoVariant>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One encoding of a video
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoVariant {
    pub url: String,
    #[serde(
        default,
        deserialize_with = "bitrate_from_number_or_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub bitrate: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

/// API responses carry numeric bitrates, archive exports carry `"2176000"`.
/// Text that is not a number reads as no bitrate.
fn bitrate_from_number_or_text<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Number(bitrate)) => Some(bitrate),
        Some(Raw::Text(text)) => text.trim().parse().ok(),
        None => None,
    })
}

/// Reference to the status a retweet repeats
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetweetedStatus {
    pub id: PostId,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Boosted status inside a foreign-schema post
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reblog {
    pub url: String,
    pub account: Account,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Foreign-schema author
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Account {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub fqn: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub avatar: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Keyword search over the archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Whitespace-separated tokens, all of which must match; `*` matches all
    pub keyword: String,
    /// Exact author; an `@` selects the foreign account name
    pub user_filter: Option<String>,
    /// Restrict to one partition
    pub index_filter: Option<String>,
    pub limit: usize,
}

impl SearchQuery {
    pub const DEFAULT_LIMIT: usize = 100;

    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            user_filter: None,
            index_filter: None,
            limit: Self::DEFAULT_LIMIT,
        }
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user_filter = Some(user.into()).filter(|u: &String| !u.is_empty());
        self
    }

    pub fn with_index(mut self, index: impl Into<String>) -> Self {
        self.index_filter = Some(index.into()).filter(|i: &String| !i.is_empty());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Search tokens; empty when the keyword matches everything
    pub fn tokens(&self) -> Vec<&str> {
        self.keyword
            .split_whitespace()
            .filter(|t| *t != "*")
            .collect()
    }

    /// Whether the user filter targets the foreign account name
    pub fn filters_foreign_account(&self) -> bool {
        self.user_filter.as_deref().is_some_and(|u| u.contains('@'))
    }
}

/// Aggregation bucket (distinct author or partition with its post count)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    pub key: String,
    pub count: u64,
}

/// Order of an id traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        }
    }
}

/// Where a loaded post came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PostOrigin {
    /// Read from the local archive backend
    Archive,
    /// Fetched from the origin platform through the external-fetch cache
    External,
}

/// A post together with its origin
#[derive(Debug, Clone)]
pub struct LoadedPost {
    pub post: Post,
    pub origin: PostOrigin,
}

/// A media reference resolved to a servable URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedMedia {
    pub url: String,
    pub description: Option<String>,
    pub kind: MediaKind,
}

/// Renderable view of a post
#[derive(Debug, Clone, Serialize)]
pub struct RenderedPost {
    pub id: PostId,
    pub screen_name: String,
    pub name: String,
    pub avatar_url: String,
    /// Text with entities rewritten into markup
    pub html: String,
    /// Formatted timestamp, absent when it could not be parsed
    pub created_at: Option<String>,
    pub status_link: String,
    pub reply_link: Option<String>,
    pub in_reply_to_screen_name: Option<String>,
    pub media: Vec<ResolvedMedia>,
    pub origin: PostOrigin,
}
