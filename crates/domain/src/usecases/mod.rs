//! Application use cases / business logic

pub mod cache;
pub mod entities;
pub mod links;
pub mod lookup;
pub mod media;
pub mod normalize;
pub mod render;
pub mod timestamp;

pub use cache::{DEFAULT_EXTERNAL_CACHE_CAPACITY, ExternalFetchCache, LruCache};
pub use entities::render_text;
pub use links::LinkConfig;
pub use lookup::PostReader;
pub use media::{MediaStrategy, MirrorRule, resolve_media, select_video_variant};
pub use normalize::normalize;
pub use render::{RenderConfig, Renderer};
pub use timestamp::{TimestampError, format_timestamp, parse_timestamp};
