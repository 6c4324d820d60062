//! Rendering use case - turns a loaded post into a renderable view

use crate::model::{LoadedPost, RenderedPost};
use crate::usecases::entities::render_text;
use crate::usecases::links::LinkConfig;
use crate::usecases::media::{MediaStrategy, resolve_media};
use crate::usecases::timestamp::format_timestamp;

/// Default timestamp output pattern
pub const DEFAULT_TIMESTAMP_PATTERN: &str = "[year]-[month]-[day] [hour]:[minute]:[second] [offset_hour sign:mandatory][offset_minute]";

/// Configuration for the renderer
#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub links: LinkConfig,
    pub media: MediaStrategy,
    /// `time` format description for `created_at`
    pub timestamp_pattern: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            links: LinkConfig::default(),
            media: MediaStrategy::Direct,
            timestamp_pattern: DEFAULT_TIMESTAMP_PATTERN.to_string(),
        }
    }
}

/// Renderer combining entity substitution, media resolution and timestamps
pub struct Renderer {
    config: RenderConfig,
}

impl Renderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Render a post. Applies entity substitution exactly once.
    pub fn render(&self, loaded: &LoadedPost) -> RenderedPost {
        let post = &loaded.post;

        let created_at = post.created_at.as_deref().and_then(|raw| {
            format_timestamp(raw, &self.config.timestamp_pattern)
                .map_err(|e| {
                    tracing::warn!(id = %post.id, error = %e, "Treating timestamp as unavailable");
                })
                .ok()
        });

        RenderedPost {
            id: post.id.clone(),
            screen_name: post.user.screen_name.clone(),
            name: post.user.name.clone(),
            avatar_url: post.user.profile_image_url_https.clone(),
            html: render_text(post, &self.config.links),
            created_at,
            status_link: self.config.links.local_status(&post.id),
            reply_link: self.config.links.reply_link(post),
            in_reply_to_screen_name: post.in_reply_to_screen_name.clone(),
            media: resolve_media(post, &self.config.media, loaded.origin),
            origin: loaded.origin,
        }
    }
}
