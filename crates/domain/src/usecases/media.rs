//! Media resolution - maps media references to servable URLs

use serde::{Deserialize, Serialize};
use url::Url;

use crate::model::{MediaItem, MediaKind, Post, PostOrigin, ResolvedMedia, VideoVariant};

/// Default object-storage URL template
pub const DEFAULT_OBJECT_STORAGE_TEMPLATE: &str =
    "https://{bucket}.s3.{region}.amazonaws.com/{filename}";

/// One source-domain to replacement-domain substitution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorRule {
    pub from: String,
    pub to: String,
}

/// How archived media is delivered
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MediaStrategy {
    /// Hotlink the origin platform
    #[default]
    Direct,
    /// Substitute domains; the first rule whose source occurs in the URL wins
    Mirror(Vec<MirrorRule>),
    /// Serve from a local endpoint keyed by `{host}{path}`
    Filesystem { route: String },
    /// Serve from a bucket, keyed by the media filename
    ObjectStorage {
        bucket: String,
        region: String,
        template: String,
    },
    /// Serve from an alternate base URL, keeping the original path
    HotlinkBase { base_url: String },
}

impl MediaStrategy {
    /// Rewrite a single media URL
    pub fn resolve_url(&self, url: &str) -> String {
        match self {
            MediaStrategy::Direct => url.to_string(),
            MediaStrategy::Mirror(rules) => rules
                .iter()
                .find(|rule| url.contains(rule.from.as_str()))
                .map(|rule| url.replace(rule.from.as_str(), &rule.to))
                .unwrap_or_else(|| url.to_string()),
            MediaStrategy::Filesystem { route } => match Url::parse(url) {
                Ok(parsed) => format!(
                    "{}/{}{}",
                    route.trim_end_matches('/'),
                    parsed.host_str().unwrap_or_default(),
                    parsed.path()
                ),
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "Unparseable media URL, passing through");
                    url.to_string()
                }
            },
            MediaStrategy::ObjectStorage {
                bucket,
                region,
                template,
            } => match media_filename(url) {
                Some(filename) => template
                    .replace("{bucket}", bucket)
                    .replace("{region}", region)
                    .replace("{filename}", &filename),
                None => url.to_string(),
            },
            MediaStrategy::HotlinkBase { base_url } => match Url::parse(url) {
                Ok(parsed) => {
                    let mut resolved =
                        format!("{}{}", base_url.trim_end_matches('/'), parsed.path());
                    if let Some(query) = parsed.query() {
                        resolved.push('?');
                        resolved.push_str(query);
                    }
                    resolved
                }
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "Unparseable media URL, passing through");
                    url.to_string()
                }
            },
        }
    }
}

/// Last path segment of a URL
fn media_filename(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .path_segments()?
        .next_back()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Pick the highest-bitrate variant.
///
/// A variant without a bitrate counts as -1 so it never beats a declared one.
/// On ties the earliest variant wins.
pub fn select_video_variant(variants: &[VideoVariant]) -> Option<&VideoVariant> {
    let bitrate = |v: &VideoVariant| v.bitrate.map(|b| b as i128).unwrap_or(-1);
    variants.iter().fold(None, |best, v| match best {
        Some(b) if bitrate(b) >= bitrate(v) => Some(b),
        _ => Some(v),
    })
}

/// Resolve the media of a post.
///
/// Posts fetched from the origin platform are not hosted locally, so their
/// URLs are passed through untouched. Media of unknown kind is skipped.
pub fn resolve_media(post: &Post, strategy: &MediaStrategy, origin: PostOrigin) -> Vec<ResolvedMedia> {
    post.media()
        .iter()
        .filter_map(|item| resolve_item(item, strategy, origin))
        .collect()
}

fn resolve_item(item: &MediaItem, strategy: &MediaStrategy, origin: PostOrigin) -> Option<ResolvedMedia> {
    let source_url = match item.kind {
        MediaKind::Video => {
            let variants = item.video_info.as_ref().map(|v| v.variants.as_slice())?;
            select_video_variant(variants)?.url.as_str()
        }
        MediaKind::Photo => item.media_url_https.as_str(),
        MediaKind::Other => return None,
    };

    let url = match origin {
        PostOrigin::Archive => strategy.resolve_url(source_url),
        PostOrigin::External => source_url.to_string(),
    };

    Some(ResolvedMedia {
        url,
        description: item.description.clone().filter(|_| item.kind == MediaKind::Photo),
        kind: item.kind,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::normalize::normalize;
    use serde_json::json;

    fn variant(url: &str, bitrate: Option<u64>) -> VideoVariant {
        VideoVariant {
            url: url.to_string(),
            bitrate,
            content_type: None,
        }
    }

    fn mirror() -> MediaStrategy {
        MediaStrategy::Mirror(vec![
            MirrorRule {
                from: "pbs.twimg.com".to_string(),
                to: "cdn.example.com/pbs.twimg.com".to_string(),
            },
            MirrorRule {
                from: "video.twimg.com".to_string(),
                to: "cdn.example.com/video.twimg.com".to_string(),
            },
        ])
    }

    #[test]
    fn test_select_highest_bitrate() {
        let variants = vec![
            variant("a", Some(0)),
            variant("b", Some(500)),
            variant("c", Some(1200)),
        ];
        assert_eq!(select_video_variant(&variants).unwrap().url, "c");
    }

    #[test]
    fn test_missing_bitrate_never_wins() {
        let variants = vec![variant("playlist", None), variant("low", Some(0))];
        assert_eq!(select_video_variant(&variants).unwrap().url, "low");
    }

    #[test]
    fn test_all_missing_bitrate_picks_first() {
        let variants = vec![variant("first", None), variant("second", None)];
        assert_eq!(select_video_variant(&variants).unwrap().url, "first");
        assert!(select_video_variant(&[]).is_none());
    }

    #[test]
    fn test_direct_passes_through() {
        let url = "https://pbs.twimg.com/media/x.jpg";
        assert_eq!(MediaStrategy::Direct.resolve_url(url), url);
    }

    #[test]
    fn test_mirror_rewrites_matching_domain() {
        assert_eq!(
            mirror().resolve_url("https://pbs.twimg.com/media/x.jpg"),
            "https://cdn.example.com/pbs.twimg.com/media/x.jpg"
        );
        assert_eq!(
            mirror().resolve_url("https://example.org/media/x.jpg"),
            "https://example.org/media/x.jpg"
        );
    }

    #[test]
    fn test_mirror_first_rule_wins() {
        let strategy = MediaStrategy::Mirror(vec![
            MirrorRule {
                from: "twimg.com".to_string(),
                to: "first.example".to_string(),
            },
            MirrorRule {
                from: "pbs.twimg.com".to_string(),
                to: "second.example".to_string(),
            },
        ]);
        assert_eq!(
            strategy.resolve_url("https://pbs.twimg.com/a.jpg"),
            "https://pbs.first.example/a.jpg"
        );
    }

    #[test]
    fn test_filesystem_route() {
        let strategy = MediaStrategy::Filesystem {
            route: "/tweet/media/".to_string(),
        };
        assert_eq!(
            strategy.resolve_url("https://pbs.twimg.com/media/Fmsk2gHacAAJGL0.jpg"),
            "/tweet/media/pbs.twimg.com/media/Fmsk2gHacAAJGL0.jpg"
        );
    }

    #[test]
    fn test_object_storage_template() {
        let strategy = MediaStrategy::ObjectStorage {
            bucket: "archive-media".to_string(),
            region: "us-west-2".to_string(),
            template: DEFAULT_OBJECT_STORAGE_TEMPLATE.to_string(),
        };
        assert_eq!(
            strategy.resolve_url("https://video.twimg.com/ext_tw_video/1/pu/vid/720x1280/abc.mp4?tag=12"),
            "https://archive-media.s3.us-west-2.amazonaws.com/abc.mp4"
        );
    }

    #[test]
    fn test_hotlink_base_keeps_path_and_query() {
        let strategy = MediaStrategy::HotlinkBase {
            base_url: "https://media.example.net/".to_string(),
        };
        assert_eq!(
            strategy.resolve_url("https://video.twimg.com/vid/abc.mp4?tag=12"),
            "https://media.example.net/vid/abc.mp4?tag=12"
        );
    }

    fn post_with_media() -> Post {
        normalize(
            json!({
                "id": 1,
                "full_text": "media",
                "user": {"screen_name": "a"},
                "extended_entities": {"media": [
                    {"type": "photo", "media_url_https": "https://pbs.twimg.com/media/x.jpg", "description": "alt"},
                    {"type": "video", "media_url_https": "https://pbs.twimg.com/thumb.jpg",
                     "video_info": {"variants": [
                        {"url": "https://video.twimg.com/pl.m3u8", "content_type": "application/x-mpegURL"},
                        {"url": "https://video.twimg.com/low.mp4", "bitrate": 256000},
                        {"url": "https://video.twimg.com/high.mp4", "bitrate": 2176000}
                     ]}},
                    {"type": "animated_gif", "media_url_https": "https://pbs.twimg.com/gif.jpg"}
                ]}
            }),
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_resolve_media_for_archived_post() {
        let media = resolve_media(&post_with_media(), &mirror(), PostOrigin::Archive);
        assert_eq!(
            media,
            vec![
                ResolvedMedia {
                    url: "https://cdn.example.com/pbs.twimg.com/media/x.jpg".to_string(),
                    description: Some("alt".to_string()),
                    kind: MediaKind::Photo,
                },
                ResolvedMedia {
                    url: "https://cdn.example.com/video.twimg.com/high.mp4".to_string(),
                    description: None,
                    kind: MediaKind::Video,
                },
            ]
        );
    }

    #[test]
    fn test_archive_export_text_bitrates() {
        let post = normalize(
            json!({
                "id": 2,
                "full_text": "exported video",
                "user": {"screen_name": "a"},
                "extended_entities": {"media": [
                    {"type": "video", "media_url_https": "https://pbs.twimg.com/thumb.jpg",
                     "video_info": {"variants": [
                        {"url": "https://video.twimg.com/pl.m3u8", "bitrate": "n/a"},
                        {"url": "https://video.twimg.com/high.mp4", "bitrate": "2176000"},
                        {"url": "https://video.twimg.com/low.mp4", "bitrate": 256000}
                     ]}}
                ]}
            }),
            None,
        )
        .unwrap();

        let variants = &post.media()[0].video_info.as_ref().unwrap().variants;
        assert_eq!(variants[0].bitrate, None);
        assert_eq!(variants[1].bitrate, Some(2176000));
        assert_eq!(
            select_video_variant(variants).map(|v| v.url.as_str()),
            Some("https://video.twimg.com/high.mp4")
        );
    }

    #[test]
    fn test_external_post_skips_resolution() {
        let media = resolve_media(&post_with_media(), &mirror(), PostOrigin::External);
        assert_eq!(media[0].url, "https://pbs.twimg.com/media/x.jpg");
        assert_eq!(media[1].url, "https://video.twimg.com/high.mp4");
    }
}
