//! Entity substitution - rewrites post text entities into HTML markup
//!
//! The passes run in a fixed order over one buffer and rewrite every textual
//! occurrence of a token, not just the entity's own span. Applying the
//! substitution twice re-matches the markup it produced, so it must run
//! exactly once per render.

use regex::{Captures, Regex};

use crate::model::Post;
use crate::usecases::links::LinkConfig;

/// Render the text of a canonical post as HTML
pub fn render_text(post: &Post, links: &LinkConfig) -> String {
    let mut text = post.full_text.clone();

    text = expand_urls(text, post);
    text = linkify_hashtags(text, post, links);
    text = linkify_mentions(text, post, links);
    text = link_retweet_marker(text, post, links);
    prefix_reblog(text, post)
}

/// Replace shortened links (including media links) with their expansions
fn expand_urls(mut text: String, post: &Post) -> String {
    let url_entities = post
        .entities
        .urls
        .iter()
        .map(|u| (&u.url, &u.expanded_url, &u.display_url));
    let media_entities = post
        .entities
        .media
        .iter()
        .map(|m| (&m.url, &m.expanded_url, &m.display_url));

    for (short, expanded, display) in url_entities.chain(media_entities) {
        let Some(expanded) = expanded else {
            continue;
        };
        if short.is_empty() {
            continue;
        }
        let display = display.as_deref().unwrap_or(expanded);

        // The shortener wraps anything that looks like a domain, so only
        // expansions with a path become links.
        let replacement = if has_path(expanded) {
            format!(r#"<a href="{}">{}</a>"#, expanded, display)
        } else {
            display.to_string()
        };
        text = text.replace(short.as_str(), &replacement);
    }
    text
}

fn linkify_hashtags(mut text: String, post: &Post, links: &LinkConfig) -> String {
    for hashtag in &post.entities.hashtags {
        let tag = format!("#{}", hashtag.text);
        let anchor = format!(r#"<a href="{}">{}</a>"#, links.hashtag(&hashtag.text), tag);
        text = text.replace(&tag, &anchor);
    }
    text
}

/// Link `@handle` mentions, matching case-insensitively and keeping the case
/// the author typed
fn linkify_mentions(mut text: String, post: &Post, links: &LinkConfig) -> String {
    for mention in &post.entities.user_mentions {
        let pattern = format!(r"(?i)@({})\b", regex::escape(&mention.screen_name));
        let re = match Regex::new(&pattern) {
            Ok(re) => re,
            Err(e) => {
                tracing::warn!(screen_name = %mention.screen_name, error = %e, "Skipping unusable mention");
                continue;
            }
        };
        let href = links.profile(&mention.screen_name);
        text = re
            .replace_all(&text, |caps: &Captures| {
                format!(
                    r#"<a href="{}" title="{}">@{}</a>"#,
                    href, mention.name, &caps[1]
                )
            })
            .into_owned();
    }
    text
}

/// Link the first `RT` marker of a retweet to the retweeted status.
///
/// Only the first occurrence is replaced since "RT" is common in plain text.
fn link_retweet_marker(text: String, post: &Post, links: &LinkConfig) -> String {
    match &post.retweeted_status {
        Some(retweeted) => {
            let anchor = format!(r#"<a href="{}">RT</a>"#, links.local_status(&retweeted.id));
            text.replacen("RT", &anchor, 1)
        }
        None => text,
    }
}

fn prefix_reblog(text: String, post: &Post) -> String {
    match &post.reblog {
        Some(reblog) => format!(
            r#"<a href="{}">RT</a> <a href="{}">@{}</a>: {}"#,
            reblog.url, reblog.account.url, reblog.account.fqn, text
        ),
        None => text,
    }
}

/// Whether a URL has a path component after its authority.
///
/// `https://example.com` has none while `https://example.com/` does; a string
/// without a scheme is all path.
pub fn has_path(url: &str) -> bool {
    let Some((_, rest)) = url.split_once("://") else {
        return !url.is_empty();
    };
    let authority_end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    rest[authority_end..].starts_with('/')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::normalize::normalize;
    use serde_json::{Value, json};

    fn post(raw: Value) -> Post {
        normalize(raw, None).unwrap()
    }

    fn render(raw: Value) -> String {
        render_text(&post(raw), &LinkConfig::default())
    }

    #[test]
    fn test_has_path() {
        assert!(has_path("https://example.com/a"));
        assert!(has_path("https://example.com/"));
        assert!(!has_path("http://example.com"));
        assert!(!has_path("http://example.com?x=1"));
        assert!(has_path("example.com"));
        assert!(!has_path(""));
    }

    #[test]
    fn test_url_with_path_becomes_anchor() {
        let html = render(json!({
            "id": 1,
            "full_text": "read https://t.co/abc and https://t.co/abc",
            "user": {"screen_name": "a"},
            "entities": {"urls": [{
                "url": "https://t.co/abc",
                "expanded_url": "https://blog.example.com/post/1",
                "display_url": "blog.example.com/post/1"
            }]}
        }));
        let anchor = r#"<a href="https://blog.example.com/post/1">blog.example.com/post/1</a>"#;
        assert_eq!(html, format!("read {} and {}", anchor, anchor));
    }

    #[test]
    fn test_bare_domain_becomes_plain_text() {
        let html = render(json!({
            "id": 1,
            "full_text": "visit https://t.co/xyz",
            "user": {"screen_name": "a"},
            "entities": {"urls": [{
                "url": "https://t.co/xyz",
                "expanded_url": "http://example.com",
                "display_url": "example.com"
            }]}
        }));
        assert_eq!(html, "visit example.com");
    }

    #[test]
    fn test_media_url_is_expanded() {
        let html = render(json!({
            "id": 1,
            "full_text": "look https://t.co/pic",
            "user": {"screen_name": "a"},
            "entities": {"media": [{
                "type": "photo",
                "url": "https://t.co/pic",
                "expanded_url": "https://twitter.com/a/status/1/photo/1",
                "display_url": "pic.twitter.com/pic",
                "media_url_https": "https://pbs.twimg.com/media/x.jpg"
            }]}
        }));
        assert_eq!(
            html,
            r#"look <a href="https://twitter.com/a/status/1/photo/1">pic.twitter.com/pic</a>"#
        );
    }

    #[test]
    fn test_hashtags_replace_all_occurrences() {
        let html = render(json!({
            "id": 1,
            "full_text": "#rust is fun #rust",
            "user": {"screen_name": "a"},
            "entities": {"hashtags": [{"text": "rust"}]}
        }));
        let anchor = r##"<a href="https://twitter.com/hashtag/rust">#rust</a>"##;
        assert_eq!(html, format!("{} is fun {}", anchor, anchor));
    }

    #[test]
    fn test_mention_preserves_typed_case() {
        let html = render(json!({
            "id": 1,
            "full_text": "hello @Foo bye",
            "user": {"screen_name": "a"},
            "entities": {"user_mentions": [{"screen_name": "foo", "name": "Foo Bar"}]}
        }));
        assert_eq!(
            html,
            r#"hello <a href="https://twitter.com/foo" title="Foo Bar">@Foo</a> bye"#
        );
    }

    #[test]
    fn test_mention_respects_word_boundary() {
        let html = render(json!({
            "id": 1,
            "full_text": "@foo and @foobar",
            "user": {"screen_name": "a"},
            "entities": {"user_mentions": [{"screen_name": "foo", "name": "Foo"}]}
        }));
        assert_eq!(
            html,
            r#"<a href="https://twitter.com/foo" title="Foo">@foo</a> and @foobar"#
        );
    }

    #[test]
    fn test_retweet_marker_replaces_first_only() {
        let html = render(json!({
            "id": 2,
            "full_text": "RT more RT",
            "user": {"screen_name": "a"},
            "retweeted_status": {"id": 1}
        }));
        assert_eq!(html, r#"<a href="/tweet/1.html">RT</a> more RT"#);
    }

    #[test]
    fn test_no_retweet_leaves_marker() {
        let html = render(json!({
            "id": 2,
            "full_text": "RT @someone: old style",
            "user": {"screen_name": "a"}
        }));
        assert_eq!(html, "RT @someone: old style");
    }

    #[test]
    fn test_reblog_prefix() {
        let html = render(json!({
            "id": "300",
            "content": "<p>boosted</p>",
            "in_reply_to_id": null,
            "account": {
                "id": "42",
                "fqn": "alice@example.social",
                "display_name": "Alice",
                "avatar": "https://example.social/a.png",
                "url": "https://example.social/@alice"
            },
            "media_attachments": [],
            "reblog": {
                "url": "https://other.social/@bob/1",
                "account": {"fqn": "bob@other.social", "url": "https://other.social/@bob"}
            }
        }));
        assert_eq!(
            html,
            concat!(
                r#"<a href="https://other.social/@bob/1">RT</a> "#,
                r#"<a href="https://other.social/@bob">@bob@other.social</a>: <p>boosted</p>"#
            )
        );
    }

    #[test]
    fn test_url_without_expansion_is_left_alone() {
        let html = render(json!({
            "id": 1,
            "full_text": "see https://t.co/q",
            "user": {"screen_name": "a"},
            "entities": {"urls": [{"url": "https://t.co/q", "expanded_url": null}]}
        }));
        assert_eq!(html, "see https://t.co/q");
    }
}
