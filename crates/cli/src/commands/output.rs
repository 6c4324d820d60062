//! Text and markup output for posts

use std::fmt::Write;
use tweet_archive_domain::{MediaKind, Post, PostOrigin, RenderedPost};

/// Plain-text summary of a stored post
pub fn post_text(post: &Post) -> String {
    let mut out = String::new();
    let _ = write!(out, "{} @{}", post.id, post.user.screen_name);
    if let Some(created_at) = &post.created_at {
        let _ = write!(out, " {}", created_at);
    }
    if let Some(partition) = &post.partition {
        let _ = write!(out, " [{}]", partition);
    }
    out.push('\n');
    out.push_str(&post.full_text);
    out.push('\n');
    for media in post.media() {
        let url = if media.media_url_https.is_empty() {
            &media.url
        } else {
            &media.media_url_https
        };
        let _ = writeln!(out, "  media: {}", url);
    }
    out
}

/// Markup fragment for a rendered post
pub fn post_html(view: &RenderedPost) -> String {
    let mut out = String::new();
    let _ = writeln!(out, r#"<article class="tweet" id="{}">"#, view.id);
    let _ = writeln!(
        out,
        r#"  <header><img class="avatar" src="{}" alt=""> <strong>{}</strong> @{}</header>"#,
        escape_html(&view.avatar_url),
        escape_html(&view.name),
        escape_html(&view.screen_name)
    );
    if let Some(reply_link) = &view.reply_link {
        let target = view.in_reply_to_screen_name.as_deref().unwrap_or("...");
        let _ = writeln!(
            out,
            r#"  <p class="reply">Replying to <a href="{}">@{}</a></p>"#,
            escape_html(reply_link),
            escape_html(target)
        );
    }
    let _ = writeln!(out, r#"  <p class="text">{}</p>"#, view.html);
    for media in &view.media {
        match media.kind {
            MediaKind::Photo => {
                let _ = writeln!(
                    out,
                    r#"  <img class="media" src="{}" alt="{}">"#,
                    escape_html(&media.url),
                    escape_html(media.description.as_deref().unwrap_or_default())
                );
            }
            MediaKind::Video => {
                let _ = writeln!(
                    out,
                    r#"  <video class="media" src="{}" controls></video>"#,
                    escape_html(&media.url)
                );
            }
            MediaKind::Other => {}
        }
    }
    let timestamp = view.created_at.as_deref().unwrap_or("unknown time");
    let _ = write!(
        out,
        r#"  <footer><a href="{}">{}</a>"#,
        escape_html(&view.status_link),
        escape_html(timestamp)
    );
    if view.origin == PostOrigin::External {
        out.push_str(r#" <span class="external">(not archived)</span>"#);
    }
    out.push_str("</footer>\n</article>\n");
    out
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tweet_archive_domain::usecases::{Renderer, normalize};
    use tweet_archive_domain::{LoadedPost, PostId};

    fn post() -> Post {
        normalize(
            json!({
                "id": 20,
                "full_text": "just setting up my twttr",
                "created_at": "Tue Mar 21 20:50:14 +0000 2006",
                "user": {"screen_name": "jack", "name": "jack <dorsey>"}
            }),
            Some("tweets-2006"),
        )
        .unwrap()
    }

    #[test]
    fn test_post_text() {
        let text = post_text(&post());
        assert!(text.starts_with("20 @jack Tue Mar 21 20:50:14 +0000 2006 [tweets-2006]\n"));
        assert!(text.contains("just setting up my twttr"));
    }

    #[test]
    fn test_post_html_escapes_names() {
        let view = Renderer::new(Default::default()).render(&LoadedPost {
            post: post(),
            origin: PostOrigin::External,
        });
        assert_eq!(view.id, PostId::Number(20));

        let html = post_html(&view);
        assert!(html.contains("jack &lt;dorsey&gt;"));
        assert!(html.contains(r#"<a href="/tweet/20.html">"#));
        assert!(html.contains("(not archived)"));
    }
}
