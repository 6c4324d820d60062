//! Link building for statuses, replies, hashtags and profiles

use crate::model::{Post, PostId};

/// Where local and origin-platform links point
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Path prefix under which archived statuses are served
    pub local_base: String,
    /// Origin platform base URL for profiles, hashtags and original statuses
    pub twitter_base: String,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            local_base: "/tweet".to_string(),
            twitter_base: "https://twitter.com".to_string(),
        }
    }
}

impl LinkConfig {
    /// Link to a status, either in the archive or on the origin platform
    pub fn status_link(&self, screen_name: &str, id: &PostId, original: bool) -> String {
        if original {
            format!(
                "{}/{}/status/{}",
                self.twitter_base.trim_end_matches('/'),
                screen_name,
                id
            )
        } else {
            self.local_status(id)
        }
    }

    /// Link to an archived status
    pub fn local_status(&self, id: &PostId) -> String {
        format!("{}/{}.html", self.local_base.trim_end_matches('/'), id)
    }

    pub fn hashtag(&self, tag: &str) -> String {
        format!("{}/hashtag/{}", self.twitter_base.trim_end_matches('/'), tag)
    }

    pub fn profile(&self, screen_name: &str) -> String {
        format!("{}/{}", self.twitter_base.trim_end_matches('/'), screen_name)
    }

    /// Link to the status a post replies to, if it is a reply.
    ///
    /// Foreign self-thread replies stay in the archive; replies to someone
    /// else go to the post's web page where the thread can be read.
    pub fn reply_link(&self, post: &Post) -> Option<String> {
        match &post.account {
            Some(account) => {
                let reply_to = post.in_reply_to_id.as_ref()?;
                let self_thread = match (&post.in_reply_to_account_id, &account.id) {
                    (Some(target), Some(author)) => !target.is_null() && target == author,
                    _ => false,
                };
                if self_thread {
                    Some(self.local_status(reply_to))
                } else {
                    post.url.clone()
                }
            }
            None => post
                .in_reply_to_status_id
                .as_ref()
                .map(|id| self.local_status(id)),
        }
    }
}
