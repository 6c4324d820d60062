//! Normalization of raw archive records into the canonical post schema

use serde_json::{Map, Value, json};

use crate::model::Post;
use crate::ports::NormalizeError;

/// Placeholder reply target for foreign posts that do not name one
pub const UNKNOWN_REPLY_TARGET: &str = "...";

/// Canonicalize a raw record read from a backend.
///
/// A record carrying a `user` field is native and passes through unchanged,
/// apart from the partition name being copied into `@index`. Anything else is
/// a foreign (Mastodon-like) status and is rewritten into the native shape.
pub fn normalize(raw: Value, partition: Option<&str>) -> Result<Post, NormalizeError> {
    let Value::Object(mut record) = raw else {
        return Err(NormalizeError::NotAnObject);
    };

    if let Some(partition) = partition {
        record.insert("@index".to_string(), Value::String(partition.to_string()));
    }

    if is_native(&record) {
        if !record.contains_key("full_text") {
            if let Some(text) = record.get("text").cloned() {
                record.insert("full_text".to_string(), text);
            }
        }
    } else {
        rewrite_foreign(&mut record)?;
    }

    serde_json::from_value(Value::Object(record))
        .map_err(|e| NormalizeError::Schema(e.to_string()))
}

fn is_native(record: &Map<String, Value>) -> bool {
    record.get("user").is_some_and(|u| !u.is_null())
}

fn rewrite_foreign(record: &mut Map<String, Value>) -> Result<(), NormalizeError> {
    let account = record
        .get("account")
        .and_then(Value::as_object)
        .ok_or(NormalizeError::MissingField("account"))?;

    let user = json!({
        "profile_image_url_https": required(account, "avatar")?,
        "screen_name": required(account, "fqn")?,
        "name": required(account, "display_name")?,
    });

    let content = required(record, "content")?;

    let attachments = record
        .get("media_attachments")
        .and_then(Value::as_array)
        .ok_or(NormalizeError::MissingField("media_attachments"))?;
    let media = attachments
        .iter()
        .map(attachment_to_media)
        .collect::<Result<Vec<_>, _>>()?;

    let reply_id = required(record, "in_reply_to_id")?;
    let reply_screen_name = record
        .get("pleroma")
        .and_then(|p| p.get("in_reply_to_account_acct"))
        .filter(|v| !v.is_null())
        .cloned()
        .unwrap_or_else(|| Value::String(UNKNOWN_REPLY_TARGET.to_string()));

    record.insert("user".to_string(), user);
    record.insert("full_text".to_string(), content);
    record.insert("entities".to_string(), json!({}));
    record.insert("extended_entities".to_string(), json!({ "media": media }));
    record.insert("in_reply_to_status_id".to_string(), reply_id);
    record.insert("in_reply_to_screen_name".to_string(), reply_screen_name);

    Ok(())
}

/// Map a foreign attachment onto a media item.
///
/// Images become photos; videos and looping gifs become single-variant videos.
fn attachment_to_media(attachment: &Value) -> Result<Value, NormalizeError> {
    let object = attachment
        .as_object()
        .ok_or(NormalizeError::MissingField("media_attachments[].url"))?;
    let url = required(object, "url")?;
    let description = object.get("description").cloned().unwrap_or(Value::Null);

    let mut media = json!({
        "media_url_https": url,
        "description": description,
    });
    match object.get("type").and_then(Value::as_str) {
        Some("image") => {
            media["type"] = json!("photo");
        }
        Some("video" | "gifv") => {
            media["type"] = json!("video");
            media["video_info"] = json!({ "variants": [{ "url": url }] });
        }
        _ => {}
    }
    Ok(media)
}

fn required(object: &Map<String, Value>, key: &'static str) -> Result<Value, NormalizeError> {
    object
        .get(key)
        .cloned()
        .ok_or(NormalizeError::MissingField(key))
}
