//! Video embeds for YouTube, Vimeo and PostTV.
//!
//! Each host has its own id rules. A fragment whose id cannot be found gets
//! an `error` and is never looked up.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::classify::VideoHost;
use crate::item::VideoItem;
use crate::markup::{compile_static_regex, cut_identifier, first_capture, last_url, leading_digits, path_segment};
use crate::resolver::ResolveError;

pub const UNKNOWN_YOUTUBE: &str = "Unknown youtube embed";
pub const UNKNOWN_VIMEO: &str = "Unknown vimeo embed";
pub const UNKNOWN_POSTTV: &str = "Unknown posttv embed";

/// Markers preceding a YouTube id, tried in order.
const YOUTUBE_ID_MARKERS: &[&str] = &["?v=", "&v=", "/v/", "/embed/", "youtu.be/"];

const VIMEO_LINK_SEGMENT: usize = 3;
const VIMEO_IFRAME_SEGMENT: usize = 4;
const POSTTV_URL_SEGMENT: usize = 6;

static DATA_UUID_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r#"(?i)data-uuid="(.*?)""#));

/// Builds the draft for `host`.
#[must_use]
pub fn draft(host: VideoHost, fragment: &str) -> VideoItem {
    match host {
        VideoHost::YouTube => youtube_draft(fragment),
        VideoHost::Vimeo => vimeo_draft(fragment),
        VideoHost::PostTv => posttv_draft(fragment),
    }
}

/// Folds the lookup result into a draft.
#[must_use]
pub fn finish(item: VideoItem, resolved: Result<Value, ResolveError>) -> VideoItem {
    match item.host {
        VideoHost::YouTube => youtube_finish(item, resolved),
        VideoHost::Vimeo => vimeo_finish(item, resolved),
        VideoHost::PostTv => posttv_finish(item, resolved),
    }
}

/// The value the resolver is keyed by, or `None` if the draft must not be
/// looked up.
#[must_use]
pub fn lookup_key(item: &VideoItem) -> Option<&str> {
    if item.error.is_some() {
        return None;
    }
    match item.host {
        VideoHost::YouTube => item.url.as_deref(),
        VideoHost::Vimeo | VideoHost::PostTv => item.id.as_deref(),
    }
}

/// YouTube video id from any of the watch, `/v/`, embed or short-link forms.
#[must_use]
pub fn youtube_id(text: &str) -> Option<&str> {
    YOUTUBE_ID_MARKERS.iter().find_map(|marker| {
        let start = text.find(marker)? + marker.len();
        let id = cut_identifier(&text[start..]);
        (!id.is_empty()).then_some(id)
    })
}

/// Canonical watch URL; oEmbed lookups and cache keys use this form.
#[must_use]
pub fn youtube_canonical_url(id: &str) -> String {
    format!("https://www.youtube.com/watch?v={id}")
}

fn youtube_draft(fragment: &str) -> VideoItem {
    let Some(id) = youtube_id(fragment) else {
        let mut item = VideoItem::empty(VideoHost::YouTube, last_url(fragment).map(str::to_string));
        item.error = Some(UNKNOWN_YOUTUBE.to_string());
        return item;
    };
    let canonical = youtube_canonical_url(id);
    let mut item = VideoItem::empty(VideoHost::YouTube, Some(canonical.clone()));
    item.id = Some(id.to_string());
    item.media_url = Some(canonical);
    item
}

fn youtube_finish(mut item: VideoItem, resolved: Result<Value, ResolveError>) -> VideoItem {
    match resolved {
        Ok(content) => {
            item.image_url = string_at(&content, &["thumbnail_url"]);
            item.image_width = u64_at(&content, &["thumbnail_width"]);
            item.image_height = u64_at(&content, &["thumbnail_height"]);
            item.caption = string_at(&content, &["title"]);
            item.content = Some(content);
        }
        Err(error) => item.error = Some(error.to_string()),
    }
    item
}

/// Vimeo id: path segment 3 of a bare link, segment 4 of an iframe embed.
#[must_use]
pub fn vimeo_id(fragment: &str) -> Option<&str> {
    let index = if fragment.contains("iframe") {
        VIMEO_IFRAME_SEGMENT
    } else {
        VIMEO_LINK_SEGMENT
    };
    let id = leading_digits(cut_identifier(path_segment(fragment.trim(), index)?));
    (!id.is_empty()).then_some(id)
}

fn vimeo_draft(fragment: &str) -> VideoItem {
    let mut item = VideoItem::empty(VideoHost::Vimeo, last_url(fragment).map(str::to_string));
    match vimeo_id(fragment) {
        Some(id) => item.id = Some(id.to_string()),
        None => item.error = Some(UNKNOWN_VIMEO.to_string()),
    }
    item
}

fn vimeo_finish(mut item: VideoItem, resolved: Result<Value, ResolveError>) -> VideoItem {
    match resolved {
        Ok(content) => {
            let video = first_entry(content);
            item.media_url = string_at(&video, &["mobile_url"]);
            item.image_url = string_at(&video, &["thumbnail_large"]);
            item.caption = string_at(&video, &["title"]);
            item.content = Some(video);
        }
        Err(error) => {
            let message = error.to_string();
            item.content = Some(Value::String(message.clone()));
            item.error = Some(message);
        }
    }
    item
}

/// PostTV id: the `data-uuid` attribute, else segment 6 of the embed URL.
#[must_use]
pub fn posttv_id(fragment: &str) -> Option<String> {
    if let Some(uuid) = first_capture(fragment, &DATA_UUID_RE).filter(|uuid| !uuid.is_empty()) {
        return Some(uuid);
    }
    let url = last_url(fragment)?;
    let id = cut_identifier(path_segment(url, POSTTV_URL_SEGMENT)?);
    (!id.is_empty()).then(|| id.to_string())
}

fn posttv_draft(fragment: &str) -> VideoItem {
    let mut item = VideoItem::empty(VideoHost::PostTv, last_url(fragment).map(str::to_string));
    match posttv_id(fragment) {
        Some(id) => item.id = Some(id),
        None => item.error = Some(UNKNOWN_POSTTV.to_string()),
    }
    item
}

fn posttv_finish(mut item: VideoItem, resolved: Result<Value, ResolveError>) -> VideoItem {
    match resolved {
        Ok(content) => {
            let video = first_entry(content);
            item.embed_code = string_at(&video, &["contentConfig", "videoContentId"]);
            item.image_url = string_at(&video, &["promoImage", "image", "url"]);
            item.image_width = u64_at(&video, &["promoImage", "image", "width"]);
            item.image_height = u64_at(&video, &["promoImage", "image", "height"]);
            item.caption = string_at(&video, &["contentConfig", "blurb"]);
            item.media_url = video
                .pointer("/contentConfig/streams")
                .and_then(best_mp4_url);
        }
        Err(error) => item.error = Some(error.to_string()),
    }
    item
}

/// URL of the highest-bitrate MP4 stream. The earliest stream wins a tie.
#[must_use]
pub fn best_mp4_url(streams: &Value) -> Option<String> {
    let mut best: Option<(f64, &str)> = None;
    for stream in streams.as_array()? {
        if stream.get("type").and_then(Value::as_str) != Some("MP4") {
            continue;
        }
        let Some(url) = stream.get("url").and_then(Value::as_str) else {
            continue;
        };
        let bitrate = stream.get("bitrate").map_or(0.0, numeric);
        if best.is_none_or(|(top, _)| bitrate > top) {
            best = Some((bitrate, url));
        }
    }
    best.map(|(_, url)| url.to_string())
}

/// Numbers arrive as JSON numbers or numeric strings depending on the feed.
fn numeric(value: &Value) -> f64 {
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
        .unwrap_or(0.0)
}

/// Providers answer with either a one-element array or the object itself.
fn first_entry(content: Value) -> Value {
    match content {
        Value::Array(mut entries) if !entries.is_empty() => entries.swap_remove(0),
        other => other,
    }
}

fn walk<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |node, key| node.get(key))
}

fn string_at(value: &Value, path: &[&str]) -> Option<String> {
    walk(value, path)?.as_str().map(str::to_string)
}

fn u64_at(value: &Value, path: &[&str]) -> Option<u64> {
    let node = walk(value, path)?;
    node.as_u64()
        .or_else(|| node.as_str().and_then(|s| s.trim().parse().ok()))
}
