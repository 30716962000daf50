//! Tweet and Instagram embeds.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::item::{InstagramItem, TweetItem};
use crate::markup::{compile_static_regex, first_capture, last_url, leading_digits, path_segment};
use crate::resolver::ResolveError;

/// Error for a tweet reference without a status id.
pub const UNKNOWN_TWEET: &str = "Unknown tweet embed";

/// Status id position in `https://twitter.com/<user>/status/<id>`.
const TWEET_ID_SEGMENT: usize = 5;

static IFRAME_SRC_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r#"(?is)<iframe\b[^>]*?\bsrc\s*=\s*["']([^"']+)["']"#));

/// Numeric status id of a tweet permalink.
#[must_use]
pub fn tweet_id(reference: &str) -> Option<&str> {
    let id = leading_digits(path_segment(reference, TWEET_ID_SEGMENT)?);
    (!id.is_empty()).then_some(id)
}

/// Blockquote embeds end with the permalink; bare links are the permalink.
#[must_use]
pub fn tweet_draft(fragment: &str) -> TweetItem {
    let reference = if fragment.contains("blockquote") {
        last_url(fragment).unwrap_or(fragment)
    } else {
        fragment.trim()
    };
    match tweet_id(reference) {
        Some(id) => TweetItem {
            id: Some(id.to_string()),
            content: None,
            error: None,
        },
        None => TweetItem {
            id: None,
            content: None,
            error: Some(UNKNOWN_TWEET.to_string()),
        },
    }
}

#[must_use]
pub fn tweet_finish(mut item: TweetItem, resolved: Result<Value, ResolveError>) -> TweetItem {
    match resolved {
        Ok(content) => item.content = Some(content),
        Err(error) => item.error = Some(error.to_string()),
    }
    item
}

/// Post URL for an Instagram fragment.
///
/// Iframe embeds point at `.../p/<code>/embed/`, often without a scheme; the
/// oEmbed endpoint wants the plain post URL.
#[must_use]
pub fn instagram_url(fragment: &str) -> String {
    if !fragment.contains("iframe") {
        return last_url(fragment).unwrap_or(fragment.trim()).to_string();
    }
    let src = first_capture(fragment, &IFRAME_SRC_RE)
        .or_else(|| last_url(fragment).map(str::to_string))
        .unwrap_or_else(|| fragment.trim().to_string());
    let src = src.replace("embed/", "");
    if src.starts_with("//") {
        format!("http:{src}")
    } else if src.contains("://") {
        src
    } else {
        format!("http://{src}")
    }
}

#[must_use]
pub fn instagram_draft(fragment: &str) -> InstagramItem {
    InstagramItem {
        url: instagram_url(fragment),
        content: None,
        error: None,
    }
}

#[must_use]
pub fn instagram_finish(
    mut item: InstagramItem,
    resolved: Result<Value, ResolveError>,
) -> InstagramItem {
    match resolved {
        Ok(content) => item.content = Some(content),
        Err(error) => item.error = Some(error.to_string()),
    }
    item
}
