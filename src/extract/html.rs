//! Plain body text reduced to inline markup.

use std::sync::LazyLock;

use regex::Regex;

use crate::item::{HtmlSubtype, SanitizedHtmlItem};
use crate::markup::{
    INLINE_ALLOWED_TAGS, compile_static_regex, decode_entities, is_visually_empty, strip_all_tags,
    strip_tags,
};

/// Elements whose content never renders.
const INVISIBLE_ELEMENTS: &[&str] = &[
    "head", "style", "script", "object", "embed", "applet", "noframes", "noscript", "noembed",
];

static INVISIBLE_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    INVISIBLE_ELEMENTS
        .iter()
        .map(|name| compile_static_regex(&format!(r"(?is)<{name}\b[^>]*>.*?</{name}\s*>")))
        .collect()
});
static BLOCK_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(concat!(
        r"(?i)</?(?:address|blockquote|center|del|div|h[1-9]|ins|isindex|p|pre",
        r"|dir|dl|dt|dd|li|menu|ol|ul|table|th|td|caption",
        r"|form|button|fieldset|legend|input|label|select|optgroup|option|textarea",
        r"|frameset|frame|iframe)\b"
    ))
});
static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| compile_static_regex(r"<h[1-6]"));

/// Decodes entities, drops invisible elements, breaks lines before block
/// tags and keeps only `<strong>`, `<a>` and `<em>`.
#[must_use]
pub fn sanitize(fragment: &str) -> String {
    let mut text = decode_entities(fragment);
    for invisible in INVISIBLE_RES.iter() {
        if invisible.is_match(&text) {
            text = invisible.replace_all(&text, "").into_owned();
        }
    }
    let text = BLOCK_TAG_RE.replace_all(&text, "\n$0");
    strip_tags(&text, INLINE_ALLOWED_TAGS).trim().to_string()
}

/// Sanitized item for `fragment`, or `None` when nothing visible is left.
///
/// Inline tags wrapping nothing (`<strong></strong>`) count as empty.
#[must_use]
pub fn extract(fragment: &str) -> Option<SanitizedHtmlItem> {
    let content = sanitize(fragment);
    if is_visually_empty(&content) || is_visually_empty(&strip_all_tags(&content)) {
        return None;
    }
    let subtype = HEADING_RE.is_match(fragment).then_some(HtmlSubtype::Subhead);
    Some(SanitizedHtmlItem { subtype, content })
}
