//! Tag, entity and URL helpers shared by the preprocessor, classifier and extractors.
//!
//! These are structural string utilities, not an HTML parser: article bodies
//! arrive as CMS-encoded fragments that are frequently unbalanced, so every
//! helper works on raw text and never fails.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Inline tags that survive sanitisation (`<strong>`, `<a>`, `<em>`).
pub const INLINE_ALLOWED_TAGS: &[&str] = &["strong", "a", "em"];

/// Tokens that render as nothing in the mobile apps.
const VISUALLY_EMPTY: &[&str] = &[
    "&nbsp;", "[]", "<em>", "<strong>", "</em>", "</strong>", "< >",
];

/// Named entities decoded for matching and display. `&amp;` must stay last so
/// that `&amp;lt;` decodes to `&lt;` rather than `<`.
const NAMED_ENTITIES: &[(&str, &str)] = &[
    ("&quot;", "\""),
    ("&apos;", "'"),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&nbsp;", "\u{00a0}"),
    ("&ndash;", "\u{2013}"),
    ("&mdash;", "\u{2014}"),
    ("&hellip;", "\u{2026}"),
    ("&lsquo;", "\u{2018}"),
    ("&rsquo;", "\u{2019}"),
    ("&ldquo;", "\u{201c}"),
    ("&rdquo;", "\u{201d}"),
    ("&amp;", "&"),
];

/// Compiles a regex at static init; panics on invalid pattern.
pub(crate) fn compile_static_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid static regex '{pattern}': {e}"))
}

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"(?s)</?([a-zA-Z][a-zA-Z0-9]*)\b[^>]*>"));
static COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| compile_static_regex(r"(?s)<!--.*?-->"));
static NUMERIC_ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"&#(?:[xX]([0-9a-fA-F]{1,6})|([0-9]{1,7}));"));
static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r#"(?i)(?:https?:)?//[^\s<>"'`]+|\bwww\d{0,3}\.[^\s<>"'`]+"#)
});

/// Returns true when `text` renders as nothing: blank after trimming, or one of
/// the stray tokens the CMS editor leaves behind.
#[must_use]
pub fn is_visually_empty(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.is_empty() || VISUALLY_EMPTY.contains(&trimmed)
}

/// Removes every tag except those named in `allowed` (lowercase names).
/// HTML comments are always removed.
#[must_use]
pub fn strip_tags(text: &str, allowed: &[&str]) -> String {
    let without_comments = COMMENT_RE.replace_all(text, "");
    TAG_RE
        .replace_all(&without_comments, |caps: &Captures<'_>| {
            let name = caps[1].to_ascii_lowercase();
            if allowed.contains(&name.as_str()) {
                caps[0].to_string()
            } else {
                String::new()
            }
        })
        .into_owned()
}

/// Removes all markup, keeping only text.
#[must_use]
pub fn strip_all_tags(text: &str) -> String {
    strip_tags(text, &[])
}

/// Decodes numeric character references and a fixed set of named entities.
#[must_use]
pub fn decode_entities(text: &str) -> String {
    let mut decoded = NUMERIC_ENTITY_RE
        .replace_all(text, |caps: &Captures<'_>| {
            let code = match (caps.get(1), caps.get(2)) {
                (Some(hex), _) => u32::from_str_radix(hex.as_str(), 16).ok(),
                (None, Some(dec)) => dec.as_str().parse::<u32>().ok(),
                (None, None) => None,
            };
            code.and_then(char::from_u32)
                .map_or_else(|| caps[0].to_string(), |c| c.to_string())
        })
        .into_owned();
    for (entity, replacement) in NAMED_ENTITIES {
        if decoded.contains(entity) {
            decoded = decoded.replace(entity, replacement);
        }
    }
    decoded
}

/// Returns every URL-looking token in `text`, in order of appearance.
///
/// Protocol-relative (`//host/...`) and bare `www.` forms are included.
/// Trailing sentence punctuation is trimmed.
#[must_use]
pub fn find_urls(text: &str) -> Vec<&str> {
    URL_RE
        .find_iter(text)
        .map(|m| m.as_str().trim_end_matches(['.', ',', ';', ':', '!', '?', ')']))
        .filter(|url| !url.is_empty())
        .collect()
}

/// Returns the last URL in `text`. Embed snippets put the canonical permalink
/// at the end (the date link of a tweet, the `src` of a player iframe).
#[must_use]
pub fn last_url(text: &str) -> Option<&str> {
    find_urls(text).pop()
}

/// Returns the first capture group of `regex` in `text`, trimmed.
#[must_use]
pub fn first_capture(text: &str, regex: &Regex) -> Option<String> {
    regex
        .captures(text)
        .and_then(|caps| caps.get(1).map(|m| m.as_str().trim().to_string()))
}

/// Returns the `/`-separated segment at `index`, if present and non-empty.
#[must_use]
pub fn path_segment(text: &str, index: usize) -> Option<&str> {
    text.split('/').nth(index).filter(|segment| !segment.is_empty())
}

/// Cuts `value` at the first character that cannot belong to an identifier
/// (query, fragment, quote, tag or whitespace).
#[must_use]
pub fn cut_identifier(value: &str) -> &str {
    let end = value
        .find(|c: char| matches!(c, '?' | '&' | '#' | '/' | '"' | '\'' | '<' | '>') || c.is_whitespace())
        .unwrap_or(value.len());
    &value[..end]
}

/// Returns the leading run of ASCII digits in `value`.
#[must_use]
pub fn leading_digits(value: &str) -> &str {
    let end = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    &value[..end]
}
