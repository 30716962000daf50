//! Inline images: `[caption]` shortcodes and bare `<img>` tags.

use std::sync::LazyLock;

use regex::Regex;

use crate::item::ImageItem;
use crate::markup::{INLINE_ALLOWED_TAGS, compile_static_regex, decode_entities, first_capture, strip_tags};
use crate::probe::{ImageInfo, ProbeError};

/// Captions this short are editor artefacts, not text.
const MIN_CAPTION_CHARS: usize = 3;

static CAPTION_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r#"(?i)<p class="wp-caption-text">(.*?)</p>"#));
static IMG_SRC_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r#"(?is)<img\b[^>]*?\bsrc\s*=\s*["']([^"']+)["']"#));

/// Reads caption and source from the fragment. Size fields stay unset until
/// the probe answers.
#[must_use]
pub fn draft(fragment: &str) -> ImageItem {
    ImageItem {
        caption: caption(fragment),
        src: first_capture(fragment, &IMG_SRC_RE).filter(|src| !src.is_empty()),
        width: None,
        height: None,
        mime: None,
        error: None,
    }
}

/// Caption text with only inline markup left.
#[must_use]
pub fn caption(fragment: &str) -> Option<String> {
    let raw = CAPTION_RE.captures(fragment)?.get(1)?.as_str();
    let text = strip_tags(&decode_entities(raw), INLINE_ALLOWED_TAGS);
    let text = text.trim();
    (text.chars().count() > MIN_CAPTION_CHARS).then(|| text.to_string())
}

/// The URL handed to the probe. Unencoded spaces are common in CMS uploads.
#[must_use]
pub fn probe_url(src: &str) -> String {
    src.replace(' ', "%20")
}

/// Folds the probe answer into the item.
#[must_use]
pub fn finish(mut item: ImageItem, probed: Option<Result<ImageInfo, ProbeError>>) -> ImageItem {
    match probed {
        Some(Ok(info)) => {
            item.width = Some(info.width);
            item.height = Some(info.height);
            item.mime = Some(info.mime);
        }
        Some(Err(error)) => item.error = Some(error.to_string()),
        None => {}
    }
    item
}
