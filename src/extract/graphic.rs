//! Promo graphics (`post-embedded-graphic` blocks).

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::item::GraphicItem;
use crate::markup::{compile_static_regex, first_capture};
use crate::probe::{ImageInfo, ProbeError};

static PROMO_IMAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r#"(?i)promo-image="(.*?)""#));
static PROMO_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r#"(?i)promo-link="(.*?)""#));
static PROMO_CAPTION_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r#"(?i)promo-caption="(.*?)""#));

#[must_use]
pub fn draft(fragment: &str) -> GraphicItem {
    GraphicItem {
        image_url: first_capture(fragment, &PROMO_IMAGE_RE).filter(|url| !url.is_empty()),
        image_width: None,
        image_height: None,
        link_url: first_capture(fragment, &PROMO_LINK_RE),
        caption: first_capture(fragment, &PROMO_CAPTION_RE),
    }
}

/// Folds the probed size in. Graphics carry no error field, so a failed
/// probe just leaves the size unset.
#[must_use]
pub fn finish(mut item: GraphicItem, probed: Option<Result<ImageInfo, ProbeError>>) -> GraphicItem {
    match probed {
        Some(Ok(info)) => {
            item.image_width = Some(info.width);
            item.image_height = Some(info.height);
        }
        Some(Err(error)) => debug!(error = %error, "graphic size unavailable"),
        None => {}
    }
    item
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRAPHIC: &str = r#"<div class="post-embedded-graphic" promo-image="http://img.example/chart.png" promo-link="http://www.example.com/graphic/" promo-caption="Where the votes are"></div>"#;

    #[test]
    fn test_draft_reads_promo_attributes() {
        let item = draft(GRAPHIC);
        assert_eq!(item.image_url.as_deref(), Some("http://img.example/chart.png"));
        assert_eq!(item.link_url.as_deref(), Some("http://www.example.com/graphic/"));
        assert_eq!(item.caption.as_deref(), Some("Where the votes are"));
    }

    #[test]
    fn test_missing_attributes_are_null() {
        let item = draft(r#"<div class="post-embedded-graphic"></div>"#);
        assert!(item.image_url.is_none());
        assert!(item.link_url.is_none());
        assert!(item.caption.is_none());
    }

    #[test]
    fn test_finish_sets_size() {
        let info = ImageInfo {
            width: 620,
            height: 400,
            mime: "image/png".to_string(),
        };
        let item = finish(draft(GRAPHIC), Some(Ok(info)));
        assert_eq!(item.image_width, Some(620));
        assert_eq!(item.image_height, Some(400));
    }

    #[test]
    fn test_finish_failed_probe_leaves_size_unset() {
        let item = finish(draft(GRAPHIC), Some(Err(ProbeError::NotConfigured)));
        assert!(item.image_width.is_none());
        assert_eq!(item.caption.as_deref(), Some("Where the votes are"));
    }
}
