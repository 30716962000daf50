//! Per-kind field extraction.
//!
//! Extraction is split in two so the pipeline can read every fragment in
//! order and then run lookups concurrently:
//!
//! - [`draft`] - synchronous, reads only the fragment
//! - [`complete`] - performs the draft's lookup (if any) through the
//!   [`MediaResolver`] and folds the answer in
//!
//! The `finish` functions in the submodules are pure, so every lookup
//! outcome can be tested without a network.

pub mod graphic;
pub mod html;
pub mod image;
pub mod social;
pub mod video;

use tracing::debug;

use crate::classify::Kind;
use crate::item::{
    BlockquoteItem, ContentItem, GraphicItem, ImageItem, InstagramItem, TweetItem, VideoItem,
};
use crate::probe::{ImageInfo, ProbeError};
use crate::resolver::{MediaResolver, Provider};

/// An item whose external fields may still be missing.
#[derive(Debug, Clone, PartialEq)]
pub enum Draft {
    /// Nothing left to look up.
    Ready(ContentItem),
    Image(ImageItem),
    Graphic(GraphicItem),
    Tweet(TweetItem),
    Instagram(InstagramItem),
    Video(VideoItem),
}

impl Draft {
    /// True if completing the draft calls out to the resolver or probe.
    #[must_use]
    pub fn needs_lookup(&self) -> bool {
        match self {
            Self::Ready(_) => false,
            Self::Image(item) => item.src.is_some(),
            Self::Graphic(item) => item.image_url.is_some(),
            Self::Tweet(item) => item.id.is_some() && item.error.is_none(),
            Self::Instagram(_) => true,
            Self::Video(item) => video::lookup_key(item).is_some(),
        }
    }

    /// The item as it stands, lookups skipped.
    #[must_use]
    pub fn into_item(self) -> ContentItem {
        match self {
            Self::Ready(item) => item,
            Self::Image(item) => ContentItem::Image(item),
            Self::Graphic(item) => ContentItem::Graphic(item),
            Self::Tweet(item) => ContentItem::Tweet(item),
            Self::Instagram(item) => ContentItem::Instagram(item),
            Self::Video(item) => ContentItem::Video(item),
        }
    }
}

/// Drafts the item for a classified fragment.
///
/// Returns `None` for fragments that contribute nothing: [`Kind::Empty`]
/// and text that sanitizes to nothing. [`Kind::Quotation`] fragments belong to
/// the [`ContinuationTracker`](crate::classify::ContinuationTracker) and are
/// never drafted here.
#[must_use]
pub fn draft(kind: Kind, fragment: &str) -> Option<Draft> {
    let draft = match kind {
        Kind::Image => Draft::Image(image::draft(fragment)),
        Kind::Instagram => Draft::Instagram(social::instagram_draft(fragment)),
        Kind::Tweet => Draft::Tweet(social::tweet_draft(fragment)),
        Kind::Video(host) => Draft::Video(video::draft(host, fragment)),
        Kind::Graphic => Draft::Graphic(graphic::draft(fragment)),
        Kind::Unsupported => Draft::Ready(ContentItem::Unsupported),
        Kind::Quotation | Kind::Empty => return None,
        Kind::SanitizedHtml => Draft::Ready(ContentItem::SanitizedHtml(html::extract(fragment)?)),
    };
    Some(draft)
}

/// Blockquote item from already-merged plain text.
#[must_use]
pub fn blockquote_item(content: String) -> ContentItem {
    ContentItem::Blockquote(BlockquoteItem { content })
}

/// Runs the draft's lookup and returns the finished item.
pub async fn complete(draft: Draft, media: &MediaResolver) -> ContentItem {
    match draft {
        Draft::Ready(item) => item,
        Draft::Image(item) => {
            let probed = probe(media, item.src.as_deref()).await;
            ContentItem::Image(image::finish(item, probed))
        }
        Draft::Graphic(item) => {
            let probed = probe(media, item.image_url.as_deref()).await;
            ContentItem::Graphic(graphic::finish(item, probed))
        }
        Draft::Tweet(item) => match item.id.clone() {
            Some(id) if item.error.is_none() => {
                let resolved = media.resolve(Provider::Twitter, &id).await;
                ContentItem::Tweet(social::tweet_finish(item, resolved))
            }
            _ => ContentItem::Tweet(item),
        },
        Draft::Instagram(item) => {
            let resolved = media.resolve(Provider::Instagram, &item.url).await;
            ContentItem::Instagram(social::instagram_finish(item, resolved))
        }
        Draft::Video(item) => match video::lookup_key(&item).map(str::to_string) {
            Some(key) => {
                let resolved = media.resolve(Provider::from(item.host), &key).await;
                ContentItem::Video(video::finish(item, resolved))
            }
            None => {
                debug!(host = item.host.as_str(), "video without id; skipping lookup");
                ContentItem::Video(item)
            }
        },
    }
}

async fn probe(media: &MediaResolver, src: Option<&str>) -> Option<Result<ImageInfo, ProbeError>> {
    match src {
        Some(src) => Some(media.probe_image(&image::probe_url(src)).await),
        None => None,
    }
}
