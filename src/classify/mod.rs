//! Fragment classification against a fixed, ordered rule table.
//!
//! # Architecture
//!
//! - [`Kind`] - closed set of content kinds a fragment can map to
//! - [`RULES`] - `(predicate, kind)` pairs evaluated in order; first match wins
//! - [`classify`] - evaluates [`RULES`] for one fragment
//! - [`ContinuationTracker`] - merges quotations spanning several fragments
//!
//! Embed markers (image, social, video, graphic) come before the broad
//! denylist and quotation rules, which would otherwise shadow them: a
//! quotation can itself contain a disallowed `<iframe>`.

mod continuation;

pub use continuation::ContinuationTracker;

use serde::Serialize;
use tracing::trace;

use crate::markup::is_visually_empty;

/// Closing marker of a quotation.
pub const QUOTATION_CLOSE: &str = "</blockquote>";

/// Denylisted constructs that do not translate to the mobile apps.
const UNSUPPORTED_MARKERS: &[&str] = &[
    "gallery-container",
    "gallery-caption",
    "<object",
    "<embed",
    "<script",
    "[script",
    "<style",
    "<link",
    "iframe",
    "< async",
];

/// Video host recognised by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoHost {
    YouTube,
    Vimeo,
    /// In-house video platform.
    PostTv,
}

impl VideoHost {
    /// Stable label used in item output and cache keys.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::YouTube => "youtube",
            Self::Vimeo => "vimeo",
            Self::PostTv => "posttv",
        }
    }
}

/// The content kind selected for a fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Image,
    Instagram,
    Tweet,
    Video(VideoHost),
    Graphic,
    Unsupported,
    Quotation,
    /// Renders as nothing; contributes no item.
    Empty,
    SanitizedHtml,
}

/// Signature shared by every classification predicate.
pub type Predicate = fn(&str, bool) -> bool;

/// Classification rules in priority order. The last rule always matches.
pub static RULES: [(Predicate, Kind); 11] = [
    (is_image, Kind::Image),
    (is_instagram, Kind::Instagram),
    (is_tweet, Kind::Tweet),
    (is_youtube, Kind::Video(VideoHost::YouTube)),
    (is_vimeo, Kind::Video(VideoHost::Vimeo)),
    (is_posttv, Kind::Video(VideoHost::PostTv)),
    (is_graphic, Kind::Graphic),
    (is_unsupported, Kind::Unsupported),
    (is_quotation, Kind::Quotation),
    (is_empty, Kind::Empty),
    (always, Kind::SanitizedHtml),
];

/// Classifies one fragment.
///
/// `continuation_pending` is true while an earlier fragment opened a
/// quotation that has not been closed yet.
#[must_use]
pub fn classify(fragment: &str, continuation_pending: bool) -> Kind {
    let kind = RULES
        .iter()
        .find(|(matches, _)| matches(fragment, continuation_pending))
        .map_or(Kind::SanitizedHtml, |(_, kind)| *kind);
    trace!(?kind, continuation_pending, "fragment classified");
    kind
}

/// Embeds and plain links look alike; a fragment carrying an `href` only
/// counts as an embed when `embed_marker` is present too.
fn embed_not_link(fragment: &str, embed_marker: &str) -> bool {
    !fragment.contains("href") || fragment.contains(embed_marker)
}

fn is_image(fragment: &str, _pending: bool) -> bool {
    fragment.contains("[caption") || fragment.contains("<img")
}

fn is_instagram(fragment: &str, _pending: bool) -> bool {
    fragment.contains("/instagram.com/") && embed_not_link(fragment, "<iframe")
}

fn is_tweet(fragment: &str, _pending: bool) -> bool {
    fragment.contains("/twitter.com/") && embed_not_link(fragment, "<blockquote")
}

fn is_youtube(fragment: &str, _pending: bool) -> bool {
    (fragment.contains("youtube.com") || fragment.contains("youtu.be"))
        && embed_not_link(fragment, "<embed")
}

fn is_vimeo(fragment: &str, _pending: bool) -> bool {
    fragment.contains("vimeo.com") && embed_not_link(fragment, "<embed")
}

fn is_posttv(fragment: &str, _pending: bool) -> bool {
    (fragment.contains("/posttv/") || fragment.contains("posttv-video-embed"))
        && embed_not_link(fragment, "<embed")
}

fn is_graphic(fragment: &str, _pending: bool) -> bool {
    fragment.contains("post-embedded-graphic")
}

fn is_unsupported(fragment: &str, _pending: bool) -> bool {
    let lowered = fragment.to_ascii_lowercase();
    UNSUPPORTED_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}

fn is_quotation(fragment: &str, pending: bool) -> bool {
    pending || fragment.contains("<blockquote")
}

fn is_empty(fragment: &str, _pending: bool) -> bool {
    is_visually_empty(fragment)
}

fn always(_fragment: &str, _pending: bool) -> bool {
    true
}
