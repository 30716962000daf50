//! Typed content items and their JSON shapes.
//!
//! Each item serialises as one flat object with a `type` discriminator. Field
//! names follow the mobile app contract (`mediaURL`, `imageWidth`, ...), so
//! they are renamed explicitly rather than derived from Rust names.

use serde::ser::Serializer;
use serde::Serialize;
use serde_json::Value;

use crate::classify::VideoHost;

/// Message carried by every [`ContentItem::Unsupported`] item.
pub const UNSUPPORTED_MESSAGE: &str =
    "This embedded element is not supported in mobile applications. Sorry.";

/// An inline image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageItem {
    pub caption: Option<String>,
    pub src: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub mime: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// An embedded tweet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TweetItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub content: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// An embedded Instagram post.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstagramItem {
    pub url: String,
    pub content: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// An embedded video from one of the supported hosts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoItem {
    pub url: Option<String>,
    pub host: VideoHost,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "mediaURL")]
    pub media_url: Option<String>,
    #[serde(rename = "imageURL")]
    pub image_url: Option<String>,
    #[serde(rename = "imageWidth")]
    pub image_width: Option<u64>,
    #[serde(rename = "imageHeight")]
    pub image_height: Option<u64>,
    pub caption: Option<String>,
    #[serde(rename = "embedCode", skip_serializing_if = "Option::is_none")]
    pub embed_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VideoItem {
    /// An item for `host` with every metadata field unset.
    #[must_use]
    pub fn empty(host: VideoHost, url: Option<String>) -> Self {
        Self {
            url,
            host,
            id: None,
            media_url: None,
            image_url: None,
            image_width: None,
            image_height: None,
            caption: None,
            embed_code: None,
            content: None,
            error: None,
        }
    }
}

/// A promo graphic linking elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphicItem {
    #[serde(rename = "imageURL")]
    pub image_url: Option<String>,
    #[serde(rename = "imageWidth")]
    pub image_width: Option<u32>,
    #[serde(rename = "imageHeight")]
    pub image_height: Option<u32>,
    #[serde(rename = "linkURL")]
    pub link_url: Option<String>,
    pub caption: Option<String>,
}

/// A quotation, possibly merged from several fragments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockquoteItem {
    pub content: String,
}

/// Presentation hint for sanitized HTML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HtmlSubtype {
    Subhead,
}

/// Body text reduced to a small inline tag set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SanitizedHtmlItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtype: Option<HtmlSubtype>,
    pub content: String,
}

/// One typed, app-consumable content item.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentItem {
    Image(ImageItem),
    Tweet(TweetItem),
    Instagram(InstagramItem),
    Video(VideoItem),
    Graphic(GraphicItem),
    Blockquote(BlockquoteItem),
    SanitizedHtml(SanitizedHtmlItem),
    Unsupported,
}

impl ContentItem {
    /// The `type` discriminator written to JSON.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Image(_) => "image",
            Self::Tweet(_) => "tweet",
            Self::Instagram(_) => "instagram",
            Self::Video(_) => "video",
            Self::Graphic(_) => "embedded_graphic",
            Self::Blockquote(_) | Self::SanitizedHtml(_) => "sanitized_html",
            Self::Unsupported => "unsupported",
        }
    }

    /// The item's lookup error, if it carries one.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Image(item) => item.error.as_deref(),
            Self::Tweet(item) => item.error.as_deref(),
            Self::Instagram(item) => item.error.as_deref(),
            Self::Video(item) => item.error.as_deref(),
            Self::Graphic(_) | Self::Blockquote(_) | Self::SanitizedHtml(_) | Self::Unsupported => {
                None
            }
        }
    }
}

#[derive(Serialize)]
struct Tagged<'a, T: Serialize> {
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    subtype: Option<&'static str>,
    #[serde(flatten)]
    body: &'a T,
}

#[derive(Serialize)]
struct UnsupportedBody {
    content: &'static str,
}

fn tagged<S: Serializer, T: Serialize>(
    serializer: S,
    kind: &'static str,
    subtype: Option<&'static str>,
    body: &T,
) -> Result<S::Ok, S::Error> {
    Tagged {
        kind,
        subtype,
        body,
    }
    .serialize(serializer)
}

impl Serialize for ContentItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let kind = self.type_name();
        match self {
            Self::Image(item) => tagged(serializer, kind, None, item),
            Self::Tweet(item) => tagged(serializer, kind, None, item),
            Self::Instagram(item) => tagged(serializer, kind, None, item),
            Self::Video(item) => tagged(serializer, kind, None, item),
            Self::Graphic(item) => tagged(serializer, kind, None, item),
            Self::Blockquote(item) => tagged(serializer, kind, Some("blockquote"), item),
            Self::SanitizedHtml(item) => tagged(serializer, kind, None, item),
            Self::Unsupported => tagged(
                serializer,
                kind,
                None,
                &UnsupportedBody {
                    content: UNSUPPORTED_MESSAGE,
                },
            ),
        }
    }
}
