//! Article input and the envelope rendered around its items.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::item::ContentItem;

/// Envelope `type` for every rendered article.
pub const ENVELOPE_TYPE: &str = "wordpress_story";

/// Display name given to authors without one.
pub const GUEST_AUTHOR: &str = "Guest";

/// An article as handed over by the CMS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: u64,
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub authors: Vec<Author>,
    /// Milliseconds since the Unix epoch.
    #[serde(default)]
    pub published: i64,
    /// Milliseconds since the Unix epoch.
    #[serde(default)]
    pub modified: i64,
    #[serde(default)]
    pub permalink: String,
    #[serde(default)]
    pub short_url: Option<String>,
    #[serde(default)]
    pub lead_image: Option<String>,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub metadata: ArticleMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl Author {
    /// Authors without a display name are shown as [`GUEST_AUTHOR`] and
    /// lose their email.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let name = self.name.trim();
        if name.is_empty() {
            Self {
                name: GUEST_AUTHOR.to_string(),
                email: None,
            }
        } else {
            Self {
                name: name.to_string(),
                email: self.email.clone(),
            }
        }
    }
}

/// Opaque analytics and advertising data, passed through unmodified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleMetadata {
    #[serde(default)]
    pub adkey: String,
    #[serde(default = "empty_object")]
    pub omniture: Value,
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

impl Default for ArticleMetadata {
    fn default() -> Self {
        Self {
            adkey: String::new(),
            omniture: empty_object(),
        }
    }
}

impl ArticleMetadata {
    /// Ad key for a blog post: `{section}/blog/{blog_id}` with dashes in the
    /// blog id turned into underscores.
    #[must_use]
    pub fn blog_adkey(section: &str, blog_id: &str) -> String {
        format!("{section}/blog/{}", blog_id.replace('-', "_"))
    }
}

/// The rendered article.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub id: u64,
    pub uri: String,
    pub title: String,
    pub authors: Vec<Author>,
    pub published: i64,
    pub lmt: i64,
    pub lead_image: Option<String>,
    pub shareurl: Option<String>,
    pub contenturl: String,
    pub adkey: String,
    pub omniture: Value,
    pub items: Vec<ContentItem>,
}

impl Envelope {
    #[must_use]
    pub fn new(article: &Article, items: Vec<ContentItem>) -> Self {
        Self {
            kind: ENVELOPE_TYPE,
            id: article.id,
            uri: path_only(&article.uri).to_string(),
            title: article.title.clone(),
            authors: article.authors.iter().map(Author::normalized).collect(),
            published: article.published,
            lmt: article.modified,
            lead_image: non_blank(article.lead_image.as_deref()),
            shareurl: non_blank(article.short_url.as_deref()),
            contenturl: article.permalink.clone(),
            adkey: article.metadata.adkey.clone(),
            omniture: article.metadata.omniture.clone(),
            items,
        }
    }
}

/// The request path without its query string.
fn path_only(uri: &str) -> &str {
    uri.split_once('?').map_or(uri, |(path, _)| path)
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn article() -> Article {
        serde_json::from_value(json!({
            "id": 42,
            "uri": "/blogs/post-politics/wp/2013/11/07/story/?json=mobile",
            "title": "Story",
            "authors": [{"name": "Ann Reporter", "email": "ann@example.com"}, {"name": "  "}],
            "published": 1_383_840_000_000_i64,
            "modified": 1_383_843_600_000_i64,
            "permalink": "http://www.example.com/story/",
            "short_url": "http://wapo.st/abc",
            "lead_image": "   ",
            "body": "Hello",
            "metadata": {"adkey": "politics/blog/post_politics", "omniture": {"channel": "wp - politics"}}
        }))
        .unwrap()
    }

    #[test]
    fn test_article_defaults_for_missing_fields() {
        let article: Article = serde_json::from_value(json!({"id": 1})).unwrap();
        assert!(article.body.is_empty());
        assert!(article.authors.is_empty());
        assert_eq!(article.metadata.omniture, json!({}));
    }

    #[test]
    fn test_envelope_keys_and_order() {
        let value = serde_json::to_value(Envelope::new(&article(), Vec::new())).unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        let mut expected = vec![
            "type", "id", "uri", "title", "authors", "published", "lmt", "lead_image", "shareurl",
            "contenturl", "adkey", "omniture", "items",
        ];
        expected.sort_unstable();
        let mut keys_sorted = keys.clone();
        keys_sorted.sort_unstable();
        assert_eq!(keys_sorted, expected);
        assert_eq!(value["type"], "wordpress_story");
    }

    #[test]
    fn test_envelope_field_mapping() {
        let envelope = Envelope::new(&article(), Vec::new());
        assert_eq!(envelope.uri, "/blogs/post-politics/wp/2013/11/07/story/");
        assert_eq!(envelope.lmt, 1_383_843_600_000);
        assert_eq!(envelope.shareurl.as_deref(), Some("http://wapo.st/abc"));
        assert_eq!(envelope.contenturl, "http://www.example.com/story/");
        assert_eq!(envelope.adkey, "politics/blog/post_politics");
        assert_eq!(envelope.omniture, json!({"channel": "wp - politics"}));
    }

    #[test]
    fn test_blank_lead_image_is_null() {
        let value = serde_json::to_value(Envelope::new(&article(), Vec::new())).unwrap();
        assert!(value["lead_image"].is_null());
    }

    #[test]
    fn test_nameless_author_becomes_guest() {
        let envelope = Envelope::new(&article(), Vec::new());
        assert_eq!(envelope.authors[0].name, "Ann Reporter");
        assert_eq!(
            envelope.authors[1],
            Author {
                name: GUEST_AUTHOR.to_string(),
                email: None
            }
        );
        let value = serde_json::to_value(&envelope.authors[1]).unwrap();
        assert_eq!(value, json!({"name": "Guest", "email": null}));
    }

    #[test]
    fn test_blog_adkey() {
        assert_eq!(
            ArticleMetadata::blog_adkey("politics", "post-politics"),
            "politics/blog/post_politics"
        );
    }
}
