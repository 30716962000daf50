//! Integration tests for the rendering pipeline.
//!
//! Lookups go to in-process stub resolvers that count their calls, so the
//! tests can assert on exactly which external requests a document causes.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use mobile_feed::item::{ContentItem, UNSUPPORTED_MESSAGE};
use mobile_feed::{
    Article, ImageInfo, ImageProbe, MediaResolver, MemoryCache, Pipeline, ProbeError, Provider,
    ResolveError, Resolver, VideoHost, normalize,
};
use serde_json::{Value, json};

/// Lookups currently running and the most ever running at once, shared by
/// every stub of one harness.
#[derive(Default)]
struct InFlight {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl InFlight {
    fn enter(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn leave(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }

    fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

struct StubResolver {
    provider: Provider,
    calls: Arc<AtomicUsize>,
    in_flight: Arc<InFlight>,
    delay: Duration,
    payload: Value,
}

#[async_trait]
impl Resolver for StubResolver {
    fn provider(&self) -> Provider {
        self.provider
    }

    async fn resolve(&self, external_id: &str) -> Result<Value, ResolveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.in_flight.enter();
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.leave();
        let mut payload = self.payload.clone();
        if let Value::Object(map) = &mut payload {
            map.insert("requested".to_string(), Value::String(external_id.to_string()));
        }
        Ok(payload)
    }
}

struct StubProbe {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl ImageProbe for StubProbe {
    async fn probe(&self, _url: &str) -> Result<ImageInfo, ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ImageInfo {
            width: 800,
            height: 600,
            mime: "image/jpeg".to_string(),
        })
    }
}

const HARNESS_CONCURRENCY: usize = 4;

struct Harness {
    pipeline: Pipeline,
    calls: Vec<(Provider, Arc<AtomicUsize>)>,
    in_flight: Arc<InFlight>,
    probe_calls: Arc<AtomicUsize>,
}

impl Harness {
    fn new(delay: Duration) -> Self {
        let mut media = MediaResolver::new(Arc::new(MemoryCache::new()));
        let in_flight = Arc::new(InFlight::default());
        let mut calls = Vec::new();
        for provider in [
            Provider::Twitter,
            Provider::Instagram,
            Provider::YouTube,
            Provider::Vimeo,
            Provider::PostTv,
        ] {
            let counter = Arc::new(AtomicUsize::new(0));
            media.register(Box::new(StubResolver {
                provider,
                calls: Arc::clone(&counter),
                in_flight: Arc::clone(&in_flight),
                delay,
                payload: json!({"title": format!("{provider} title")}),
            }));
            calls.push((provider, counter));
        }
        let probe_calls = Arc::new(AtomicUsize::new(0));
        media.set_image_probe(Box::new(StubProbe {
            calls: Arc::clone(&probe_calls),
        }));
        Self {
            pipeline: Pipeline::new(Arc::new(media)).with_concurrency(HARNESS_CONCURRENCY),
            calls,
            in_flight,
            probe_calls,
        }
    }

    fn calls(&self, provider: Provider) -> usize {
        self.calls
            .iter()
            .find(|(p, _)| *p == provider)
            .map_or(0, |(_, counter)| counter.load(Ordering::SeqCst))
    }

    fn total_calls(&self) -> usize {
        self.calls
            .iter()
            .map(|(_, counter)| counter.load(Ordering::SeqCst))
            .sum()
    }
}

fn kinds(items: &[ContentItem]) -> Vec<&'static str> {
    items.iter().map(ContentItem::type_name).collect()
}

const TWEET_EMBED: &str = r#"<blockquote class="twitter-tweet" lang="en"><p>Vote today</p>&mdash; Post Politics (@postpolitics) <a href="https://twitter.com/postpolitics/statuses/398550298915905536">November 7, 2013</a></blockquote>"#;

#[tokio::test]
async fn test_items_follow_fragment_order_and_never_outnumber_fragments() {
    let harness = Harness::new(Duration::ZERO);
    let body = [
        "<p>Opening paragraph.</p>",
        "",
        r#"<img class="size-full" src="http://img.example.com/a.jpg" alt="" />"#,
        "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
        "&nbsp;",
        TWEET_EMBED,
        "<h3>A subhead</h3>",
        r#"<script type="text/javascript" src="x.js"></script><object data="y"></object>"#,
        "http://vimeo.com/76979871",
        "<p>Closing paragraph.</p>",
    ]
    .join("\n");

    let non_empty = body.lines().filter(|line| !line.trim().is_empty()).count();
    let items = harness.pipeline.render_items(&body).await;

    assert!(items.len() <= non_empty);
    assert_eq!(
        kinds(&items),
        vec![
            "sanitized_html",
            "image",
            "video",
            "tweet",
            "sanitized_html",
            "unsupported",
            "video",
            "sanitized_html",
        ]
    );
}

#[tokio::test]
async fn test_order_is_preserved_when_lookups_finish_out_of_order() {
    let harness = Harness::new(Duration::from_millis(20));
    let body = (0..12)
        .map(|n| format!("http://vimeo.com/{}", 1000 + n))
        .collect::<Vec<_>>()
        .join("\n");

    let items = harness.pipeline.render_items(&body).await;
    let ids: Vec<String> = items
        .iter()
        .map(|item| match item {
            ContentItem::Video(video) => video.id.clone().unwrap(),
            other => panic!("unexpected item {other:?}"),
        })
        .collect();
    let expected: Vec<String> = (0..12).map(|n| (1000 + n).to_string()).collect();
    assert_eq!(ids, expected);
    assert_eq!(harness.calls(Provider::Vimeo), 12);
}

#[tokio::test]
async fn test_lookups_run_concurrently_within_the_bound() {
    let harness = Harness::new(Duration::from_millis(20));
    let body = (0..12)
        .map(|n| format!("http://vimeo.com/{}", 2000 + n))
        .collect::<Vec<_>>()
        .join("\n");

    let items = harness.pipeline.render_items(&body).await;
    assert_eq!(items.len(), 12);
    assert_eq!(harness.calls(Provider::Vimeo), 12);

    let peak = harness.in_flight.peak();
    assert!(peak <= HARNESS_CONCURRENCY, "peak {peak} exceeds the bound");
    assert!(peak > 1, "lookups ran one at a time");
}

#[tokio::test]
async fn test_single_lookup_bound_serializes_lookups() {
    let mut harness = Harness::new(Duration::from_millis(5));
    harness.pipeline = harness.pipeline.with_concurrency(1);
    let body = (0..5)
        .map(|n| format!("http://vimeo.com/{}", 3000 + n))
        .collect::<Vec<_>>()
        .join("\n");

    harness.pipeline.render_items(&body).await;
    assert_eq!(harness.in_flight.peak(), 1);
}

#[tokio::test]
async fn test_instagram_link_in_paragraph_looks_up_post_url() {
    let harness = Harness::new(Duration::ZERO);
    let items = harness
        .pipeline
        .render_items("<p>http://instagram.com/p/abc123/</p>")
        .await;

    let ContentItem::Instagram(post) = &items[0] else {
        panic!("expected instagram, got {:?}", items[0]);
    };
    assert_eq!(post.url, "http://instagram.com/p/abc123/");
    assert_eq!(
        post.content.as_ref().unwrap()["requested"],
        "http://instagram.com/p/abc123/"
    );
}

#[tokio::test]
async fn test_quotation_spanning_three_fragments_yields_one_item() {
    let harness = Harness::new(Duration::ZERO);
    let body = "<blockquote>The first line of the quote\nkeeps going here\nand ends &amp; closes.</blockquote>\n<p>After.</p>";

    let items = harness.pipeline.render_items(body).await;
    assert_eq!(items.len(), 2);
    let value = serde_json::to_value(&items[0]).unwrap();
    assert_eq!(value["type"], "sanitized_html");
    assert_eq!(value["subtype"], "blockquote");
    assert_eq!(
        value["content"],
        "The first line of the quote keeps going here and ends & closes."
    );
}

#[tokio::test]
async fn test_vimeo_without_id_reports_error_without_lookup() {
    let harness = Harness::new(Duration::ZERO);
    let items = harness
        .pipeline
        .render_items("http://vimeo.com/channels/staffpicks")
        .await;

    assert_eq!(items.len(), 1);
    let ContentItem::Video(video) = &items[0] else {
        panic!("expected video, got {:?}", items[0]);
    };
    assert_eq!(video.host, VideoHost::Vimeo);
    assert!(video.error.is_some());
    assert_eq!(harness.total_calls(), 0);
}

#[tokio::test]
async fn test_embed_seen_again_is_served_from_cache() {
    let harness = Harness::new(Duration::ZERO);
    let body = format!("<p>Before.</p>\n{TWEET_EMBED}");

    let first = harness.pipeline.render_items(&body).await;
    let second = harness.pipeline.render_items(&body).await;

    assert_eq!(harness.calls(Provider::Twitter), 1);
    assert_eq!(first, second);
    let ContentItem::Tweet(tweet) = &first[1] else {
        panic!("expected tweet, got {:?}", first[1]);
    };
    assert_eq!(tweet.id.as_deref(), Some("398550298915905536"));
    assert_eq!(
        tweet.content.as_ref().unwrap()["requested"],
        "398550298915905536"
    );
}

#[tokio::test]
async fn test_visually_empty_fragments_produce_nothing() {
    let harness = Harness::new(Duration::ZERO);
    let items = harness
        .pipeline
        .render_items("&nbsp;\n<strong></strong>\n<em></em>\n<strong>\n   ")
        .await;
    assert!(items.is_empty(), "got {items:?}");
}

#[tokio::test]
async fn test_image_with_script_is_an_image() {
    let harness = Harness::new(Duration::ZERO);
    let body = r#"<img src="http://img.example.com/chart one.png" /><script src="widget.js"></script>"#;

    let items = harness.pipeline.render_items(body).await;
    assert_eq!(items.len(), 1);
    let ContentItem::Image(image) = &items[0] else {
        panic!("expected image, got {:?}", items[0]);
    };
    assert_eq!(image.width, Some(800));
    assert_eq!(image.height, Some(600));
    assert_eq!(harness.probe_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unsupported_item_message() {
    let harness = Harness::new(Duration::ZERO);
    let items = harness
        .pipeline
        .render_items(r#"<div class="gallery-container">photos</div>"#)
        .await;
    let value = serde_json::to_value(&items).unwrap();
    assert_eq!(
        value,
        json!([{"type": "unsupported", "content": UNSUPPORTED_MESSAGE}])
    );
}

#[tokio::test]
async fn test_missing_resolver_degrades_item() {
    let pipeline = Pipeline::new(Arc::new(MediaResolver::new(Arc::new(MemoryCache::new()))));
    let items = pipeline
        .render_items("https://www.youtube.com/watch?v=dQw4w9WgXcQ")
        .await;

    let ContentItem::Video(video) = &items[0] else {
        panic!("expected video, got {:?}", items[0]);
    };
    assert_eq!(
        video.media_url.as_deref(),
        Some("https://www.youtube.com/watch?v=dQw4w9WgXcQ")
    );
    assert!(video.error.is_some());
}

#[tokio::test]
async fn test_render_envelope_shape() {
    let harness = Harness::new(Duration::ZERO);
    let article: Article = serde_json::from_value(json!({
        "id": 1001,
        "uri": "/politics/story/?json=mobile",
        "title": "Election day",
        "authors": [{"name": "Ann Reporter", "email": "ann@example.com"}],
        "published": 1_383_840_000_000_i64,
        "modified": 1_383_843_600_000_i64,
        "permalink": "http://www.example.com/politics/story/",
        "short_url": "http://wapo.st/x",
        "body": "<p>Polls open.</p>\nhttp://vimeo.com/76979871",
        "metadata": {"adkey": "politics/story", "omniture": {"channel": "politics"}}
    }))
    .unwrap();

    let value = serde_json::to_value(harness.pipeline.render(&article).await).unwrap();
    assert_eq!(value["type"], "wordpress_story");
    assert_eq!(value["id"], 1001);
    assert_eq!(value["uri"], "/politics/story/");
    assert_eq!(value["lmt"], 1_383_843_600_000_i64);
    assert_eq!(value["shareurl"], "http://wapo.st/x");
    assert_eq!(value["contenturl"], "http://www.example.com/politics/story/");
    assert_eq!(value["omniture"], json!({"channel": "politics"}));
    assert_eq!(value["items"].as_array().unwrap().len(), 2);
    assert_eq!(value["items"][1]["host"], "vimeo");
}

#[test]
fn test_normalize_is_idempotent_on_realistic_body() {
    let body = "<style>p{}</style>Intro &amp;amp; more\n[wapoad type=\"inline\"]\n<blockquote class=\"twitter-tweet\"><p>Split\n\ntweet</p></blockquote>";
    let once = normalize(body);
    assert_eq!(normalize(&once), once);
}
