//! Article rendering: normalize, split, classify, draft, look up.
//!
//! Drafting walks the fragments once, in order, and is the only place with
//! cross-fragment state (the open quotation). Lookups then run concurrently
//! through an order-preserving buffered stream, so item order always matches
//! fragment order.

use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use thiserror::Error;
use tracing::{debug, info};

use crate::article::{Article, Envelope};
use crate::classify::{ContinuationTracker, Kind, classify};
use crate::config::DEFAULT_CONCURRENCY;
use crate::extract::{self, Draft, blockquote_item};
use crate::fragment::split;
use crate::item::ContentItem;
use crate::preprocess::normalize;
use crate::resolver::MediaResolver;

/// Fatal rendering failures. Per-item problems never surface here; they are
/// recorded on the item.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no article supplied")]
    MissingArticle,

    #[error("invalid article JSON: {0}")]
    InvalidArticle(#[source] serde_json::Error),

    #[error("cannot encode envelope: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Renders articles against a shared [`MediaResolver`].
#[derive(Debug, Clone)]
pub struct Pipeline {
    media: Arc<MediaResolver>,
    concurrency: usize,
}

impl Pipeline {
    #[must_use]
    pub fn new(media: Arc<MediaResolver>) -> Self {
        Self {
            media,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Sets the number of lookups in flight per document (at least one).
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Drafts every item of `body` without performing lookups.
    #[must_use]
    pub fn drafts(body: &str) -> Vec<Draft> {
        let normalized = normalize(body);
        let mut tracker = ContinuationTracker::new();
        let mut drafts = Vec::new();

        for fragment in split(&normalized) {
            let pending = tracker.is_pending();
            let kind = classify(&fragment.text, pending);
            debug!(index = fragment.index, ?kind, pending, "fragment classified");

            // An open quotation absorbs every fragment up to its closing marker.
            if pending || kind == Kind::Quotation {
                if let Some(content) = tracker.feed(&fragment.text) {
                    drafts.push(Draft::Ready(blockquote_item(content)));
                }
                continue;
            }
            if let Some(draft) = extract::draft(kind, &fragment.text) {
                drafts.push(draft);
            }
        }

        if let Some(content) = tracker.finish() {
            drafts.push(Draft::Ready(blockquote_item(content)));
        }
        drafts
    }

    /// Renders the items of `body` in source order.
    pub async fn render_items(&self, body: &str) -> Vec<ContentItem> {
        let drafts = Self::drafts(body);
        let lookups = drafts.iter().filter(|draft| draft.needs_lookup()).count();
        debug!(items = drafts.len(), lookups, "drafting complete");

        stream::iter(drafts)
            .map(|draft| extract::complete(draft, &self.media))
            .buffered(self.concurrency)
            .collect()
            .await
    }

    /// Renders `article` into its envelope.
    #[tracing::instrument(skip_all, fields(article_id = article.id))]
    pub async fn render(&self, article: &Article) -> Envelope {
        let items = self.render_items(&article.body).await;
        let degraded = items.iter().filter(|item| item.error().is_some()).count();
        info!(items = items.len(), degraded, "article rendered");
        Envelope::new(article, items)
    }

    /// Parses an article from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::MissingArticle`] for blank input or `null`,
    /// and [`PipelineError::InvalidArticle`] for anything that does not
    /// decode as an article.
    pub fn parse_article(input: &str) -> Result<Article, PipelineError> {
        if input.trim().is_empty() {
            return Err(PipelineError::MissingArticle);
        }
        serde_json::from_str::<Option<Article>>(input)
            .map_err(PipelineError::InvalidArticle)?
            .ok_or(PipelineError::MissingArticle)
    }

    /// Parses, renders and encodes in one step.
    ///
    /// # Errors
    ///
    /// See [`Pipeline::parse_article`]; encoding failures surface as
    /// [`PipelineError::Encode`].
    pub async fn render_json(&self, input: &str) -> Result<String, PipelineError> {
        let article = Self::parse_article(input)?;
        let envelope = self.render(&article).await;
        serde_json::to_string(&envelope).map_err(PipelineError::Encode)
    }
}
