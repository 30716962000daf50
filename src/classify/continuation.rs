//! Cross-fragment quotation merging.

use tracing::{debug, warn};

use super::QUOTATION_CLOSE;
use crate::markup::{decode_entities, is_visually_empty, strip_all_tags};

/// Accumulates a quotation that the CMS encoder split over several lines.
///
/// `pending` is true only between an opening fragment lacking
/// `</blockquote>` and the fragment that contains it.
#[derive(Debug, Default)]
pub struct ContinuationTracker {
    pending: bool,
    parts: Vec<String>,
}

impl ContinuationTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true while a quotation is open.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Feeds a quotation fragment, or any fragment while a quotation is open.
    ///
    /// Returns the merged plain-text content once the closing marker is seen
    /// and the content is not visually empty.
    pub fn feed(&mut self, fragment: &str) -> Option<String> {
        let text = decode_entities(&strip_all_tags(fragment));
        let text = text.trim();
        if !text.is_empty() {
            self.parts.push(text.to_string());
        }

        if fragment.to_ascii_lowercase().contains(QUOTATION_CLOSE) {
            debug!(parts = self.parts.len(), "quotation closed");
            self.pending = false;
            self.take_content()
        } else {
            self.pending = true;
            None
        }
    }

    /// Ends the traversal. A quotation still open is flushed as-is.
    pub fn finish(&mut self) -> Option<String> {
        if !self.pending {
            return None;
        }
        warn!(
            parts = self.parts.len(),
            "document ended inside an unclosed quotation; flushing buffered text"
        );
        self.pending = false;
        self.take_content()
    }

    fn take_content(&mut self) -> Option<String> {
        let content = self.parts.join(" ");
        self.parts.clear();
        let content = content.trim();
        if is_visually_empty(content) {
            None
        } else {
            Some(content.to_string())
        }
    }
}
