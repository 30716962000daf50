//! Line-break splitting of a normalized article body.

use std::sync::LazyLock;

use regex::Regex;

use crate::markup::compile_static_regex;

static LINE_BREAK_RE: LazyLock<Regex> = LazyLock::new(|| compile_static_regex(r"\r\n|\r|\n"));

/// One line-break-delimited slice of an article body: the unit of classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    /// Position of the fragment in the body, starting at zero.
    pub index: usize,
    /// Raw, untrimmed text.
    pub text: String,
}

impl Fragment {
    #[must_use]
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }
}

/// Splits `text` on CRLF, CR or LF.
///
/// Every slice is kept, including empty and whitespace-only ones, so the
/// number of fragments is always the number of line breaks plus one.
#[must_use]
pub fn split(text: &str) -> Vec<Fragment> {
    LINE_BREAK_RE
        .split(text)
        .enumerate()
        .map(|(index, slice)| Fragment::new(index, slice))
        .collect()
}
