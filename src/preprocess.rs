//! Body normalization applied before splitting.
//!
//! Strips markup that never reaches the apps, decodes ampersands so URL
//! matching sees real query strings, and repairs Twitter embeds whose
//! `<blockquote>` was broken across a blank line by the CMS encoder.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::trace;

use crate::markup::compile_static_regex;

/// Opening marker of a Twitter quotation embed.
const TWEET_EMBED_MARKER: &str = "<blockquote class=\"twitter-tweet\"";

/// Literal tokens left behind by retired CMS features.
const DEAD_TOKENS: &[&str] = &["[wapoad type=\"inline\"]", "[script]", "[/script]"];

static STYLE_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"(?si)<style[^>]*?>.*?</style>"));
static SCRIPT_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"(?si)<script[^>]*?>.*?</script>"));
static PLACEHOLDER_IMG_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r"(?i)<img[^>]*wp-includes/js/tinymce/plugins/wordpress/img/trans\.gif[^>]*>")
});
/// Any run of `&amp;` nesting decodes to one `&` in a single scan.
static AMP_RUN_RE: LazyLock<Regex> = LazyLock::new(|| compile_static_regex(r"&(?:amp;)+"));
static SPLIT_TWEET_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(
        r#"(?i)(<blockquote class="twitter-tweet"[^>]*>)([^\r\n]*?)(?:\r\n|\r|\n){2,3}([^\r\n]*?</blockquote>)"#,
    )
});

/// Normalizes a raw article body. Never fails and is idempotent.
///
/// Each rewrite pass either leaves the text unchanged or makes it strictly
/// shorter, so passes repeat until a fixed point is reached.
#[must_use]
pub fn normalize(body: &str) -> String {
    let mut current = body.to_string();
    let mut passes = 0_usize;
    loop {
        let next = normalize_pass(&current);
        passes += 1;
        if next == current {
            trace!(passes, "body normalized");
            return current;
        }
        current = next;
    }
}

fn normalize_pass(body: &str) -> String {
    let mut text = STYLE_BLOCK_RE.replace_all(body, "").into_owned();
    text = SCRIPT_BLOCK_RE.replace_all(&text, "").into_owned();
    text = PLACEHOLDER_IMG_RE.replace_all(&text, "").into_owned();
    for token in DEAD_TOKENS {
        if text.contains(token) {
            text = text.replace(token, "");
        }
    }
    if text.contains("&amp;") {
        text = AMP_RUN_RE.replace_all(&text, "&").into_owned();
    }
    if text.contains(TWEET_EMBED_MARKER) {
        text = merge_split_tweets(&text);
    }
    text
}

fn merge_split_tweets(text: &str) -> String {
    SPLIT_TWEET_RE
        .replace_all(text, |caps: &Captures<'_>| {
            // The opener's own line already closed: the next blockquote is unrelated.
            if caps[2].to_ascii_lowercase().contains("</blockquote>") {
                caps[0].to_string()
            } else {
                format!("{}{} {}", &caps[1], &caps[2], &caps[3])
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_style_and_script_blocks() {
        let body = "<p>a</p><style type=\"text/css\">p{}\n</style><script>\nalert(1)</script><p>b</p>";
        assert_eq!(normalize(body), "<p>a</p><p>b</p>");
    }

    #[test]
    fn test_normalize_removes_dead_tokens_and_placeholder() {
        let body = concat!(
            "x[wapoad type=\"inline\"]y[script]z[/script]",
            "<img title=\"More...\" alt=\"\" src=\"http://www.washingtonpost.com/blogs/post-politics/wp-includes/js/tinymce/plugins/wordpress/img/trans.gif\" />"
        );
        assert_eq!(normalize(body), "xyz");
    }

    #[test]
    fn test_normalize_decodes_ampersands_fully() {
        assert_eq!(normalize("a=1&amp;b=2"), "a=1&b=2");
        assert_eq!(normalize("&amp;amp;"), "&");
    }

    #[test]
    fn test_nested_ampersand_run_collapses_in_one_pass() {
        let body = format!("a&{}b", "amp;".repeat(16 * 1024));
        assert_eq!(normalize_pass(&body), "a&b");

        let started = std::time::Instant::now();
        assert_eq!(normalize(&body), "a&b");
        assert!(
            started.elapsed() < std::time::Duration::from_secs(1),
            "took {:?}",
            started.elapsed()
        );
    }

    #[test]
    fn test_separate_ampersand_runs_decode_independently() {
        assert_eq!(normalize("x&amp;amp;y &amp; z&lt;"), "x&y & z&lt;");
    }

    #[test]
    fn test_normalize_merges_tweet_split_by_blank_line() {
        let body = "<blockquote class=\"twitter-tweet\"><p>Hello</p>\n\n<a href=\"https://twitter.com/a/status/1\">x</a></blockquote>";
        assert_eq!(
            normalize(body),
            "<blockquote class=\"twitter-tweet\"><p>Hello</p> <a href=\"https://twitter.com/a/status/1\">x</a></blockquote>"
        );
    }

    #[test]
    fn test_normalize_merges_tweet_split_by_two_blank_lines_crlf() {
        let body = "<blockquote class=\"twitter-tweet\">A\r\n\r\n\r\nB</blockquote>";
        assert_eq!(
            normalize(body),
            "<blockquote class=\"twitter-tweet\">A B</blockquote>"
        );
    }

    #[test]
    fn test_normalize_does_not_merge_closed_tweet_into_next_quote() {
        let body = "<blockquote class=\"twitter-tweet\">A</blockquote>\n\nB</blockquote>";
        assert_eq!(normalize(body), body);
    }

    #[test]
    fn test_normalize_leaves_plain_blockquote_alone() {
        let body = "<blockquote>A\n\nB</blockquote>";
        assert_eq!(normalize(body), body);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let bodies = [
            "plain text",
            "&amp;amp;amp; <style>x</style>",
            "<blockquote class=\"twitter-tweet\">A\n\nB</blockquote>\n\nnext",
            "<scr<script></script>ipt>x</script>",
        ];
        for body in bodies {
            let once = normalize(body);
            assert_eq!(normalize(&once), once, "not idempotent for {body:?}");
        }
    }
}
