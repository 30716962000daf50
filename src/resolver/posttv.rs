//! PostTV lookups. The video JSON endpoint only answers in JSONP.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::http_client::{HttpTimeouts, build_resolver_http_client, decode_json, endpoint, fetch_body};
use super::{Provider, ResolveError, Resolver};

/// Default PostTV base URL.
pub const POSTTV_BASE_URL: &str = "https://www.washingtonpost.com";

/// Resolves PostTV video UUIDs to the decoded video JSON.
#[derive(Debug)]
pub struct PostTvResolver {
    client: Client,
    base_url: String,
}

impl PostTvResolver {
    /// # Errors
    ///
    /// Returns [`ResolveError::ClientBuild`] if the HTTP client cannot be built.
    pub fn new(timeouts: &HttpTimeouts) -> Result<Self, ResolveError> {
        Self::with_base_url(POSTTV_BASE_URL, timeouts)
    }

    /// # Errors
    ///
    /// Returns [`ResolveError::ClientBuild`] if the HTTP client cannot be built.
    pub fn with_base_url(
        base_url: impl Into<String>,
        timeouts: &HttpTimeouts,
    ) -> Result<Self, ResolveError> {
        Ok(Self {
            client: build_resolver_http_client(Provider::PostTv, timeouts)?,
            base_url: base_url.into(),
        })
    }
}

/// Strips a JSONP callback wrapper, leaving the JSON payload.
///
/// Plain JSON (starting with `[` or `{`) passes through. Otherwise everything
/// before the first `(` is dropped and `(`, `)`, `;` are trimmed from both
/// ends.
#[must_use]
pub fn unwrap_jsonp(body: &str) -> &str {
    let body = body.trim();
    let payload = if body.starts_with('[') || body.starts_with('{') {
        body
    } else {
        body.find('(').map_or(body, |open| &body[open..])
    };
    payload.trim_matches(|c: char| matches!(c, '(' | ')' | ';') || c.is_whitespace())
}

#[async_trait]
impl Resolver for PostTvResolver {
    fn provider(&self) -> Provider {
        Provider::PostTv
    }

    #[tracing::instrument(skip(self), fields(resolver = "posttv"))]
    async fn resolve(&self, external_id: &str) -> Result<Value, ResolveError> {
        let url = endpoint(
            &self.base_url,
            &format!("posttv/c/videojson/{}", urlencoding::encode(external_id)),
        );
        debug!(url = %url, "fetching posttv video");
        let request = self.client.get(url).query(&[("resType", "jsonp")]);
        let body = fetch_body(request, Provider::PostTv, external_id).await?;
        decode_json(Provider::PostTv, external_id, unwrap_jsonp(&body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unwrap_jsonp_callback() {
        assert_eq!(unwrap_jsonp(r#"cb([{"a":1}]);"#), r#"[{"a":1}]"#);
    }

    #[test]
    fn test_unwrap_jsonp_plain_json_passes_through() {
        assert_eq!(unwrap_jsonp(r#"[{"a":1}]"#), r#"[{"a":1}]"#);
        assert_eq!(unwrap_jsonp(r#"{"a":1}"#), r#"{"a":1}"#);
    }

    #[test]
    fn test_unwrap_jsonp_tolerates_whitespace() {
        assert_eq!(unwrap_jsonp("  jsonp123( {\"a\":1} ) ;\n"), "{\"a\":1}");
    }

    #[test]
    fn test_unwrap_jsonp_without_paren_keeps_text() {
        assert_eq!(unwrap_jsonp("garbage"), "garbage");
    }

    #[test]
    fn test_unwrap_jsonp_keeps_inner_parens() {
        assert_eq!(
            unwrap_jsonp(r#"cb([{"blurb":"a (b)"}])"#),
            r#"[{"blurb":"a (b)"}]"#
        );
    }
}
