//! Vimeo lookups via the simple v2 video API.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::http_client::{HttpTimeouts, build_resolver_http_client, decode_json, endpoint, fetch_body};
use super::{Provider, ResolveError, Resolver};

/// Default Vimeo API base URL.
pub const VIMEO_BASE_URL: &str = "https://vimeo.com";

/// Resolves numeric Vimeo ids. The API answers with a one-element array.
#[derive(Debug)]
pub struct VimeoResolver {
    client: Client,
    base_url: String,
}

impl VimeoResolver {
    /// # Errors
    ///
    /// Returns [`ResolveError::ClientBuild`] if the HTTP client cannot be built.
    pub fn new(timeouts: &HttpTimeouts) -> Result<Self, ResolveError> {
        Self::with_base_url(VIMEO_BASE_URL, timeouts)
    }

    /// # Errors
    ///
    /// Returns [`ResolveError::ClientBuild`] if the HTTP client cannot be built.
    pub fn with_base_url(
        base_url: impl Into<String>,
        timeouts: &HttpTimeouts,
    ) -> Result<Self, ResolveError> {
        Ok(Self {
            client: build_resolver_http_client(Provider::Vimeo, timeouts)?,
            base_url: base_url.into(),
        })
    }

    fn video_url(&self, id: &str) -> String {
        endpoint(
            &self.base_url,
            &format!("api/v2/video/{}.json", urlencoding::encode(id)),
        )
    }
}

#[async_trait]
impl Resolver for VimeoResolver {
    fn provider(&self) -> Provider {
        Provider::Vimeo
    }

    #[tracing::instrument(skip(self), fields(resolver = "vimeo"))]
    async fn resolve(&self, external_id: &str) -> Result<Value, ResolveError> {
        let url = self.video_url(external_id);
        debug!(url = %url, "fetching vimeo video");
        let body = fetch_body(self.client.get(url), Provider::Vimeo, external_id).await?;
        decode_json(Provider::Vimeo, external_id, &body)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_video_url() {
        let resolver = VimeoResolver::new(&HttpTimeouts::default()).unwrap();
        assert_eq!(
            resolver.video_url("76979871"),
            "https://vimeo.com/api/v2/video/76979871.json"
        );
    }

    #[test]
    fn test_video_url_encodes_id() {
        let resolver =
            VimeoResolver::with_base_url("http://localhost:1", &HttpTimeouts::default()).unwrap();
        assert_eq!(
            resolver.video_url("a b"),
            "http://localhost:1/api/v2/video/a%20b.json"
        );
    }
}
