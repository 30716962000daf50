//! oEmbed lookups for providers keyed by a post URL.
//!
//! Instagram and YouTube both expose `GET {base}/oembed?url=...`; they differ
//! only in base URL and YouTube's extra `format=json` parameter.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::http_client::{HttpTimeouts, build_resolver_http_client, decode_json, endpoint, fetch_body};
use super::{Provider, ResolveError, Resolver};

/// Default Instagram oEmbed base URL.
pub const INSTAGRAM_BASE_URL: &str = "https://api.instagram.com";

/// Default YouTube oEmbed base URL.
pub const YOUTUBE_BASE_URL: &str = "https://www.youtube.com";

/// Resolves a post URL to its oEmbed document.
#[derive(Debug)]
pub struct OEmbedResolver {
    provider: Provider,
    client: Client,
    endpoint_url: String,
    extra_query: &'static [(&'static str, &'static str)],
}

impl OEmbedResolver {
    /// # Errors
    ///
    /// Returns [`ResolveError::ClientBuild`] if the HTTP client cannot be built.
    pub fn instagram(timeouts: &HttpTimeouts) -> Result<Self, ResolveError> {
        Self::instagram_with_base_url(INSTAGRAM_BASE_URL, timeouts)
    }

    /// # Errors
    ///
    /// Returns [`ResolveError::ClientBuild`] if the HTTP client cannot be built.
    pub fn instagram_with_base_url(
        base_url: &str,
        timeouts: &HttpTimeouts,
    ) -> Result<Self, ResolveError> {
        Self::build(Provider::Instagram, base_url, &[], timeouts)
    }

    /// # Errors
    ///
    /// Returns [`ResolveError::ClientBuild`] if the HTTP client cannot be built.
    pub fn youtube(timeouts: &HttpTimeouts) -> Result<Self, ResolveError> {
        Self::youtube_with_base_url(YOUTUBE_BASE_URL, timeouts)
    }

    /// # Errors
    ///
    /// Returns [`ResolveError::ClientBuild`] if the HTTP client cannot be built.
    pub fn youtube_with_base_url(
        base_url: &str,
        timeouts: &HttpTimeouts,
    ) -> Result<Self, ResolveError> {
        Self::build(Provider::YouTube, base_url, &[("format", "json")], timeouts)
    }

    fn build(
        provider: Provider,
        base_url: &str,
        extra_query: &'static [(&'static str, &'static str)],
        timeouts: &HttpTimeouts,
    ) -> Result<Self, ResolveError> {
        Ok(Self {
            provider,
            client: build_resolver_http_client(provider, timeouts)?,
            endpoint_url: endpoint(base_url, "oembed"),
            extra_query,
        })
    }
}

#[async_trait]
impl Resolver for OEmbedResolver {
    fn provider(&self) -> Provider {
        self.provider
    }

    #[tracing::instrument(skip(self), fields(resolver = %self.provider))]
    async fn resolve(&self, external_id: &str) -> Result<Value, ResolveError> {
        debug!(endpoint = %self.endpoint_url, "fetching oembed document");
        let request = self
            .client
            .get(&self.endpoint_url)
            .query(&[("url", external_id)])
            .query(self.extra_query);
        let body = fetch_body(request, self.provider, external_id).await?;
        decode_json(self.provider, external_id, &body)
    }
}
