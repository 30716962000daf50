//! Twitter status lookups via the v1.1 `statuses/show` endpoint.

use std::fmt;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::http_client::{HttpTimeouts, build_resolver_http_client, decode_json, endpoint, fetch_body};
use super::{Provider, ResolveError, Resolver};

/// Default Twitter API base URL.
pub const TWITTER_BASE_URL: &str = "https://api.twitter.com";

/// Resolves tweet ids to the status payload.
///
/// Requests carry an application bearer token; without one every lookup
/// fails with [`ResolveError::MissingCredentials`] before touching the
/// network.
pub struct TwitterResolver {
    client: Client,
    base_url: String,
    bearer_token: Option<String>,
}

impl fmt::Debug for TwitterResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwitterResolver")
            .field("base_url", &self.base_url)
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

impl TwitterResolver {
    /// Creates a resolver against the public API.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::ClientBuild`] if the HTTP client cannot be built.
    pub fn new(bearer_token: Option<String>, timeouts: &HttpTimeouts) -> Result<Self, ResolveError> {
        Self::with_base_url(bearer_token, TWITTER_BASE_URL, timeouts)
    }

    /// Creates a resolver against a custom base URL (mock servers, proxies).
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::ClientBuild`] if the HTTP client cannot be built.
    pub fn with_base_url(
        bearer_token: Option<String>,
        base_url: impl Into<String>,
        timeouts: &HttpTimeouts,
    ) -> Result<Self, ResolveError> {
        Ok(Self {
            client: build_resolver_http_client(Provider::Twitter, timeouts)?,
            base_url: base_url.into(),
            bearer_token: bearer_token.filter(|token| !token.trim().is_empty()),
        })
    }
}

#[async_trait]
impl Resolver for TwitterResolver {
    fn provider(&self) -> Provider {
        Provider::Twitter
    }

    #[tracing::instrument(skip(self), fields(resolver = "twitter"))]
    async fn resolve(&self, external_id: &str) -> Result<Value, ResolveError> {
        let Some(token) = self.bearer_token.as_deref() else {
            return Err(ResolveError::missing_credentials(
                Provider::Twitter,
                "no bearer token configured",
            ));
        };

        let url = endpoint(&self.base_url, "1.1/statuses/show.json");
        debug!(url = %url, "fetching tweet");
        let request = self
            .client
            .get(url)
            .query(&[("id", external_id)])
            .bearer_auth(token);
        let body = fetch_body(request, Provider::Twitter, external_id).await?;
        decode_json(Provider::Twitter, external_id, &body)
    }
}
