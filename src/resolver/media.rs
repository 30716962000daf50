//! Cache-then-fetch facade over the provider adapters and the image probe.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::{CacheStore, DEFAULT_CACHE_TTL};
use crate::probe::{ImageInfo, ImageProbe, ProbeError};

use super::{Provider, ResolveError, Resolver};

/// Default upper bound on a single lookup, network time included.
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(15);

const IMAGE_KEY_PREFIX: &str = "image";

/// Shared lookup service handed to the extractors.
///
/// Hits are served from the cache unchanged. Misses go to the adapter under
/// the lookup timeout; only successes are written back, so a failed lookup
/// is retried on the next request.
pub struct MediaResolver {
    resolvers: HashMap<Provider, Box<dyn Resolver>>,
    probe: Option<Box<dyn ImageProbe>>,
    cache: Arc<dyn CacheStore>,
    ttl: Duration,
    lookup_timeout: Duration,
}

impl fmt::Debug for MediaResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut providers: Vec<&str> = self.resolvers.keys().map(|p| p.as_str()).collect();
        providers.sort_unstable();
        f.debug_struct("MediaResolver")
            .field("providers", &providers)
            .field("probe", &self.probe.is_some())
            .field("ttl", &self.ttl)
            .field("lookup_timeout", &self.lookup_timeout)
            .finish_non_exhaustive()
    }
}

/// Cache key for `external_id` at `provider`.
#[must_use]
pub fn cache_key(provider: &str, external_id: &str) -> String {
    format!("{provider}:{external_id}")
}

impl MediaResolver {
    /// Creates a facade with no adapters registered.
    #[must_use]
    pub fn new(cache: Arc<dyn CacheStore>) -> Self {
        Self {
            resolvers: HashMap::new(),
            probe: None,
            cache,
            ttl: DEFAULT_CACHE_TTL,
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_lookup_timeout(mut self, lookup_timeout: Duration) -> Self {
        self.lookup_timeout = lookup_timeout;
        self
    }

    /// Registers `resolver` for its provider, replacing any earlier one.
    pub fn register(&mut self, resolver: Box<dyn Resolver>) {
        let provider = resolver.provider();
        if self.resolvers.insert(provider, resolver).is_some() {
            debug!(%provider, "replaced registered resolver");
        }
    }

    pub fn set_image_probe(&mut self, probe: Box<dyn ImageProbe>) {
        self.probe = Some(probe);
    }

    #[must_use]
    pub fn has_resolver(&self, provider: Provider) -> bool {
        self.resolvers.contains_key(&provider)
    }

    #[must_use]
    pub fn has_image_probe(&self) -> bool {
        self.probe.is_some()
    }

    /// Returns the provider payload for `external_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::NotConfigured`] if no adapter serves
    /// `provider`, [`ResolveError::Timeout`] if the adapter exceeds the lookup
    /// timeout, or whatever the adapter reports.
    #[tracing::instrument(skip(self), fields(provider = %provider))]
    pub async fn resolve(
        &self,
        provider: Provider,
        external_id: &str,
    ) -> Result<Value, ResolveError> {
        let key = cache_key(provider.as_str(), external_id);
        if let Some(hit) = self.cache.get(&key) {
            debug!(key = %key, "cache hit");
            return Ok(hit);
        }

        let resolver = self
            .resolvers
            .get(&provider)
            .ok_or_else(|| ResolveError::not_configured(provider))?;

        let outcome = tokio::time::timeout(self.lookup_timeout, resolver.resolve(external_id))
            .await
            .unwrap_or_else(|_| Err(ResolveError::timeout(provider, external_id)));

        match outcome {
            Ok(value) => {
                self.cache.set(&key, value.clone(), self.ttl);
                Ok(value)
            }
            Err(error) => {
                warn!(error = %error, transient = error.is_transient(), "lookup failed");
                Err(error)
            }
        }
    }

    /// Returns the dimensions of the image at `url`.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::NotConfigured`] without a probe,
    /// [`ProbeError::Timeout`] past the lookup timeout, or the probe failure.
    #[tracing::instrument(skip(self))]
    pub async fn probe_image(&self, url: &str) -> Result<ImageInfo, ProbeError> {
        let key = cache_key(IMAGE_KEY_PREFIX, url);
        if let Some(hit) = self.cache.get(&key) {
            match serde_json::from_value::<ImageInfo>(hit) {
                Ok(info) => {
                    debug!(key = %key, "cache hit");
                    return Ok(info);
                }
                Err(error) => debug!(error = %error, "ignoring undecodable cache entry"),
            }
        }

        let probe = self.probe.as_ref().ok_or(ProbeError::NotConfigured)?;
        let outcome = tokio::time::timeout(self.lookup_timeout, probe.probe(url))
            .await
            .unwrap_or_else(|_| {
                Err(ProbeError::Timeout {
                    url: url.to_string(),
                })
            });

        match outcome {
            Ok(info) => {
                // Dimensions of a URL do not change: a concurrent probe that stored first wins.
                if let Ok(value) = serde_json::to_value(&info) {
                    if !self.cache.add(&key, value, self.ttl) {
                        debug!(key = %key, "image already cached by a concurrent probe");
                    }
                }
                Ok(info)
            }
            Err(error) => {
                warn!(error = %error, "image probe failed");
                Err(error)
            }
        }
    }
}
