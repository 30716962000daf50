//! Runtime settings for the pipeline and its lookup services.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::cache::DEFAULT_CACHE_TTL;
use crate::resolver::{
    DEFAULT_LOOKUP_TIMEOUT, HttpTimeouts, INSTAGRAM_BASE_URL, POSTTV_BASE_URL, TWITTER_BASE_URL,
    VIMEO_BASE_URL, YOUTUBE_BASE_URL,
};

/// Lookups in flight per document unless configured otherwise.
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Accepted range for [`PipelineConfig::concurrency`].
pub const CONCURRENCY_RANGE: std::ops::RangeInclusive<usize> = 1..=64;

/// Environment variable read for the Twitter bearer token.
pub const TWITTER_TOKEN_ENV: &str = "MOBILE_FEED_TWITTER_TOKEN";

/// Base URL per provider. Overridable so tests and proxies can stand in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEndpoints {
    pub twitter: String,
    pub instagram: String,
    pub youtube: String,
    pub vimeo: String,
    pub posttv: String,
}

impl Default for ProviderEndpoints {
    fn default() -> Self {
        Self {
            twitter: TWITTER_BASE_URL.to_string(),
            instagram: INSTAGRAM_BASE_URL.to_string(),
            youtube: YOUTUBE_BASE_URL.to_string(),
            vimeo: VIMEO_BASE_URL.to_string(),
            posttv: POSTTV_BASE_URL.to_string(),
        }
    }
}

impl ProviderEndpoints {
    /// Points every provider at `base_url`.
    #[must_use]
    pub fn all(base_url: &str) -> Self {
        Self {
            twitter: base_url.to_string(),
            instagram: base_url.to_string(),
            youtube: base_url.to_string(),
            vimeo: base_url.to_string(),
            posttv: base_url.to_string(),
        }
    }
}

/// Settings for one pipeline instance.
#[derive(Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Lookups in flight per document.
    pub concurrency: usize,
    pub timeouts: HttpTimeouts,
    /// Upper bound on one lookup, including connect and read.
    pub lookup_timeout: Duration,
    pub cache_ttl: Duration,
    pub endpoints: ProviderEndpoints,
    pub twitter_bearer_token: Option<String>,
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("concurrency", &self.concurrency)
            .field("timeouts", &self.timeouts)
            .field("lookup_timeout", &self.lookup_timeout)
            .field("cache_ttl", &self.cache_ttl)
            .field("endpoints", &self.endpoints)
            .field(
                "twitter_bearer_token",
                &self.twitter_bearer_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            timeouts: HttpTimeouts::default(),
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
            cache_ttl: DEFAULT_CACHE_TTL,
            endpoints: ProviderEndpoints::default(),
            twitter_bearer_token: None,
        }
    }
}

/// Invalid configuration values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("concurrency must be within {min}..={max}, got {value}")]
    Concurrency { value: usize, min: usize, max: usize },

    #[error("`{field}` must be greater than zero")]
    ZeroDuration { field: &'static str },

    #[error("endpoint for {provider} is not an absolute http(s) URL: '{value}'")]
    Endpoint { provider: &'static str, value: String },
}

impl PipelineConfig {
    /// Checks ranges and endpoint URLs.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !CONCURRENCY_RANGE.contains(&self.concurrency) {
            return Err(ConfigError::Concurrency {
                value: self.concurrency,
                min: *CONCURRENCY_RANGE.start(),
                max: *CONCURRENCY_RANGE.end(),
            });
        }
        for (field, duration) in [
            ("connect_timeout", self.timeouts.connect),
            ("read_timeout", self.timeouts.read),
            ("lookup_timeout", self.lookup_timeout),
        ] {
            if duration.is_zero() {
                return Err(ConfigError::ZeroDuration { field });
            }
        }
        let endpoints = &self.endpoints;
        for (provider, value) in [
            ("twitter", &endpoints.twitter),
            ("instagram", &endpoints.instagram),
            ("youtube", &endpoints.youtube),
            ("vimeo", &endpoints.vimeo),
            ("posttv", &endpoints.posttv),
        ] {
            let valid = url::Url::parse(value)
                .is_ok_and(|parsed| matches!(parsed.scheme(), "http" | "https"));
            if !valid {
                return Err(ConfigError::Endpoint {
                    provider,
                    value: value.clone(),
                });
            }
        }
        Ok(())
    }
}
