//! External media lookups behind a shared, cached facade.
//!
//! # Architecture
//!
//! - [`Resolver`] - async trait one adapter per [`Provider`] implements
//! - [`MediaResolver`] - cache-then-fetch facade the extractors call
//! - [`TwitterResolver`], [`OEmbedResolver`], [`VimeoResolver`],
//!   [`PostTvResolver`] - `reqwest` adapters
//!
//! Adapters return the provider payload as opaque JSON; picking fields out
//! of it is the extractors' job.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use mobile_feed::cache::MemoryCache;
//! use mobile_feed::config::PipelineConfig;
//! use mobile_feed::resolver::{build_default_media_resolver, Provider};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let media = build_default_media_resolver(&PipelineConfig::default(), Arc::new(MemoryCache::new()));
//! let video = media.resolve(Provider::Vimeo, "76979871").await?;
//! println!("{}", video[0]["title"]);
//! # Ok(())
//! # }
//! ```

mod error;
mod http_client;
mod media;
mod oembed;
mod posttv;
mod twitter;
mod vimeo;

pub use error::ResolveError;
pub use http_client::{HttpTimeouts, build_resolver_http_client};
pub use media::{DEFAULT_LOOKUP_TIMEOUT, MediaResolver, cache_key};
pub use oembed::{INSTAGRAM_BASE_URL, OEmbedResolver, YOUTUBE_BASE_URL};
pub use posttv::{POSTTV_BASE_URL, PostTvResolver, unwrap_jsonp};
pub use twitter::{TWITTER_BASE_URL, TwitterResolver};
pub use vimeo::{VIMEO_BASE_URL, VimeoResolver};

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use crate::cache::CacheStore;
use crate::classify::VideoHost;
use crate::config::PipelineConfig;
use crate::probe::HttpImageProbe;

/// External provider a lookup is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    Twitter,
    Instagram,
    YouTube,
    Vimeo,
    PostTv,
}

impl Provider {
    /// Stable label used in cache keys and log fields.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Twitter => "twitter",
            Self::Instagram => "instagram",
            Self::YouTube => "youtube",
            Self::Vimeo => "vimeo",
            Self::PostTv => "posttv",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<VideoHost> for Provider {
    fn from(host: VideoHost) -> Self {
        match host {
            VideoHost::YouTube => Self::YouTube,
            VideoHost::Vimeo => Self::Vimeo,
            VideoHost::PostTv => Self::PostTv,
        }
    }
}

/// One provider adapter.
///
/// `external_id` is whatever the provider is keyed by: a tweet id, a post
/// URL, a video id.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Provider served by this adapter.
    fn provider(&self) -> Provider;

    /// Fetches the provider payload for `external_id`.
    async fn resolve(&self, external_id: &str) -> Result<Value, ResolveError>;
}

/// Builds the facade with every network adapter and the HTTP image probe.
///
/// An adapter whose client cannot be built is skipped with a warning; its
/// lookups then fail with [`ResolveError::NotConfigured`].
#[must_use]
pub fn build_default_media_resolver(
    config: &PipelineConfig,
    cache: Arc<dyn CacheStore>,
) -> MediaResolver {
    let mut media = MediaResolver::new(cache)
        .with_ttl(config.cache_ttl)
        .with_lookup_timeout(config.lookup_timeout);
    let endpoints = &config.endpoints;
    let timeouts = &config.timeouts;

    register_or_warn(
        &mut media,
        TwitterResolver::with_base_url(
            config.twitter_bearer_token.clone(),
            &endpoints.twitter,
            timeouts,
        ),
    );
    register_or_warn(
        &mut media,
        OEmbedResolver::instagram_with_base_url(&endpoints.instagram, timeouts),
    );
    register_or_warn(
        &mut media,
        OEmbedResolver::youtube_with_base_url(&endpoints.youtube, timeouts),
    );
    register_or_warn(
        &mut media,
        VimeoResolver::with_base_url(&endpoints.vimeo, timeouts),
    );
    register_or_warn(
        &mut media,
        PostTvResolver::with_base_url(&endpoints.posttv, timeouts),
    );

    match HttpImageProbe::new(timeouts) {
        Ok(probe) => media.set_image_probe(Box::new(probe)),
        Err(error) => warn!(
            error = %error,
            "image probe unavailable; image sizes will be null"
        ),
    }

    media
}

fn register_or_warn<R>(media: &mut MediaResolver, adapter: Result<R, ResolveError>)
where
    R: Resolver + 'static,
{
    match adapter {
        Ok(resolver) => media.register(Box::new(resolver)),
        Err(error) => warn!(
            error = %error,
            "resolver unavailable; continuing with remaining resolvers"
        ),
    }
}
