//! Mobile Feed Library
//!
//! Turns CMS article bodies (HTML with embedded images, social posts, video
//! players, promo graphics and quotations) into an ordered list of typed
//! content items the mobile apps render natively, wrapped in a fixed envelope
//! of article metadata.
//!
//! # Architecture
//!
//! Components, leaf first:
//! - [`cache`] - shared key/value store with per-entry TTL
//! - [`resolver`] - provider adapters and the cache-then-fetch [`MediaResolver`]
//! - [`probe`] - image dimension probing
//! - [`extract`] - per-kind field extraction
//! - [`classify`] - ordered rule table and the quotation continuation tracker
//! - [`preprocess`] and [`fragment`] - body normalisation and splitting
//! - [`pipeline`] - orchestration and envelope assembly
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use mobile_feed::{MemoryCache, Pipeline, PipelineConfig, build_default_media_resolver};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PipelineConfig::default();
//! let media = build_default_media_resolver(&config, Arc::new(MemoryCache::new()));
//! let pipeline = Pipeline::new(Arc::new(media)).with_concurrency(config.concurrency);
//! let json = pipeline
//!     .render_json(r#"{"id": 1, "title": "Hello", "body": "<p>Hi</p>"}"#)
//!     .await?;
//! println!("{json}");
//! # Ok(())
//! # }
//! ```

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod article;
pub mod cache;
pub mod classify;
pub mod config;
pub mod extract;
pub mod fragment;
pub mod item;
pub mod markup;
pub mod pipeline;
pub mod preprocess;
pub mod probe;
pub mod resolver;
mod user_agent;

// Re-export commonly used types
pub use article::{Article, ArticleMetadata, Author, Envelope};
pub use cache::{CacheStore, DEFAULT_CACHE_TTL, MemoryCache};
pub use classify::{ContinuationTracker, Kind, RULES, VideoHost, classify};
pub use config::{ConfigError, DEFAULT_CONCURRENCY, PipelineConfig, ProviderEndpoints};
pub use fragment::{Fragment, split};
pub use item::ContentItem;
pub use pipeline::{Pipeline, PipelineError};
pub use preprocess::normalize;
pub use probe::{HttpImageProbe, ImageInfo, ImageProbe, ProbeError};
pub use resolver::{
    HttpTimeouts, MediaResolver, Provider, ResolveError, Resolver, build_default_media_resolver,
};
