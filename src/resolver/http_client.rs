//! Shared HTTP client construction and request policy for provider adapters.
//!
//! Every adapter gets its client from [`build_resolver_http_client`] so
//! timeouts, compression and User-Agent stay consistent, and every request
//! goes through [`fetch_body`] so transport failures map to
//! [`ResolveError`] the same way everywhere.

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use tracing::debug;

use crate::user_agent;

use super::{Provider, ResolveError};

const CONNECT_TIMEOUT_SECS: u64 = 5;
const READ_TIMEOUT_SECS: u64 = 10;

/// Connect and read timeouts applied to every outbound lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub connect: Duration,
    pub read: Duration,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            read: Duration::from_secs(READ_TIMEOUT_SECS),
        }
    }
}

/// Builds a client using the shared lookup policy.
///
/// # Errors
///
/// Returns [`ResolveError::ClientBuild`] when the TLS backend or system
/// configuration prevents client construction.
pub fn build_resolver_http_client(
    provider: Provider,
    timeouts: &HttpTimeouts,
) -> Result<Client, ResolveError> {
    Client::builder()
        .connect_timeout(timeouts.connect)
        .timeout(timeouts.read)
        .user_agent(user_agent::default_lookup_user_agent())
        .gzip(true)
        .build()
        .map_err(|error| ResolveError::client_build(provider, error.to_string()))
}

/// Sends `request` and returns the body of a 2xx response.
///
/// # Errors
///
/// Returns [`ResolveError::Timeout`], [`ResolveError::Transport`] or
/// [`ResolveError::HttpStatus`].
pub(crate) async fn fetch_body(
    request: RequestBuilder,
    provider: Provider,
    input: &str,
) -> Result<String, ResolveError> {
    let response = request.send().await.map_err(|error| {
        if error.is_timeout() {
            ResolveError::timeout(provider, input)
        } else {
            ResolveError::transport(provider, input, error.to_string())
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        debug!(%provider, status = status.as_u16(), "lookup returned error status");
        return Err(ResolveError::http_status(provider, input, status.as_u16()));
    }

    response.text().await.map_err(|error| {
        if error.is_timeout() {
            ResolveError::timeout(provider, input)
        } else {
            ResolveError::transport(provider, input, error.to_string())
        }
    })
}

/// Decodes a JSON payload.
///
/// # Errors
///
/// Returns [`ResolveError::Decode`] if `body` is not valid JSON.
pub(crate) fn decode_json(provider: Provider, input: &str, body: &str) -> Result<Value, ResolveError> {
    serde_json::from_str(body).map_err(|error| ResolveError::decode(provider, input, error.to_string()))
}

/// Joins `base_url` and `path` without doubling the slash.
pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
