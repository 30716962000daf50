//! Error types for media lookups.
//!
//! Every variant names the provider and the external reference so an error
//! surfaced on a content item is actionable on its own.

use thiserror::Error;

use super::Provider;

/// Errors that can occur while resolving external media metadata.
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    /// Network-level failure (DNS, connection refused, TLS, truncated body).
    #[error("cannot reach {provider} for '{input}': {reason}")]
    Transport {
        provider: Provider,
        input: String,
        reason: String,
    },

    /// The lookup did not complete within its time budget.
    #[error("{provider} lookup for '{input}' timed out")]
    Timeout { provider: Provider, input: String },

    /// The provider answered with a non-success status.
    #[error("{provider} returned HTTP {status} for '{input}'")]
    HttpStatus {
        provider: Provider,
        input: String,
        status: u16,
    },

    /// The provider answered, but the payload could not be decoded.
    #[error("malformed {provider} payload for '{input}': {reason}")]
    Decode {
        provider: Provider,
        input: String,
        reason: String,
    },

    /// The provider needs credentials that were not configured.
    #[error("{provider} lookups need credentials: {reason}")]
    MissingCredentials { provider: Provider, reason: String },

    /// No adapter is registered for the provider.
    #[error("no resolver registered for {provider}")]
    NotConfigured { provider: Provider },

    /// The HTTP client for an adapter could not be built.
    #[error("HTTP client construction failed for {provider}: {reason}")]
    ClientBuild { provider: Provider, reason: String },
}

impl ResolveError {
    #[must_use]
    pub fn transport(provider: Provider, input: &str, reason: impl Into<String>) -> Self {
        Self::Transport {
            provider,
            input: input.to_string(),
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn timeout(provider: Provider, input: &str) -> Self {
        Self::Timeout {
            provider,
            input: input.to_string(),
        }
    }

    #[must_use]
    pub fn http_status(provider: Provider, input: &str, status: u16) -> Self {
        Self::HttpStatus {
            provider,
            input: input.to_string(),
            status,
        }
    }

    #[must_use]
    pub fn decode(provider: Provider, input: &str, reason: impl Into<String>) -> Self {
        Self::Decode {
            provider,
            input: input.to_string(),
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn missing_credentials(provider: Provider, reason: impl Into<String>) -> Self {
        Self::MissingCredentials {
            provider,
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn not_configured(provider: Provider) -> Self {
        Self::NotConfigured { provider }
    }

    #[must_use]
    pub fn client_build(provider: Provider, reason: impl Into<String>) -> Self {
        Self::ClientBuild {
            provider,
            reason: reason.into(),
        }
    }

    /// Returns true for failures worth retrying on a later request.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport { .. } | Self::Timeout { .. } => true,
            Self::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            Self::Decode { .. }
            | Self::MissingCredentials { .. }
            | Self::NotConfigured { .. }
            | Self::ClientBuild { .. } => false,
        }
    }
}
