//! Shared User-Agent string for provider lookups and image probes.
//!
//! Single source for the UA format so every outbound request identifies the
//! tool the same way.

/// Project URL for User-Agent identification.
const PROJECT_UA_URL: &str = "https://github.com/fierce/mobile-feed";

/// Default User-Agent for lookup and probe requests.
#[must_use]
pub(crate) fn default_lookup_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("mobile-feed/{version} (media-lookup; +{PROJECT_UA_URL})")
}
