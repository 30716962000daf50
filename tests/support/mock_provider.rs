//! Local stand-in for the third-party media providers.
//!
//! Sandboxed runners sometimes forbid loopback sockets. There the adapter
//! tests skip, unless `MOBILE_FEED_REQUIRE_MOCK_PROVIDER` asks for a hard
//! failure (CI sets it so a broken runner cannot pass silently).

use std::net::{Ipv4Addr, TcpListener};

use wiremock::MockServer;

pub const REQUIRE_MOCK_PROVIDER_ENV: &str = "MOBILE_FEED_REQUIRE_MOCK_PROVIDER";

/// What to do when no mock provider can be started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unavailable {
    Skip,
    Fail,
}

impl Unavailable {
    #[must_use]
    pub fn from_env() -> Self {
        match std::env::var(REQUIRE_MOCK_PROVIDER_ENV) {
            Ok(value) if matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes") => {
                Self::Fail
            }
            _ => Self::Skip,
        }
    }
}

fn loopback_available() -> bool {
    TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).is_ok()
}

/// Starts a mock provider, or returns `None` when the test should skip.
///
/// # Panics
///
/// When loopback is unavailable and [`Unavailable::Fail`] is in effect.
pub async fn mock_provider(test: &str) -> Option<MockServer> {
    if loopback_available() {
        return Some(MockServer::start().await);
    }
    match Unavailable::from_env() {
        Unavailable::Fail => panic!(
            "{test}: cannot bind a loopback socket for the mock provider ({REQUIRE_MOCK_PROVIDER_ENV} is set)"
        ),
        Unavailable::Skip => {
            eprintln!("{test}: skipped, no loopback socket for the mock provider");
            None
        }
    }
}
