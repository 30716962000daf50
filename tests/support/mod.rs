//! Shared fixtures for the adapter tests.

pub mod mock_provider;

use std::time::Duration;

use mobile_feed::HttpTimeouts;

/// Timeouts short enough that a hung mock fails the test quickly.
#[must_use]
pub fn provider_timeouts() -> HttpTimeouts {
    HttpTimeouts {
        connect: Duration::from_secs(2),
        read: Duration::from_secs(5),
    }
}

/// Signature plus IHDR chunk: everything the probe reads from a PNG.
#[must_use]
pub fn png_header(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.extend_from_slice(&13_u32.to_be_bytes());
    bytes.extend_from_slice(b"IHDR");
    bytes.extend_from_slice(&width.to_be_bytes());
    bytes.extend_from_slice(&height.to_be_bytes());
    bytes.extend_from_slice(&[8, 6, 0, 0, 0]);
    bytes
}
