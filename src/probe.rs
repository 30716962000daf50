//! Image dimension probing.
//!
//! [`HttpImageProbe`] downloads only as much of an image as it needs to read
//! the dimensions out of the container header; [`sniff_dimensions`] does the
//! header parsing and is usable on its own.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::resolver::HttpTimeouts;
use crate::user_agent;

/// Upper bound on bytes read while looking for a header. JPEG frame headers
/// can sit behind large EXIF blocks.
const MAX_PROBE_BYTES: usize = 512 * 1024;

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

/// Width, height and mime type of an image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub mime: String,
}

/// Errors from probing an image.
#[derive(Debug, Clone, Error)]
pub enum ProbeError {
    #[error("cannot fetch image '{url}': {reason}")]
    Transport { url: String, reason: String },

    #[error("image '{url}' returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("image probe for '{url}' timed out")]
    Timeout { url: String },

    #[error("unrecognised image format at '{url}'")]
    UnknownFormat { url: String },

    #[error("no image probe configured")]
    NotConfigured,

    #[error("HTTP client construction failed for image probe: {reason}")]
    ClientBuild { reason: String },
}

/// Looks up the dimensions of an image URL.
#[async_trait]
pub trait ImageProbe: Send + Sync {
    async fn probe(&self, url: &str) -> Result<ImageInfo, ProbeError>;
}

/// [`ImageProbe`] that fetches the image over HTTP.
#[derive(Debug)]
pub struct HttpImageProbe {
    client: Client,
}

impl HttpImageProbe {
    /// # Errors
    ///
    /// Returns [`ProbeError::ClientBuild`] if the HTTP client cannot be built.
    pub fn new(timeouts: &HttpTimeouts) -> Result<Self, ProbeError> {
        let client = Client::builder()
            .connect_timeout(timeouts.connect)
            .timeout(timeouts.read)
            .user_agent(user_agent::default_lookup_user_agent())
            .build()
            .map_err(|error| ProbeError::ClientBuild {
                reason: error.to_string(),
            })?;
        Ok(Self { client })
    }
}

fn transport_error(url: &str, error: &reqwest::Error) -> ProbeError {
    if error.is_timeout() {
        ProbeError::Timeout {
            url: url.to_string(),
        }
    } else {
        ProbeError::Transport {
            url: url.to_string(),
            reason: error.to_string(),
        }
    }
}

#[async_trait]
impl ImageProbe for HttpImageProbe {
    #[tracing::instrument(skip(self))]
    async fn probe(&self, url: &str) -> Result<ImageInfo, ProbeError> {
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|error| transport_error(url, &error))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProbeError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let mut buffer: Vec<u8> = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|error| transport_error(url, &error))?
        {
            buffer.extend_from_slice(&chunk);
            if let Some(info) = sniff_dimensions(&buffer) {
                debug!(width = info.width, height = info.height, "image probed");
                return Ok(info);
            }
            if buffer.len() >= MAX_PROBE_BYTES {
                break;
            }
        }

        Err(ProbeError::UnknownFormat {
            url: url.to_string(),
        })
    }
}

/// Reads dimensions from a PNG, GIF, JPEG or WebP header.
///
/// Returns `None` for other formats and for headers that are still
/// incomplete, so callers can retry with more bytes.
#[must_use]
pub fn sniff_dimensions(bytes: &[u8]) -> Option<ImageInfo> {
    if bytes.starts_with(PNG_SIGNATURE) {
        return sniff_png(bytes);
    }
    if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        return sniff_gif(bytes);
    }
    if bytes.starts_with(&[0xFF, 0xD8]) {
        return sniff_jpeg(bytes);
    }
    if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        return sniff_webp(bytes);
    }
    None
}

fn info(width: u32, height: u32, mime: &str) -> ImageInfo {
    ImageInfo {
        width,
        height,
        mime: mime.to_string(),
    }
}

fn be_u16(bytes: &[u8], at: usize) -> Option<u32> {
    let slice = bytes.get(at..at + 2)?;
    Some(u32::from(u16::from_be_bytes([slice[0], slice[1]])))
}

fn le_u16(bytes: &[u8], at: usize) -> Option<u32> {
    let slice = bytes.get(at..at + 2)?;
    Some(u32::from(u16::from_le_bytes([slice[0], slice[1]])))
}

fn be_u32(bytes: &[u8], at: usize) -> Option<u32> {
    let slice = bytes.get(at..at + 4)?;
    Some(u32::from_be_bytes([slice[0], slice[1], slice[2], slice[3]]))
}

fn le_u24(bytes: &[u8], at: usize) -> Option<u32> {
    let slice = bytes.get(at..at + 3)?;
    Some(u32::from_le_bytes([slice[0], slice[1], slice[2], 0]))
}

fn sniff_png(bytes: &[u8]) -> Option<ImageInfo> {
    if bytes.get(12..16)? != b"IHDR" {
        return None;
    }
    Some(info(be_u32(bytes, 16)?, be_u32(bytes, 20)?, "image/png"))
}

fn sniff_gif(bytes: &[u8]) -> Option<ImageInfo> {
    Some(info(le_u16(bytes, 6)?, le_u16(bytes, 8)?, "image/gif"))
}

/// Walks JPEG segments until a start-of-frame marker.
fn sniff_jpeg(bytes: &[u8]) -> Option<ImageInfo> {
    let mut pos = 2;
    loop {
        if *bytes.get(pos)? != 0xFF {
            return None;
        }
        // Markers may be preceded by fill bytes.
        while *bytes.get(pos + 1)? == 0xFF {
            pos += 1;
        }
        let marker = *bytes.get(pos + 1)?;
        match marker {
            0xC0..=0xCF if !matches!(marker, 0xC4 | 0xC8 | 0xCC) => {
                let height = be_u16(bytes, pos + 5)?;
                let width = be_u16(bytes, pos + 7)?;
                return Some(info(width, height, "image/jpeg"));
            }
            0x01 | 0xD0..=0xD8 => pos += 2,
            _ => {
                let length = usize::try_from(be_u16(bytes, pos + 2)?).ok()?;
                pos += 2 + length;
            }
        }
    }
}

fn sniff_webp(bytes: &[u8]) -> Option<ImageInfo> {
    match bytes.get(12..16)? {
        b"VP8 " => {
            let width = le_u16(bytes, 26)? & 0x3FFF;
            let height = le_u16(bytes, 28)? & 0x3FFF;
            Some(info(width, height, "image/webp"))
        }
        b"VP8L" => {
            let slice = bytes.get(21..25)?;
            let bits = u32::from_le_bytes([slice[0], slice[1], slice[2], slice[3]]);
            let width = (bits & 0x3FFF) + 1;
            let height = ((bits >> 14) & 0x3FFF) + 1;
            Some(info(width, height, "image/webp"))
        }
        b"VP8X" => {
            let width = le_u24(bytes, 24)? + 1;
            let height = le_u24(bytes, 27)? + 1;
            Some(info(width, height, "image/webp"))
        }
        _ => None,
    }
}
