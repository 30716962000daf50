//! Configuration file loading and merging for the CLI.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use mobile_feed::PipelineConfig;
use mobile_feed::config::CONCURRENCY_RANGE;

/// `key = value` file configuration. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    /// Lookups in flight per article (same range as the CLI).
    pub concurrency: Option<u8>,
    pub connect_timeout_secs: Option<u64>,
    pub read_timeout_secs: Option<u64>,
    /// Upper bound on a single provider lookup.
    pub lookup_timeout_secs: Option<u64>,
    /// How long resolved media stays cached.
    pub cache_ttl_secs: Option<u64>,
    pub twitter_bearer_token: Option<String>,
    pub twitter_base_url: Option<String>,
    pub instagram_base_url: Option<String>,
    pub youtube_base_url: Option<String>,
    pub vimeo_base_url: Option<String>,
    pub posttv_base_url: Option<String>,
}

impl FileConfig {
    /// Validates value ranges.
    pub fn validate(&self) -> Result<()> {
        if let Some(concurrency) = self.concurrency
            && !CONCURRENCY_RANGE.contains(&usize::from(concurrency))
        {
            bail!(
                "Invalid config value for `concurrency`: {concurrency}. Expected range: {}..={}",
                CONCURRENCY_RANGE.start(),
                CONCURRENCY_RANGE.end()
            );
        }
        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        validate_timeout_secs("read_timeout_secs", self.read_timeout_secs)?;
        validate_timeout_secs("lookup_timeout_secs", self.lookup_timeout_secs)?;
        if let Some(ttl) = self.cache_ttl_secs
            && ttl > 7 * 24 * 3600
        {
            bail!("Invalid config value for `cache_ttl_secs`: {ttl}. Expected range: 0..=604800");
        }
        Ok(())
    }
}

fn validate_timeout_secs(field: &str, value: Option<u64>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=3600).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 1..=3600");
    }
    Ok(())
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/mobile-feed/config.toml`
/// 2. `$HOME/.config/mobile-feed/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("mobile-feed")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("mobile-feed")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads the file configuration.
///
/// An explicit path must exist. The default path is optional; when it is
/// missing the defaults apply.
pub fn load_file_config(explicit: Option<&Path>) -> Result<FileConfig> {
    if let Some(path) = explicit {
        return read_file_config(path);
    }
    match resolve_default_config_path() {
        Some(path) if path.exists() => read_file_config(&path),
        _ => Ok(FileConfig::default()),
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

/// Builds the pipeline settings.
///
/// Precedence, highest first: CLI flag, environment, file, built-in default.
pub fn build_pipeline_config(
    file: &FileConfig,
    cli_concurrency: Option<u8>,
    env_token: Option<String>,
) -> Result<PipelineConfig> {
    let mut config = PipelineConfig::default();

    if let Some(concurrency) = cli_concurrency.or(file.concurrency) {
        config.concurrency = usize::from(concurrency);
    }
    if let Some(secs) = file.connect_timeout_secs {
        config.timeouts.connect = Duration::from_secs(secs);
    }
    if let Some(secs) = file.read_timeout_secs {
        config.timeouts.read = Duration::from_secs(secs);
    }
    if let Some(secs) = file.lookup_timeout_secs {
        config.lookup_timeout = Duration::from_secs(secs);
    }
    if let Some(secs) = file.cache_ttl_secs {
        config.cache_ttl = Duration::from_secs(secs);
    }

    let endpoints = &mut config.endpoints;
    for (target, value) in [
        (&mut endpoints.twitter, &file.twitter_base_url),
        (&mut endpoints.instagram, &file.instagram_base_url),
        (&mut endpoints.youtube, &file.youtube_base_url),
        (&mut endpoints.vimeo, &file.vimeo_base_url),
        (&mut endpoints.posttv, &file.posttv_base_url),
    ] {
        if let Some(value) = value {
            target.clone_from(value);
        }
    }

    config.twitter_bearer_token = env_token
        .filter(|token| !token.trim().is_empty())
        .or_else(|| file.twitter_bearer_token.clone());

    config.validate()?;
    Ok(config)
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!(
                "Invalid config syntax on line {}: expected key = value",
                line_index + 1
            );
        };

        let key = raw_key.trim();
        let value = raw_value.trim();
        let line_no = line_index + 1;

        match key {
            "concurrency" => {
                let parsed = parse_integer_u8(value)
                    .with_context(|| format!("Invalid `concurrency` value on line {line_no}"))?;
                cfg.concurrency = Some(parsed);
            }
            "connect_timeout_secs" | "read_timeout_secs" | "lookup_timeout_secs"
            | "cache_ttl_secs" => {
                let parsed = parse_integer_u64(value)
                    .with_context(|| format!("Invalid `{key}` value on line {line_no}"))?;
                let slot = match key {
                    "connect_timeout_secs" => &mut cfg.connect_timeout_secs,
                    "read_timeout_secs" => &mut cfg.read_timeout_secs,
                    "lookup_timeout_secs" => &mut cfg.lookup_timeout_secs,
                    _ => &mut cfg.cache_ttl_secs,
                };
                *slot = Some(parsed);
            }
            "twitter_bearer_token" | "twitter_base_url" | "instagram_base_url"
            | "youtube_base_url" | "vimeo_base_url" | "posttv_base_url" => {
                let parsed = parse_string_literal(value)
                    .with_context(|| format!("Invalid `{key}` value on line {line_no}"))?;
                let slot = match key {
                    "twitter_bearer_token" => &mut cfg.twitter_bearer_token,
                    "twitter_base_url" => &mut cfg.twitter_base_url,
                    "instagram_base_url" => &mut cfg.instagram_base_url,
                    "youtube_base_url" => &mut cfg.youtube_base_url,
                    "vimeo_base_url" => &mut cfg.vimeo_base_url,
                    _ => &mut cfg.posttv_base_url,
                };
                *slot = Some(parsed);
            }
            unknown => {
                bail!("Unknown configuration key: '{unknown}' on line {line_no}");
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

fn parse_integer_u8(raw_value: &str) -> Result<u8> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<u16>()?;
    u8::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u8"))
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<i128>()?;
    if value < 0 {
        bail!("Expected non-negative integer");
    }
    u64::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u64"))
}
