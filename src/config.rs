//! Application configuration loaded from environment variables.
//!
//! Configuration is loaded once at startup and validated before the server starts.
//! Every variable is optional; unset variables fall back to the defaults below,
//! malformed ones are a startup error.
//!
//! ## Server
//!
//! - `LISTEN` - Bind address (default: `0.0.0.0:3000`)
//! - `BASE_URL` - Public prefix for short URLs (default: `http://localhost:3000`)
//! - `RUST_LOG` - Log level (default: `info`)
//! - `LOG_FORMAT` - Log format: `text` or `json` (default: `text`)
//! - `BEHIND_PROXY` - Trust `X-Forwarded-For` / `X-Real-IP` (default: `false`)
//!
//! ## Cache
//!
//! - `CACHE_MAX_ENTRIES` - Capacity (default: 10000, max: 1000000)
//! - `CACHE_TTL_SECONDS` - Default entry lifetime (default: 3600, max: 30 days)
//! - `CACHE_SWEEP_INTERVAL_SECONDS` - Expired entry purge period (default: 60, max: 1 day)
//!
//! ## Rate limiting
//!
//! - `RATE_LIMIT_REQUESTS` - Requests per window per client (default: 100)
//! - `RATE_LIMIT_WINDOW_SECONDS` - Window length (default: 60, max: 1 day)
//! - `RATE_LIMIT_CLEANUP_INTERVAL_SECONDS` - Finished window purge period (default: 60, max: 1 day)
//! - `RATE_LIMIT_EXCLUDED_PATHS` - Comma-separated exact paths (default: `/health`)
//!
//! ## Code allocation and clicks
//!
//! - `CODE_LENGTH` - Generated code length (default: 6, range: 4-32)
//! - `CODE_MAX_ATTEMPTS` - Candidates tried per allocation (default: 10, range: 1-100)
//! - `CLICK_QUEUE_CAPACITY` - Click event buffer size (default: 10000, min: 100)
//! - `LINK_PURGE_INTERVAL_SECONDS` - Expired link removal period (default: 300, max: 1 day)

use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;
use std::time::Duration;

const ONE_DAY_SECS: u64 = 24 * 60 * 60;
const MAX_CACHE_TTL_SECS: u64 = 30 * ONE_DAY_SECS;

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub listen_addr: String,
    pub base_url: String,
    pub log_level: String,
    pub log_format: String,
    /// When true, rate limiting reads client IP from X-Forwarded-For / X-Real-IP headers.
    /// Enable only when the service is behind a trusted reverse proxy.
    pub behind_proxy: bool,

    pub cache_max_entries: usize,
    pub cache_ttl_seconds: u64,
    pub cache_sweep_interval_seconds: u64,

    pub rate_limit_requests: u32,
    pub rate_limit_window_seconds: u64,
    pub rate_limit_cleanup_interval_seconds: u64,
    pub rate_limit_excluded_paths: Vec<String>,

    pub code_length: usize,
    pub code_max_attempts: usize,
    pub click_queue_capacity: usize,
    pub link_purge_interval_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:3000".to_string(),
            base_url: "http://localhost:3000".to_string(),
            log_level: "info".to_string(),
            log_format: "text".to_string(),
            behind_proxy: false,
            cache_max_entries: 10_000,
            cache_ttl_seconds: 3600,
            cache_sweep_interval_seconds: 60,
            rate_limit_requests: 100,
            rate_limit_window_seconds: 60,
            rate_limit_cleanup_interval_seconds: 60,
            rate_limit_excluded_paths: vec!["/health".to_string()],
            code_length: 6,
            code_max_attempts: 10,
            click_queue_capacity: 10_000,
            link_purge_interval_seconds: 300,
        }
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric or boolean variable cannot be parsed.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let behind_proxy = env::var("BEHIND_PROXY")
            .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
            .unwrap_or(defaults.behind_proxy);

        let rate_limit_excluded_paths = match env::var("RATE_LIMIT_EXCLUDED_PATHS") {
            Ok(raw) => parse_path_list(&raw),
            Err(_) => defaults.rate_limit_excluded_paths,
        };

        Ok(Self {
            listen_addr: env::var("LISTEN").unwrap_or(defaults.listen_addr),
            base_url: env::var("BASE_URL").unwrap_or(defaults.base_url),
            log_level: env::var("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: env::var("LOG_FORMAT").unwrap_or(defaults.log_format),
            behind_proxy,
            cache_max_entries: parse_env("CACHE_MAX_ENTRIES", defaults.cache_max_entries)?,
            cache_ttl_seconds: parse_env("CACHE_TTL_SECONDS", defaults.cache_ttl_seconds)?,
            cache_sweep_interval_seconds: parse_env(
                "CACHE_SWEEP_INTERVAL_SECONDS",
                defaults.cache_sweep_interval_seconds,
            )?,
            rate_limit_requests: parse_env("RATE_LIMIT_REQUESTS", defaults.rate_limit_requests)?,
            rate_limit_window_seconds: parse_env(
                "RATE_LIMIT_WINDOW_SECONDS",
                defaults.rate_limit_window_seconds,
            )?,
            rate_limit_cleanup_interval_seconds: parse_env(
                "RATE_LIMIT_CLEANUP_INTERVAL_SECONDS",
                defaults.rate_limit_cleanup_interval_seconds,
            )?,
            rate_limit_excluded_paths,
            code_length: parse_env("CODE_LENGTH", defaults.code_length)?,
            code_max_attempts: parse_env("CODE_MAX_ATTEMPTS", defaults.code_max_attempts)?,
            click_queue_capacity: parse_env(
                "CLICK_QUEUE_CAPACITY",
                defaults.click_queue_capacity,
            )?,
            link_purge_interval_seconds: parse_env(
                "LINK_PURGE_INTERVAL_SECONDS",
                defaults.link_purge_interval_seconds,
            )?,
        })
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `log_format` is not `text` or `json`
    /// - `listen_addr` is not `host:port`
    /// - `base_url` is not an absolute http(s) URL
    /// - any size, period or count is zero or outside its range
    pub fn validate(&self) -> Result<()> {
        if self.log_format != "text" && self.log_format != "json" {
            anyhow::bail!(
                "LOG_FORMAT must be 'text' or 'json', got '{}'",
                self.log_format
            );
        }

        if !self.listen_addr.contains(':') {
            anyhow::bail!(
                "LISTEN must be in format 'host:port', got '{}'",
                self.listen_addr
            );
        }

        let base = url::Url::parse(&self.base_url)
            .with_context(|| format!("BASE_URL is not a valid URL: '{}'", self.base_url))?;
        if !matches!(base.scheme(), "http" | "https") {
            anyhow::bail!(
                "BASE_URL must start with 'http://' or 'https://', got '{}'",
                self.base_url
            );
        }

        if self.cache_max_entries == 0 || self.cache_max_entries > 1_000_000 {
            anyhow::bail!(
                "CACHE_MAX_ENTRIES must be between 1 and 1000000, got {}",
                self.cache_max_entries
            );
        }

        let periods = [
            ("CACHE_TTL_SECONDS", self.cache_ttl_seconds, MAX_CACHE_TTL_SECS),
            (
                "CACHE_SWEEP_INTERVAL_SECONDS",
                self.cache_sweep_interval_seconds,
                ONE_DAY_SECS,
            ),
            (
                "RATE_LIMIT_WINDOW_SECONDS",
                self.rate_limit_window_seconds,
                ONE_DAY_SECS,
            ),
            (
                "RATE_LIMIT_CLEANUP_INTERVAL_SECONDS",
                self.rate_limit_cleanup_interval_seconds,
                ONE_DAY_SECS,
            ),
            (
                "LINK_PURGE_INTERVAL_SECONDS",
                self.link_purge_interval_seconds,
                ONE_DAY_SECS,
            ),
        ];
        for (name, value, max) in periods {
            if !(1..=max).contains(&value) {
                anyhow::bail!("{name} must be between 1 and {max}, got {value}");
            }
        }

        if self.rate_limit_requests == 0 {
            anyhow::bail!("RATE_LIMIT_REQUESTS must be greater than 0");
        }

        if !(4..=32).contains(&self.code_length) {
            anyhow::bail!(
                "CODE_LENGTH must be between 4 and 32, got {}",
                self.code_length
            );
        }

        if !(1..=100).contains(&self.code_max_attempts) {
            anyhow::bail!(
                "CODE_MAX_ATTEMPTS must be between 1 and 100, got {}",
                self.code_max_attempts
            );
        }

        if self.click_queue_capacity < 100 {
            anyhow::bail!(
                "CLICK_QUEUE_CAPACITY must be at least 100, got {}",
                self.click_queue_capacity
            );
        }

        if self.click_queue_capacity > 1_000_000 {
            anyhow::bail!(
                "CLICK_QUEUE_CAPACITY is too large (max: 1000000), got {}",
                self.click_queue_capacity
            );
        }

        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }

    pub fn cache_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.cache_sweep_interval_seconds)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_seconds)
    }

    pub fn rate_limit_cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.rate_limit_cleanup_interval_seconds)
    }

    pub fn link_purge_interval(&self) -> Duration {
        Duration::from_secs(self.link_purge_interval_seconds)
    }

    /// Logs the effective configuration.
    pub fn print_summary(&self) {
        tracing::info!("Configuration loaded:");
        tracing::info!("  Listen address: {}", self.listen_addr);
        tracing::info!("  Base URL: {}", self.base_url);
        tracing::info!("  Behind proxy: {}", self.behind_proxy);
        tracing::info!("  Log level: {}", self.log_level);
        tracing::info!("  Log format: {}", self.log_format);
        tracing::info!(
            "  Cache: {} entries, TTL {}s, sweep every {}s",
            self.cache_max_entries,
            self.cache_ttl_seconds,
            self.cache_sweep_interval_seconds
        );
        tracing::info!(
            "  Rate limit: {} requests / {}s, cleanup every {}s, excluded {:?}",
            self.rate_limit_requests,
            self.rate_limit_window_seconds,
            self.rate_limit_cleanup_interval_seconds,
            self.rate_limit_excluded_paths
        );
        tracing::info!(
            "  Codes: length {}, {} attempts",
            self.code_length,
            self.code_max_attempts
        );
        tracing::info!("  Click queue capacity: {}", self.click_queue_capacity);
        tracing::info!(
            "  Expired link purge every {}s",
            self.link_purge_interval_seconds
        );
    }
}

/// Reads `name` and parses it, falling back to `default` when unset.
fn parse_env<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{name} has an invalid value: '{raw}'")),
        Err(_) => Ok(default),
    }
}

fn parse_path_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Loads and validates configuration from environment variables.
///
/// # Errors
///
/// Returns an error if a variable is malformed or validation fails.
///
/// # Note
///
/// This function expects environment variables to be already loaded
/// (e.g., via `dotenvy::dotenv()` in `main.rs`).
pub fn load_from_env() -> Result<Config> {
    let config = Config::from_env()?;
    config.validate()?;
    Ok(config)
}
