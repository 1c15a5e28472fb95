//! # Core Configuration Module
//!
//! Provides configuration management for the song library core.
//!
//! ## Overview
//!
//! A [`CoreConfig`] is either assembled with [`CoreConfig::builder`] or read
//! from the process environment with [`CoreConfig::from_env`]. Both paths run
//! the same fail-fast validation, so a config that exists is a config the
//! bootstrap can use.
//!
//! ## Environment
//!
//! | Variable | Required | Default |
//! |----------|----------|---------|
//! | `DB_URI` | yes | |
//! | `MUSIC_INFO_URL` | yes | |
//! | `REQUEST_TIMEOUT_SECS` | no | 10 |
//! | `DB_MAX_CONNECTIONS` | no | 5 |
//! | `PRESERVE_DELETED_KEYS` | no | false |
//! | `LOG_LEVEL` | no | info |
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//!
//! let config = CoreConfig::builder()
//!     .database_url("sqlite://songs.db")
//!     .music_info_url("http://localhost:8081")
//!     .build()
//!     .expect("Failed to build config");
//! ```

use crate::error::{Error, Result};
use crate::logging::LogLevel;
use std::str::FromStr;
use std::time::Duration;

pub const ENV_DB_URI: &str = "DB_URI";
pub const ENV_MUSIC_INFO_URL: &str = "MUSIC_INFO_URL";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "REQUEST_TIMEOUT_SECS";
pub const ENV_DB_MAX_CONNECTIONS: &str = "DB_MAX_CONNECTIONS";
pub const ENV_PRESERVE_DELETED_KEYS: &str = "PRESERVE_DELETED_KEYS";
pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
pub const MAX_DB_CONNECTIONS: u32 = 64;

/// Core configuration for the song library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    /// SQLite database path or `sqlite://` URL
    pub database_url: String,

    /// Base URL of the music info API (no trailing `/info`)
    pub music_info_url: String,

    /// Deadline applied to operations whose context carries none
    pub request_timeout: Duration,

    /// Upper bound of the connection pool
    pub db_max_connections: u32,

    /// Keep the (group, song) key of deleted rows reserved
    pub preserve_deleted_keys: bool,

    /// Level for workspace crates in the default log filter
    pub log_level: LogLevel,
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Reads the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingSetting`] when a required variable is unset and
    /// [`Error::InvalidSetting`] when a value does not parse.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through an arbitrary key lookup.
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let mut builder = CoreConfig::builder();

        if let Some(url) = get(ENV_DB_URI) {
            builder = builder.database_url(url);
        }
        if let Some(url) = get(ENV_MUSIC_INFO_URL) {
            builder = builder.music_info_url(url);
        }
        if let Some(raw) = get(ENV_REQUEST_TIMEOUT_SECS) {
            let secs: u64 = parse_setting(ENV_REQUEST_TIMEOUT_SECS, &raw)?;
            builder = builder.request_timeout(Duration::from_secs(secs));
        }
        if let Some(raw) = get(ENV_DB_MAX_CONNECTIONS) {
            builder = builder.db_max_connections(parse_setting(ENV_DB_MAX_CONNECTIONS, &raw)?);
        }
        if let Some(raw) = get(ENV_PRESERVE_DELETED_KEYS) {
            builder = builder.preserve_deleted_keys(parse_flag(ENV_PRESERVE_DELETED_KEYS, &raw)?);
        }
        if let Some(raw) = get(ENV_LOG_LEVEL) {
            let level = LogLevel::from_str(&raw).map_err(|e| Error::InvalidSetting {
                key: ENV_LOG_LEVEL.to_string(),
                value: raw.clone(),
                message: e.to_string(),
            })?;
            builder = builder.log_level(level);
        }

        builder.build()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Database URL is not empty
    /// - Music info URL is an http(s) URL
    /// - Request timeout is greater than zero
    /// - Pool size is within `1..=64`
    pub fn validate(&self) -> Result<()> {
        if self.database_url.trim().is_empty() {
            return Err(Error::Config("Database URL cannot be empty".to_string()));
        }

        let url = self.music_info_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(Error::InvalidSetting {
                key: ENV_MUSIC_INFO_URL.to_string(),
                value: self.music_info_url.clone(),
                message: "must be an http:// or https:// URL".to_string(),
            });
        }

        if self.request_timeout.is_zero() {
            return Err(Error::Config(
                "Request timeout must be greater than 0 seconds".to_string(),
            ));
        }

        if self.db_max_connections == 0 || self.db_max_connections > MAX_DB_CONNECTIONS {
            return Err(Error::Config(format!(
                "Database pool size must be between 1 and {} (got {})",
                MAX_DB_CONNECTIONS, self.db_max_connections
            )));
        }

        Ok(())
    }
}

fn parse_setting<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|e| Error::InvalidSetting {
        key: key.to_string(),
        value: raw.to_string(),
        message: e.to_string(),
    })
}

fn parse_flag(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::InvalidSetting {
            key: key.to_string(),
            value: raw.to_string(),
            message: "expected true or false".to_string(),
        }),
    }
}

/// Builder for [`CoreConfig`].
#[derive(Debug, Default)]
pub struct CoreConfigBuilder {
    database_url: Option<String>,
    music_info_url: Option<String>,
    request_timeout: Option<Duration>,
    db_max_connections: Option<u32>,
    preserve_deleted_keys: bool,
    log_level: Option<LogLevel>,
}

impl CoreConfigBuilder {
    /// Sets the SQLite database path or URL.
    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = Some(url.into());
        self
    }

    /// Sets the music info API base URL. A trailing `/` is dropped.
    pub fn music_info_url(mut self, url: impl Into<String>) -> Self {
        let url: String = url.into();
        self.music_info_url = Some(url.trim().trim_end_matches('/').to_string());
        self
    }

    /// Default: 10 seconds
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Default: 5
    pub fn db_max_connections(mut self, connections: u32) -> Self {
        self.db_max_connections = Some(connections);
        self
    }

    pub fn preserve_deleted_keys(mut self, preserve: bool) -> Self {
        self.preserve_deleted_keys = preserve;
        self
    }

    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.log_level = Some(level);
        self
    }

    pub fn build(self) -> Result<CoreConfig> {
        let database_url = self.database_url.ok_or_else(|| Error::MissingSetting {
            key: ENV_DB_URI.to_string(),
            message: "Database URL is required. Use .database_url() or set DB_URI.".to_string(),
        })?;

        let music_info_url = self.music_info_url.ok_or_else(|| Error::MissingSetting {
            key: ENV_MUSIC_INFO_URL.to_string(),
            message: "Music info API URL is required. Use .music_info_url() or set MUSIC_INFO_URL."
                .to_string(),
        })?;

        let config = CoreConfig {
            database_url,
            music_info_url,
            request_timeout: self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT),
            db_max_connections: self
                .db_max_connections
                .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS),
            preserve_deleted_keys: self.preserve_deleted_keys,
            log_level: self.log_level.unwrap_or_default(),
        };

        config.validate()?;

        Ok(config)
    }
}
