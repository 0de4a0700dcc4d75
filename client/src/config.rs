//! Directory API configuration loaded via OrthoConfig.
//!
//! The base URL is injected here rather than baked into the adapter so the
//! same build can target local, staging and production directories.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3000/api/";

/// Errors raised while interpreting directory settings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The base URL does not parse.
    #[error("invalid directory base URL {value:?}: {message}")]
    InvalidBaseUrl {
        /// Configured value.
        value: String,
        /// Parser detail.
        message: String,
    },
    /// The base URL uses something other than HTTP or HTTPS.
    #[error("directory base URL must use http or https, got {scheme:?}")]
    UnsupportedScheme {
        /// Scheme found in the configured value.
        scheme: String,
    },
}

/// Settings for reaching the user directory API.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "ROSTER_API")]
pub struct ApiSettings {
    /// Root URL that `users/{id}` and `roles` are resolved against.
    pub base_url: Option<String>,
    /// Optional per-request timeout in seconds.
    pub timeout_secs: Option<u64>,
}

impl ApiSettings {
    /// Return the configured base URL, falling back to the local default.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the value does not parse or is not an
    /// HTTP(S) URL.
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        let raw = self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        parse_base_url(raw)
    }

    /// Return the request timeout, if one is configured.
    ///
    /// Zero disables the timeout.
    pub fn request_timeout(&self) -> Option<Duration> {
        self.timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|error| ConfigError::InvalidBaseUrl {
        value: raw.to_owned(),
        message: error.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::UnsupportedScheme {
            scheme: other.to_owned(),
        }),
    }
}
