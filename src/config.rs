//! Portal configuration parsed from environment variables.

use std::path::PathBuf;

pub const DEFAULT_API_BASE: &str = "/api";
pub const DEFAULT_ORIGIN: &str = "http://127.0.0.1:3000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalConfig {
    /// Base every API path is resolved against, e.g. `/api`.
    pub api_base: String,
    /// Origin prefixed to relative URLs by the native transport.
    pub origin: String,
    pub credential_path: PathBuf,
    pub timeouts: HttpTimeouts,
}

impl PortalConfig {
    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `PORTAL_API_BASE`: default `/api`
    /// - `PORTAL_ORIGIN`: default `http://127.0.0.1:3000`
    /// - `PORTAL_CREDENTIAL_PATH`: default `$HOME/.config/portal/token`
    /// - `PORTAL_REQUEST_TIMEOUT_SECS`: default 30
    /// - `PORTAL_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns an error if a timeout is not a whole number of seconds.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`PortalConfig::from_env`], reading values through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns an error if a timeout is not a whole number of seconds.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_base = lookup("PORTAL_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_owned());
        let origin = lookup("PORTAL_ORIGIN")
            .unwrap_or_else(|| DEFAULT_ORIGIN.to_owned())
            .trim_end_matches('/')
            .to_owned();
        let credential_path = lookup("PORTAL_CREDENTIAL_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| default_credential_path(lookup("HOME")));
        let timeouts = HttpTimeouts {
            request_secs: parse_secs(&lookup, "PORTAL_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?,
            connect_secs: parse_secs(&lookup, "PORTAL_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS)?,
        };

        Ok(Self { api_base, origin, credential_path, timeouts })
    }
}

fn default_credential_path(home: Option<String>) -> PathBuf {
    match home {
        Some(home) if !home.is_empty() => PathBuf::from(home).join(".config").join("portal").join("token"),
        _ => PathBuf::from(".portal").join("token"),
    }
}

fn parse_secs(lookup: &impl Fn(&str) -> Option<String>, var: &'static str, default: u64) -> Result<u64, ConfigError> {
    match lookup(var) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::Invalid { var, value: raw }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
