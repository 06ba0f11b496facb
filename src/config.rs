// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Gate options come from built-in defaults, an optional JSON file and the
//! environment, in that order. Host settings come from the environment only.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `AUTHKIT_CONFIG` | Path to a JSON file with gate options | unset |
//! | `AUTHKIT_JWT_COOKIE_NAME` | Cookie holding the access token | `authkit_token` |
//! | `AUTHKIT_REFRESH_COOKIE_NAME` | Cookie holding the refresh token | `authkit_refresh` |
//! | `AUTHKIT_JWT_SECRET` | HMAC key shared with the token issuer | `supersecretsecret` |
//! | `AUTHKIT_JWT_ALGORITHM` | Expected signing algorithm (only `HS256` works) | `HS256` |
//! | `AUTHKIT_CLOCK_SKEW_SECONDS` | Tolerance for `nbf`/`exp` checks | `30` |
//! | `UPSTREAM_URL` | Protected backend base URL | Required |
//! | `UPSTREAM_TIMEOUT_SECS` | Timeout for upstream requests | `30` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |
//!
//! Any of the four string options may be written as `${NAME}`, in which case
//! the value of environment variable `NAME` is used. An unset or empty
//! variable leaves the placeholder in place and logs a warning.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::auth::resolver::CLOCK_SKEW_LEEWAY;

/// Environment variable name for the JSON gate configuration file.
///
/// Keys are camelCase (`jwtCookieName`, `jwtSecret`, ...). Missing keys
/// keep their defaults.
///
/// # Default
/// unset (built-in defaults only)
pub const CONFIG_PATH_ENV: &str = "AUTHKIT_CONFIG";

/// Environment variable name for the access-token cookie name.
///
/// # Default
/// `authkit_token`
pub const JWT_COOKIE_NAME_ENV: &str = "AUTHKIT_JWT_COOKIE_NAME";

/// Environment variable name for the refresh-token cookie name.
///
/// # Default
/// `authkit_refresh`
pub const REFRESH_COOKIE_NAME_ENV: &str = "AUTHKIT_REFRESH_COOKIE_NAME";

/// Environment variable name for the shared HMAC secret.
///
/// May itself be a `${NAME}` placeholder, resolved once at startup.
///
/// # Default
/// `supersecretsecret`
pub const JWT_SECRET_ENV: &str = "AUTHKIT_JWT_SECRET";

/// Environment variable name for the expected token algorithm.
///
/// Anything other than HS256 rejects every token.
///
/// # Default
/// `HS256`
pub const JWT_ALGORITHM_ENV: &str = "AUTHKIT_JWT_ALGORITHM";

/// Environment variable name for the `nbf` / `exp` tolerance in seconds.
///
/// # Default
/// `30`
pub const CLOCK_SKEW_ENV: &str = "AUTHKIT_CLOCK_SKEW_SECONDS";

/// Environment variable name for the protected backend base URL.
///
/// # Default
/// none (required, `http` or `https`)
pub const UPSTREAM_URL_ENV: &str = "UPSTREAM_URL";

/// Environment variable name for the upstream request timeout in seconds.
///
/// # Default
/// `30`
pub const UPSTREAM_TIMEOUT_ENV: &str = "UPSTREAM_TIMEOUT_SECS";

/// Environment variable name for the listen address.
///
/// # Default
/// `0.0.0.0`
pub const HOST_ENV: &str = "HOST";

/// Environment variable name for the listen port.
///
/// # Default
/// `8080`
pub const PORT_ENV: &str = "PORT";

/// Environment variable name for the log output format (`json` or `pretty`).
///
/// # Default
/// `pretty`
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration loading errors. These abort startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },

    #[error("{0} must be set")]
    Missing(&'static str),
}

/// Look up an environment variable in the process environment.
pub fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Gate options as written by the operator, before placeholder substitution.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthKitConfig {
    pub jwt_cookie_name: String,
    pub refresh_cookie_name: String,
    pub jwt_secret: String,
    pub jwt_algorithm: String,
    pub clock_skew_seconds: i64,
}

impl Default for AuthKitConfig {
    fn default() -> Self {
        Self {
            jwt_cookie_name: "authkit_token".to_string(),
            refresh_cookie_name: "authkit_refresh".to_string(),
            jwt_secret: "supersecretsecret".to_string(),
            jwt_algorithm: "HS256".to_string(),
            clock_skew_seconds: CLOCK_SKEW_LEEWAY,
        }
    }
}

impl fmt::Debug for AuthKitConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthKitConfig")
            .field("jwt_cookie_name", &self.jwt_cookie_name)
            .field("refresh_cookie_name", &self.refresh_cookie_name)
            .field("jwt_secret", &"<redacted>")
            .field("jwt_algorithm", &self.jwt_algorithm)
            .field("clock_skew_seconds", &self.clock_skew_seconds)
            .finish()
    }
}

impl AuthKitConfig {
    /// Read options from a JSON file. Keys left out keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from the process environment (and `AUTHKIT_CONFIG`, if set).
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(process_env)
    }

    /// Load using `lookup` in place of the process environment.
    pub fn load_with(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = match lookup(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides(&lookup)?;
        Ok(config)
    }

    /// Replace options with any `AUTHKIT_*` variables that are set.
    pub fn apply_env_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(v) = lookup(JWT_COOKIE_NAME_ENV) {
            self.jwt_cookie_name = v;
        }
        if let Some(v) = lookup(REFRESH_COOKIE_NAME_ENV) {
            self.refresh_cookie_name = v;
        }
        if let Some(v) = lookup(JWT_SECRET_ENV) {
            self.jwt_secret = v;
        }
        if let Some(v) = lookup(JWT_ALGORITHM_ENV) {
            self.jwt_algorithm = v;
        }
        if let Some(v) = lookup(CLOCK_SKEW_ENV) {
            self.clock_skew_seconds = v.trim().parse().map_err(|_| ConfigError::InvalidValue {
                name: CLOCK_SKEW_ENV,
                value: v.clone(),
            })?;
        }
        Ok(())
    }

    /// Substitute `${NAME}` placeholders and freeze the result.
    pub fn resolve(&self, lookup: impl Fn(&str) -> Option<String>) -> ResolvedConfig {
        ResolvedConfig {
            jwt_cookie_name: substitute_env_vars(&self.jwt_cookie_name, &lookup),
            refresh_cookie_name: substitute_env_vars(&self.refresh_cookie_name, &lookup),
            jwt_secret: substitute_env_vars(&self.jwt_secret, &lookup),
            jwt_algorithm: substitute_env_vars(&self.jwt_algorithm, &lookup),
            clock_skew_seconds: self.clock_skew_seconds,
        }
    }
}

/// Replace a whole-value `${NAME}` placeholder with the variable's value.
///
/// Values that are not exactly one placeholder are returned unchanged, as is
/// a placeholder whose variable is unset or empty.
pub fn substitute_env_vars(value: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let Some(name) = value
        .strip_prefix("${")
        .and_then(|rest| rest.strip_suffix('}'))
    else {
        return value.to_string();
    };

    match lookup(name).filter(|v| !v.is_empty()) {
        Some(resolved) => resolved,
        None => {
            tracing::warn!(variable = name, "Environment variable not found or empty");
            value.to_string()
        }
    }
}

/// Gate options after substitution. Immutable and shared by every request.
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub jwt_cookie_name: String,
    pub refresh_cookie_name: String,
    pub jwt_secret: String,
    pub jwt_algorithm: String,
    pub clock_skew_seconds: i64,
}

impl fmt::Debug for ResolvedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedConfig")
            .field("jwt_cookie_name", &self.jwt_cookie_name)
            .field("refresh_cookie_name", &self.refresh_cookie_name)
            .field("jwt_secret", &"<redacted>")
            .field("jwt_algorithm", &self.jwt_algorithm)
            .field("clock_skew_seconds", &self.clock_skew_seconds)
            .finish()
    }
}

/// One-time resolution of the gate configuration.
///
/// The first caller resolves; everyone else, including callers racing with
/// the first, receives that same value.
#[derive(Default)]
pub struct ConfigGate {
    resolved: OnceLock<Arc<ResolvedConfig>>,
}

impl ConfigGate {
    pub const fn new() -> Self {
        Self {
            resolved: OnceLock::new(),
        }
    }

    /// Resolve `raw` against the process environment on first use.
    pub fn get_or_resolve(&self, raw: &AuthKitConfig) -> Arc<ResolvedConfig> {
        self.get_or_resolve_with(raw, process_env)
    }

    pub fn get_or_resolve_with(
        &self,
        raw: &AuthKitConfig,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Arc<ResolvedConfig> {
        self.resolved
            .get_or_init(|| Arc::new(raw.resolve(lookup)))
            .clone()
    }

    /// The resolved configuration, if resolution already happened.
    pub fn get(&self) -> Option<Arc<ResolvedConfig>> {
        self.resolved.get().cloned()
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

/// Host settings for the gateway binary.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub upstream_url: Url,
    pub upstream_timeout: Duration,
    pub log_format: LogFormat,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(process_env)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let upstream = lookup(UPSTREAM_URL_ENV)
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing(UPSTREAM_URL_ENV))?;
        let upstream_url = Url::parse(&upstream)
            .ok()
            .filter(|url| matches!(url.scheme(), "http" | "https"))
            .ok_or_else(|| ConfigError::InvalidValue {
                name: UPSTREAM_URL_ENV,
                value: upstream.clone(),
            })?;

        let port = match lookup(PORT_ENV) {
            Some(v) => v.parse().map_err(|_| ConfigError::InvalidValue {
                name: PORT_ENV,
                value: v.clone(),
            })?,
            None => 8080,
        };

        let upstream_timeout = match lookup(UPSTREAM_TIMEOUT_ENV) {
            Some(v) => v
                .parse()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::InvalidValue {
                    name: UPSTREAM_TIMEOUT_ENV,
                    value: v.clone(),
                })?,
            None => DEFAULT_UPSTREAM_TIMEOUT,
        };

        let log_format = match lookup(LOG_FORMAT_ENV).as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            host: lookup(HOST_ENV).unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            upstream_url,
            upstream_timeout,
            log_format,
        })
    }
}
