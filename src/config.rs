//! Client configuration loaded from environment variables.
//!
//! All settings come from environment variables (or a `.env` file via
//! `dotenvy`):
//!
//! | Variable                        | Default                    |
//! |---------------------------------|----------------------------|
//! | `REALTIME_REST_HOST`            | `https://rest.example.com` |
//! | `REALTIME_API_KEY`              | unset (no authentication)  |
//! | `REALTIME_REQUEST_TIMEOUT_SECS` | `10`                       |
//! | `REALTIME_STATS_LIMIT`          | `100`                      |

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use reqwest::Url;

use crate::error::{ClientError, Result};
use crate::stats::DEFAULT_LIMIT;

/// Default REST endpoint.
pub const DEFAULT_REST_HOST: &str = "https://rest.example.com";

/// API key in `name:secret` form, used for HTTP basic authentication.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey {
    /// Key name (the part before `:`).
    pub name: String,
    /// Key secret (the part after `:`).
    pub secret: String,
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKey")
            .field("name", &self.name)
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl FromStr for ApiKey {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once(':') {
            Some((name, secret)) if !name.is_empty() && !secret.is_empty() => Ok(Self {
                name: name.to_string(),
                secret: secret.to_string(),
            }),
            _ => Err(ClientError::Config(
                "api key must have the form name:secret".to_string(),
            )),
        }
    }
}

/// Top-level client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the REST API.
    pub rest_host: Url,

    /// Credentials; requests are unauthenticated when absent.
    pub api_key: Option<ApiKey>,

    /// Per-request timeout applied by the HTTP client.
    pub request_timeout: Duration,

    /// Page size for statistics queries that do not set one.
    pub stats_limit: u32,
}

impl ClientConfig {
    /// Creates a configuration for `rest_host` with default settings.
    #[must_use]
    pub fn new(rest_host: Url) -> Self {
        Self {
            rest_host,
            api_key: None,
            request_timeout: Duration::from_secs(10),
            stats_limit: DEFAULT_LIMIT,
        }
    }

    /// Sets the API key.
    #[must_use]
    pub fn with_api_key(mut self, api_key: ApiKey) -> Self {
        self.api_key = Some(api_key);
        self
    }

    /// Loads configuration from environment variables.
    ///
    /// Falls back to defaults when a variable is not set. Calls
    /// `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if `REALTIME_REST_HOST` is not a
    /// valid URL or `REALTIME_API_KEY` is not of the form `name:secret`.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let rest_host = std::env::var("REALTIME_REST_HOST")
            .unwrap_or_else(|_| DEFAULT_REST_HOST.to_string());
        let rest_host = Url::parse(&rest_host)
            .map_err(|e| ClientError::Config(format!("invalid REALTIME_REST_HOST: {e}")))?;

        let api_key = std::env::var("REALTIME_API_KEY")
            .ok()
            .filter(|v| !v.is_empty())
            .map(|v| v.parse::<ApiKey>())
            .transpose()?;

        let request_timeout = Duration::from_secs(parse_env("REALTIME_REQUEST_TIMEOUT_SECS", 10));
        let stats_limit = parse_env("REALTIME_STATS_LIMIT", DEFAULT_LIMIT);

        Ok(Self {
            rest_host,
            api_key,
            request_timeout,
            stats_limit,
        })
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn api_key_splits_on_first_colon() {
        let Ok(key) = "app.key:s3cr:et".parse::<ApiKey>() else {
            panic!("valid key");
        };
        assert_eq!(key.name, "app.key");
        assert_eq!(key.secret, "s3cr:et");
    }

    #[test]
    fn api_key_requires_both_parts() {
        assert!("nosecret".parse::<ApiKey>().is_err());
        assert!(":secret".parse::<ApiKey>().is_err());
        assert!("name:".parse::<ApiKey>().is_err());
    }

    #[test]
    fn api_key_debug_hides_secret() {
        let Ok(key) = "app.key:hunter2".parse::<ApiKey>() else {
            panic!("valid key");
        };
        assert!(!format!("{key:?}").contains("hunter2"));
    }

    #[test]
    fn parse_env_falls_back_on_missing_key() {
        let value: u64 = parse_env("REALTIME_TEST_SURELY_UNSET_VARIABLE", 42);
        assert_eq!(value, 42);
    }

    #[test]
    fn new_uses_defaults() {
        let Ok(url) = Url::parse(DEFAULT_REST_HOST) else {
            panic!("valid url");
        };
        let config = ClientConfig::new(url);
        assert_eq!(config.stats_limit, DEFAULT_LIMIT);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert!(config.api_key.is_none());
    }
}
