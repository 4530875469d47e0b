//! Client configuration from the environment.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_API_URL: &str = "http://localhost:8080";
pub const DEFAULT_LOGIN_ROUTE: &str = "/login";
pub const DEFAULT_FALLBACK_ROUTE: &str = "/dashboard";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be a positive number of seconds, got '{value}'")]
    InvalidTimeout { name: &'static str, value: String },
    #[error("{name} must start with '/', got '{value}'")]
    InvalidRoute { name: &'static str, value: String },
    #[error("login and fallback routes must differ (both '{0}')")]
    RouteCollision(String),
    #[error("API URL must start with http:// or https://, got '{0}'")]
    InvalidApiUrl(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_url: String,
    pub token_file: PathBuf,
    pub login_route: String,
    pub fallback_route: String,
    pub request_timeout: Duration,
}

fn default_token_file() -> PathBuf {
    match dirs::home_dir() {
        Some(home) => home.join(".sysconsole").join("token"),
        None => PathBuf::from(".sysconsole-token"),
    }
}

impl ClientConfig {
    /// Read `SYSCONSOLE_*` variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_url = get("SYSCONSOLE_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let token_file = get("SYSCONSOLE_TOKEN_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(default_token_file);
        let login_route =
            get("SYSCONSOLE_LOGIN_ROUTE").unwrap_or_else(|| DEFAULT_LOGIN_ROUTE.to_string());
        let fallback_route =
            get("SYSCONSOLE_FALLBACK_ROUTE").unwrap_or_else(|| DEFAULT_FALLBACK_ROUTE.to_string());

        let request_timeout = match get("SYSCONSOLE_REQUEST_TIMEOUT_SECS") {
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::InvalidTimeout {
                        name: "SYSCONSOLE_REQUEST_TIMEOUT_SECS",
                        value: raw,
                    });
                }
            },
        };

        let config = Self {
            api_url: api_url.trim().to_string(),
            token_file,
            login_route: login_route.trim().to_string(),
            fallback_route: fallback_route.trim().to_string(),
            request_timeout,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(ConfigError::InvalidApiUrl(self.api_url.clone()));
        }
        for (name, value) in [
            ("SYSCONSOLE_LOGIN_ROUTE", &self.login_route),
            ("SYSCONSOLE_FALLBACK_ROUTE", &self.fallback_route),
        ] {
            if !value.starts_with('/') {
                return Err(ConfigError::InvalidRoute {
                    name,
                    value: value.clone(),
                });
            }
        }
        if self.login_route == self.fallback_route {
            return Err(ConfigError::RouteCollision(self.login_route.clone()));
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout {
                name: "request_timeout",
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.login_route, "/login");
        assert_eq!(config.fallback_route, "/dashboard");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn overrides_apply() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("SYSCONSOLE_API_URL", "https://console.example.com"),
            ("SYSCONSOLE_TOKEN_FILE", "/tmp/tok"),
            ("SYSCONSOLE_REQUEST_TIMEOUT_SECS", "5"),
            ("SYSCONSOLE_FALLBACK_ROUTE", "/home"),
        ]))
        .unwrap();
        assert_eq!(config.api_url, "https://console.example.com");
        assert_eq!(config.token_file, PathBuf::from("/tmp/tok"));
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.fallback_route, "/home");
    }

    #[test]
    fn blank_values_fall_back() {
        let config =
            ClientConfig::from_lookup(lookup(&[("SYSCONSOLE_LOGIN_ROUTE", "  ")])).unwrap();
        assert_eq!(config.login_route, "/login");
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            ClientConfig::from_lookup(lookup(&[("SYSCONSOLE_REQUEST_TIMEOUT_SECS", "0")])),
            Err(ConfigError::InvalidTimeout { .. })
        ));
        assert!(matches!(
            ClientConfig::from_lookup(lookup(&[("SYSCONSOLE_LOGIN_ROUTE", "login")])),
            Err(ConfigError::InvalidRoute { .. })
        ));
        assert!(matches!(
            ClientConfig::from_lookup(lookup(&[("SYSCONSOLE_FALLBACK_ROUTE", "/login")])),
            Err(ConfigError::RouteCollision(_))
        ));
        assert!(matches!(
            ClientConfig::from_lookup(lookup(&[("SYSCONSOLE_API_URL", "ftp://x")])),
            Err(ConfigError::InvalidApiUrl(_))
        ));
    }
}
