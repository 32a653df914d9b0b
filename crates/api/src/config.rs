//! Application configuration loaded from environment variables.

use std::time::Duration;

use provisioning::ServiceEndpoints;
use reqwest::Url;
use thiserror::Error;

const DEFAULT_IDENTITY_URL: &str = "http://localhost:5001/";
const DEFAULT_ORGANISATION_URL: &str = "http://localhost:5002/";
const DEFAULT_PATIENT_URL: &str = "http://localhost:5003/";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Errors raised while turning configuration into usable values.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} is not a valid URL ({value}): {reason}")]
    InvalidUrl {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `text` or `json` (default: `text`)
/// - `IDENTITY_SERVICE_URL`, `ORGANISATION_SERVICE_URL`,
///   `PATIENT_SERVICE_URL`: downstream base URLs
/// - `SERVICE_TIMEOUT_SECS`: per-call timeout (default: `30`)
/// - `SERVICE_TOKEN`: bearer token for downstream calls (default: none)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub identity_url: String,
    pub organisation_url: String,
    pub patient_url: String,
    pub service_timeout: Duration,
    pub service_token: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            host: var("HOST").unwrap_or(defaults.host),
            port: var("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: var("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: var("LOG_FORMAT")
                .map(|f| LogFormat::parse(&f))
                .unwrap_or(defaults.log_format),
            identity_url: var("IDENTITY_SERVICE_URL").unwrap_or(defaults.identity_url),
            organisation_url: var("ORGANISATION_SERVICE_URL")
                .unwrap_or(defaults.organisation_url),
            patient_url: var("PATIENT_SERVICE_URL").unwrap_or(defaults.patient_url),
            service_timeout: var("SERVICE_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.service_timeout),
            service_token: var("SERVICE_TOKEN").filter(|t| !t.is_empty()),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Validates the downstream URLs and bundles them for the service clients.
    pub fn service_endpoints(&self) -> Result<ServiceEndpoints, ConfigError> {
        Ok(ServiceEndpoints {
            identity: parse_url("IDENTITY_SERVICE_URL", &self.identity_url)?,
            organisation: parse_url("ORGANISATION_SERVICE_URL", &self.organisation_url)?,
            patient: parse_url("PATIENT_SERVICE_URL", &self.patient_url)?,
            timeout: self.service_timeout,
            token: self.service_token.clone(),
        })
    }
}

fn parse_url(name: &'static str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|err| ConfigError::InvalidUrl {
        name,
        value: value.to_string(),
        reason: err.to_string(),
    })
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            identity_url: DEFAULT_IDENTITY_URL.to_string(),
            organisation_url: DEFAULT_ORGANISATION_URL.to_string(),
            patient_url: DEFAULT_PATIENT_URL.to_string(),
            service_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            service_token: None,
        }
    }
}
