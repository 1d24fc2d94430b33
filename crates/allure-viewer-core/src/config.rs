//! Viewer configuration.
//!
//! Provides [`ViewerConfig`], loaded from environment variables. The only
//! value without a default is the report bucket; everything else mirrors the
//! conventions of the load balancer and identity provider in front of the
//! gateway.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// Errors produced while loading configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is not set.
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    /// An environment variable is set but cannot be parsed.
    #[error("invalid value for {name}: {value:?} ({reason})")]
    InvalidValue {
        /// Variable name.
        name: String,
        /// Raw value.
        value: String,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Gateway configuration.
///
/// # Examples
///
/// ```
/// use allure_viewer_core::config::ViewerConfig;
///
/// let config = ViewerConfig::builder().bucket("reports".into()).build();
/// assert_eq!(config.callback_path, "/oauth2/idpresponse");
/// assert_eq!(config.probe_concurrency, 8);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct ViewerConfig {
    /// Bind address for the gateway (e.g. `"0.0.0.0:8080"`).
    #[builder(default = String::from("0.0.0.0:8080"))]
    pub gateway_listen: String,

    /// Object-store bucket holding the report bundles.
    pub bucket: String,

    /// Region of the bucket.
    #[builder(default = String::from("us-east-1"))]
    pub region: String,

    /// Custom S3 endpoint (LocalStack, MinIO, ...).
    #[builder(default)]
    pub endpoint_url: Option<String>,

    /// Whether to use path-style bucket addressing.
    #[builder(default = false)]
    pub force_path_style: bool,

    /// Identity-provider callback path, served like `/`.
    #[builder(default = String::from("/oauth2/idpresponse"))]
    pub callback_path: String,

    /// Header injected by the authenticating proxy with the caller identity.
    #[builder(default = String::from("x-amzn-oidc-identity"))]
    pub identity_header: String,

    /// Maximum number of concurrent entry-file probes per catalog listing.
    #[builder(default = 8)]
    pub probe_concurrency: usize,

    /// Deadline for a single object-store call, in milliseconds.
    #[builder(default = 10_000)]
    pub store_timeout_ms: u64,

    /// Total time budget for one request's store work, in milliseconds.
    /// Bounds the whole catalog listing, probes included.
    #[builder(default = 20_000)]
    pub request_timeout_ms: u64,

    /// `max-age` of the Cache-Control header on proxied files, in seconds.
    #[builder(default = 3600)]
    pub cache_max_age_secs: u64,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"))]
    pub log_level: String,
}

impl ViewerConfig {
    /// Load configuration from the process environment.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `GATEWAY_LISTEN` | `0.0.0.0:8080` |
    /// | `REPORT_BUCKET` | *(required)* |
    /// | `AWS_REGION` / `DEFAULT_REGION` | `us-east-1` |
    /// | `S3_ENDPOINT_URL` | *(unset)* |
    /// | `S3_FORCE_PATH_STYLE` | `false` |
    /// | `CALLBACK_PATH` | `/oauth2/idpresponse` |
    /// | `IDENTITY_HEADER` | `x-amzn-oidc-identity` |
    /// | `PROBE_CONCURRENCY` | `8` |
    /// | `STORE_TIMEOUT_MS` | `10000` |
    /// | `REQUEST_TIMEOUT_MS` | `20000` |
    /// | `CACHE_MAX_AGE_SECS` | `3600` |
    /// | `LOG_LEVEL` | `info` |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bucket = lookup("REPORT_BUCKET")
            .map(|v| v.trim().to_owned())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("REPORT_BUCKET".to_owned()))?;

        let mut config = Self::builder().bucket(bucket).build();

        if let Some(v) = lookup("GATEWAY_LISTEN") {
            config.gateway_listen = v;
        }
        if let Some(v) = lookup("AWS_REGION").or_else(|| lookup("DEFAULT_REGION")) {
            config.region = v;
        }
        config.endpoint_url = lookup("S3_ENDPOINT_URL").filter(|v| !v.is_empty());
        if let Some(v) = lookup("S3_FORCE_PATH_STYLE") {
            config.force_path_style = parse_bool(&v);
        }
        if let Some(v) = lookup("CALLBACK_PATH") {
            config.callback_path = v;
        }
        if let Some(v) = lookup("IDENTITY_HEADER") {
            config.identity_header = v.to_ascii_lowercase();
        }
        if let Some(v) = lookup("PROBE_CONCURRENCY") {
            config.probe_concurrency = parse_number("PROBE_CONCURRENCY", &v)?;
            if config.probe_concurrency == 0 {
                return Err(ConfigError::InvalidValue {
                    name: "PROBE_CONCURRENCY".to_owned(),
                    value: v,
                    reason: "must be at least 1".to_owned(),
                });
            }
        }
        if let Some(v) = lookup("STORE_TIMEOUT_MS") {
            config.store_timeout_ms = parse_number("STORE_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = lookup("REQUEST_TIMEOUT_MS") {
            config.request_timeout_ms = parse_number("REQUEST_TIMEOUT_MS", &v)?;
            if config.request_timeout_ms == 0 {
                return Err(ConfigError::InvalidValue {
                    name: "REQUEST_TIMEOUT_MS".to_owned(),
                    value: v,
                    reason: "must be at least 1".to_owned(),
                });
            }
        }
        if let Some(v) = lookup("CACHE_MAX_AGE_SECS") {
            config.cache_max_age_secs = parse_number("CACHE_MAX_AGE_SECS", &v)?;
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            config.log_level = v;
        }

        Ok(config)
    }

    /// Per-call deadline for object-store requests.
    #[must_use]
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    /// Total store budget for a single request.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Parse a string as a boolean, accepting `"1"` and `"true"` (case-insensitive).
fn parse_bool(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidValue {
            name: name.to_owned(),
            value: value.to_owned(),
            reason: e.to_string(),
        })
}
