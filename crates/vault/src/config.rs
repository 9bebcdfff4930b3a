//! Configuration loading and validation for the vault service.
//!
//! All values are read from environment variables at startup. The process will
//! exit with a clear error message if any required variable is missing or invalid,
//! including a missing or malformed `ENCRYPTION_KEY`.

use std::fmt;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::crypto::{FieldCodec, FieldKey};

/// Validated vault service configuration.
#[derive(Clone, Deserialize)]
pub struct Config {
    /// AES-256 key as 64 hex characters. **Required.**
    pub encryption_key: Option<String>,

    /// Port the HTTP server listens on.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// HTTP header carrying the caller's user id, set by the upstream
    /// identity layer.
    #[serde(default = "default_user_header")]
    pub user_header_name: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// OTLP endpoint for span export. Spans are not exported when unset.
    #[serde(default)]
    pub otel_exporter_otlp_endpoint: Option<String>,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_listen_port() -> u16 {
    8080
}
fn default_user_header() -> String {
    "X-User-Id".into()
}
fn default_request_timeout() -> u64 {
    30
}
fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any required variable is absent or cannot be parsed.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .context("failed to build configuration from environment")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// Build the field codec from the configured key.
    ///
    /// # Errors
    ///
    /// Returns an error if `ENCRYPTION_KEY` is missing or not 64 hex characters.
    pub fn field_codec(&self) -> Result<FieldCodec> {
        FieldCodec::from_hex_key(self.encryption_key.as_deref()).context("ENCRYPTION_KEY is invalid")
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    fn validate(&self) -> Result<()> {
        match self.encryption_key.as_deref() {
            Some(key) if !key.trim().is_empty() => {
                // Parse once here so a bad key stops startup, not the first request.
                FieldKey::from_hex(key).context("ENCRYPTION_KEY is invalid")?;
            }
            _ => anyhow::bail!("ENCRYPTION_KEY is required and must not be empty"),
        }
        ensure_non_empty(&self.user_header_name, "USER_HEADER_NAME")?;
        if axum::http::HeaderName::from_bytes(self.user_header_name.as_bytes()).is_err() {
            anyhow::bail!("USER_HEADER_NAME must be a valid HTTP header name");
        }
        if self.request_timeout_secs == 0 {
            anyhow::bail!("REQUEST_TIMEOUT_SECS must be > 0");
        }
        if let Some(endpoint) = &self.otel_exporter_otlp_endpoint {
            ensure_non_empty(endpoint, "OTEL_EXPORTER_OTLP_ENDPOINT")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field(
                "encryption_key",
                &self.encryption_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("listen_port", &self.listen_port)
            .field("user_header_name", &self.user_header_name)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("otel_exporter_otlp_endpoint", &self.otel_exporter_otlp_endpoint)
            .field("log_level", &self.log_level)
            .finish()
    }
}

fn ensure_non_empty(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        anyhow::bail!("{name} is required and must not be empty");
    }
    Ok(())
}
