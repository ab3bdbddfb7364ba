//! Connection configuration.
//!
//! Deserializable settings for a [`RestAuthConnection`](crate::RestAuthConnection).
//! Everything except the base URL and the service credentials has a default.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{RestAuthError, RestAuthResult};

const REDACTED: &str = "***REDACTED***";

/// Settings for connecting to a RestAuth service.
#[derive(Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Base URL of the service, e.g. `https://auth.example.com`.
    pub base_url: String,

    /// Service account name used for HTTP Basic authentication.
    pub username: String,

    /// Service account password.
    pub password: String,

    /// Total request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Connect timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Whether to verify the service's TLS certificate.
    #[serde(default = "default_true")]
    pub tls_verify: bool,

    /// `User-Agent` header value.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_true() -> bool {
    true
}

fn default_user_agent() -> String {
    format!("restauth-client/{}", env!("CARGO_PKG_VERSION"))
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &REDACTED)
            .field("timeout_secs", &self.timeout_secs)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("tls_verify", &self.tls_verify)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl ConnectionConfig {
    /// Create a configuration with default transport settings.
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            username: username.into(),
            password: password.into(),
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            tls_verify: default_true(),
            user_agent: default_user_agent(),
        }
    }

    /// Parse a configuration from a JSON document.
    pub fn from_json_str(json: &str) -> RestAuthResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| RestAuthError::InvalidConfig(format!("failed to parse config: {e}")))
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Set the connect timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, secs: u64) -> Self {
        self.connect_timeout_secs = secs;
        self
    }

    /// Accept invalid TLS certificates. Only for test deployments.
    #[must_use]
    pub fn insecure(mut self) -> Self {
        self.tls_verify = false;
        self
    }

    /// Request timeout as `Duration`.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Connect timeout as `Duration`.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> RestAuthResult<()> {
        let url = url::Url::parse(&self.base_url).map_err(|e| {
            RestAuthError::InvalidConfig(format!("invalid base URL {:?}: {e}", self.base_url))
        })?;

        match url.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(RestAuthError::InvalidConfig(format!(
                    "unsupported URL scheme: {scheme}"
                )))
            }
        }

        if url.query().is_some() || url.fragment().is_some() {
            return Err(RestAuthError::InvalidConfig(
                "base URL must not contain a query or fragment".to_string(),
            ));
        }

        if self.username.is_empty() {
            return Err(RestAuthError::InvalidConfig(
                "username must not be empty".to_string(),
            ));
        }

        if self.timeout_secs == 0 {
            return Err(RestAuthError::InvalidConfig(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Copy of this configuration safe for display.
    #[must_use]
    pub fn redacted(&self) -> Self {
        Self {
            password: REDACTED.to_string(),
            ..self.clone()
        }
    }
}
