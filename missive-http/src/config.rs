//! HTTP server configuration

use std::time::Duration;

use serde::Deserialize;

use crate::OriginPattern;

/// Configuration for the public HTTP endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Address to bind the server to
    ///
    /// Common values:
    /// - `0.0.0.0:3000` (IPv4 any address, port 3000)
    /// - `[::]:3000` (IPv6 any address, port 3000)
    /// - `127.0.0.1:3000` (localhost only, behind a reverse proxy)
    #[serde(default = "default_listen_address")]
    pub listen_address: String,

    /// Upper bound on handling a single request
    ///
    /// Keep this above the mail dispatch timeout, otherwise a slow relay
    /// surfaces as a bare 408 instead of the JSON error body.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub cors: CorsConfig,
}

impl HttpConfig {
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Cross-origin admission settings
#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    /// Origins that are always admitted
    ///
    /// Each entry is either an exact origin (`https://example.github.io`) or a
    /// host pattern with a port wildcard (`http://localhost:*`) or port range
    /// (`http://localhost:5500-5599`).
    #[serde(default = "default_trusted_origins")]
    pub trusted_origins: Vec<String>,

    /// Additional exact origins, usually supplied via `ALLOWED_ORIGINS`
    #[serde(default)]
    pub extra_origins: Vec<String>,

    /// Request headers a cross-origin caller may send
    #[serde(default = "default_allow_headers")]
    pub allow_headers: Vec<String>,

    /// How long a browser may cache a preflight answer
    #[serde(default = "default_max_age_secs")]
    pub max_age_secs: u64,
}

fn default_listen_address() -> String {
    "0.0.0.0:3000".to_string()
}

const fn default_request_timeout_secs() -> u64 {
    60
}

fn default_trusted_origins() -> Vec<String> {
    OriginPattern::loopback()
        .iter()
        .map(ToString::to_string)
        .collect()
}

fn default_allow_headers() -> Vec<String> {
    vec!["Content-Type".to_string()]
}

const fn default_max_age_secs() -> u64 {
    86400
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
            request_timeout_secs: default_request_timeout_secs(),
            cors: CorsConfig::default(),
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            trusted_origins: default_trusted_origins(),
            extra_origins: Vec::new(),
            allow_headers: default_allow_headers(),
            max_age_secs: default_max_age_secs(),
        }
    }
}
