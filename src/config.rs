//! Configuration constants and client settings.

use std::time::Duration;

use crate::error::{Error, Result};

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.staysign.io/v1";

/// Connect timeout for HTTP requests.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout for a whole request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default interval between device heartbeats.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(60);

/// Environment variable overriding the base URL.
pub const ENV_BASE_URL: &str = "STAYSIGN_API_URL";

/// Environment variable overriding the request timeout, in seconds.
pub const ENV_TIMEOUT_SECS: &str = "STAYSIGN_TIMEOUT_SECS";

/// Environment variable overriding the heartbeat interval, in seconds.
pub const ENV_HEARTBEAT_SECS: &str = "STAYSIGN_HEARTBEAT_SECS";

/// API endpoint paths, relative to the base URL.
pub mod endpoints {
    pub const REFRESH: &str = "/auth/refresh";
    pub const LOGIN: &str = "/auth/login";
    pub const REGISTER: &str = "/auth/register";
    pub const LOGOUT: &str = "/auth/logout";
    pub const DEVICE_REGISTER: &str = "/devices/register";
    pub const DEVICE_INFO: &str = "/devices/me";
    pub const DEVICE_HEARTBEAT: &str = "/devices/heartbeat";
}

/// Client settings.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API base URL, without a trailing slash.
    pub base_url: String,
    /// Timeout for a whole request.
    pub request_timeout: Duration,
    /// TCP connect timeout.
    pub connect_timeout: Duration,
    /// `User-Agent` sent with every request.
    pub user_agent: String,
    /// Default interval for [`crate::StaysignClient::start_heartbeat`].
    pub heartbeat_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: REQUEST_TIMEOUT,
            connect_timeout: CONNECT_TIMEOUT,
            user_agent: concat!("staysign-rust/", env!("CARGO_PKG_VERSION")).to_string(),
            heartbeat_interval: HEARTBEAT_INTERVAL,
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `STAYSIGN_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(url) = std::env::var(ENV_BASE_URL) {
            config.base_url = url;
        }
        if let Some(secs) = env_secs(ENV_TIMEOUT_SECS)? {
            config.request_timeout = secs;
        }
        if let Some(secs) = env_secs(ENV_HEARTBEAT_SECS)? {
            config.heartbeat_interval = secs;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check the base URL parses as http(s) and normalise it.
    pub fn validate(&mut self) -> Result<()> {
        let parsed = url::Url::parse(&self.base_url)
            .map_err(|e| Error::Config(format!("Invalid base URL '{}': {}", self.base_url, e)))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "Unsupported base URL scheme '{}' (expected http or https)",
                parsed.scheme()
            )));
        }

        self.base_url = self.base_url.trim_end_matches('/').to_string();
        Ok(())
    }

    /// Join an endpoint path onto the base URL. Absolute URLs are treated as
    /// paths too; requests never leave the configured host.
    pub fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }
}

fn env_secs(name: &str) -> Result<Option<Duration>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(|secs| Some(Duration::from_secs(secs)))
            .map_err(|_| Error::Config(format!("{name} must be a whole number of seconds, got '{raw}'"))),
        Err(_) => Ok(None),
    }
}
