//! Backend address and request timeouts.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{BackendError, Endpoint};

/// Environment variable overriding [`ConnectionConfig::host`].
pub const HOST_ENV: &str = "DOORWAY_HOST";

/// Environment variable overriding [`ConnectionConfig::port`].
pub const PORT_ENV: &str = "DOORWAY_PORT";

// ---------------------------------------------------------------------------
// ConnectionConfig
// ---------------------------------------------------------------------------

/// Where the counter backend lives.
///
/// Host and port are kept as the strings the user typed into the
/// configuration form; [`validate`](Self::validate) decides whether they
/// form a usable `http://{host}:{port}` base URL. Nothing here touches
/// the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// IP address or hostname, without scheme or path.
    pub host: String,
    /// Decimal TCP port.
    pub port: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "192.168.7.149".to_string(),
            port: "5000".to_string(),
        }
    }
}

impl ConnectionConfig {
    /// Creates a config from a host and port.
    pub fn new(host: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: port.into(),
        }
    }

    /// Defaults, overridden by `DOORWAY_HOST` / `DOORWAY_PORT` when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(host) = std::env::var(HOST_ENV) {
            config.host = host;
        }
        if let Ok(port) = std::env::var(PORT_ENV) {
            config.port = port;
        }
        config
    }

    /// Checks that host and port are ASCII-safe and form a valid URL.
    ///
    /// # Errors
    /// Returns [`BackendError::InvalidAddress`] describing the first
    /// problem found.
    pub fn validate(&self) -> Result<(), BackendError> {
        let host = self.host.trim();
        if host.is_empty() {
            return Err(BackendError::InvalidAddress("host is empty".into()));
        }
        if let Some(bad) = host
            .chars()
            .find(|c| !c.is_ascii() || c.is_ascii_whitespace() || c.is_ascii_control())
        {
            return Err(BackendError::InvalidAddress(format!(
                "host contains unsupported character {bad:?}"
            )));
        }
        if let Some(bad) = host.chars().find(|c| matches!(c, '/' | '?' | '#' | '@' | '\\' | ':')) {
            return Err(BackendError::InvalidAddress(format!(
                "host must not contain {bad:?}; enter the scheme-less host only"
            )));
        }
        // Code points a URL parser refuses in a host.
        if let Some(bad) = host
            .chars()
            .find(|c| matches!(c, '<' | '>' | '^' | '|' | '%' | '[' | ']'))
        {
            return Err(BackendError::InvalidAddress(format!(
                "host contains {bad:?}, which a URL host cannot hold"
            )));
        }

        match self.port.trim().parse::<u16>() {
            Ok(0) | Err(_) => Err(BackendError::InvalidAddress(format!(
                "port {:?} is not a number between 1 and 65535",
                self.port
            ))),
            Ok(_) => Ok(()),
        }
    }

    /// The base URL, `http://{host}:{port}`, without validation.
    ///
    /// Used for display ("current connection: ..."); request URLs go
    /// through [`endpoint_url`](Self::endpoint_url).
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host.trim(), self.port.trim())
    }

    /// The full URL for `endpoint`.
    ///
    /// # Errors
    /// Returns [`BackendError::InvalidAddress`] if the config is invalid.
    pub fn endpoint_url(&self, endpoint: Endpoint) -> Result<String, BackendError> {
        self.validate()?;
        Ok(format!("{}{}", self.base_url(), endpoint.path()))
    }
}

// ---------------------------------------------------------------------------
// RequestTimeouts
// ---------------------------------------------------------------------------

/// Per-endpoint request timeouts.
///
/// Resets get a generous budget since they gate a step transition; polls
/// are short because a new one is issued every second anyway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestTimeouts {
    /// `POST /reset_counter`. Default: 10 s.
    pub reset: Duration,
    /// `GET /get_counter` while polling. Default: 5 s.
    pub poll: Duration,
    /// `GET /get_total_reps`. Default: 5 s.
    pub totals: Duration,
    /// `GET /get_counter` from the "test connection" action. Default: 10 s.
    pub probe: Duration,
    /// `GET /` status check. Default: 5 s.
    pub status: Duration,
}

impl Default for RequestTimeouts {
    fn default() -> Self {
        Self {
            reset: Duration::from_secs(10),
            poll: Duration::from_secs(5),
            totals: Duration::from_secs(5),
            probe: Duration::from_secs(10),
            status: Duration::from_secs(5),
        }
    }
}

impl RequestTimeouts {
    /// Smallest timeout accepted by [`validated`](Self::validated).
    pub const MIN: Duration = Duration::from_millis(100);

    /// Raises any timeout below [`Self::MIN`] to the minimum.
    pub fn validated(mut self) -> Self {
        for timeout in [
            &mut self.reset,
            &mut self.poll,
            &mut self.totals,
            &mut self.probe,
            &mut self.status,
        ] {
            if *timeout < Self::MIN {
                tracing::warn!(?timeout, min = ?Self::MIN, "request timeout too small, raising");
                *timeout = Self::MIN;
            }
        }
        self
    }
}
