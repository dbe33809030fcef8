//! Simulator configuration.

use std::time::Duration;

/// Default simulator host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default simulator port.
pub const DEFAULT_PORT: u16 = 8000;

/// Timeout for forwarding an update to the remote webhook.
pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(30);

/// Simulator server configuration.
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to bind to.
    pub port: u16,
    /// Deployed webhook that remote mode forwards to.
    pub remote_url: Option<String>,
    /// How long to wait for the remote webhook.
    pub remote_timeout: Duration,
}

impl SimulatorConfig {
    /// Creates a configuration with the given host and port.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    /// Sets the remote webhook URL. Blank values leave remote mode unconfigured.
    pub fn with_remote_url(mut self, url: Option<String>) -> Self {
        self.remote_url = url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());
        self
    }

    pub fn with_remote_timeout(mut self, timeout: Duration) -> Self {
        self.remote_timeout = timeout;
        self
    }

    /// Returns the bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            remote_url: None,
            remote_timeout: DEFAULT_REMOTE_TIMEOUT,
        }
    }
}
