//! Ngrok tunnel discovery and management for local webhook development.

use std::process::{Child, Command, Stdio};
use std::time::Duration;

use serde::Deserialize;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::config::DEFAULT_NGROK_API_URL;
use crate::error::{Result, TelegramError};

/// Timeout for a single tunnel status request.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Default number of attempts when waiting for a tunnel.
pub const DEFAULT_ATTEMPTS: u32 = 10;

/// Default delay between attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Time given to a freshly spawned ngrok before probing it.
const STARTUP_GRACE: Duration = Duration::from_secs(2);

/// Tunnel list returned by ngrok's local API.
#[derive(Debug, Default, Deserialize)]
pub struct TunnelList {
    #[serde(default)]
    pub tunnels: Vec<Tunnel>,
}

/// One tunnel entry.
#[derive(Debug, Deserialize)]
pub struct Tunnel {
    #[serde(default)]
    pub public_url: Option<String>,
    #[serde(default)]
    pub proto: Option<String>,
}

impl TunnelList {
    /// The first HTTPS public URL, if any.
    pub fn https_url(&self) -> Option<&str> {
        self.tunnels.iter().find_map(|tunnel| {
            let url = tunnel.public_url.as_deref()?;
            let is_https = tunnel.proto.as_deref() == Some("https") || url.starts_with("https://");
            is_https.then_some(url)
        })
    }
}

/// Reads the public URL from ngrok's local status API.
#[derive(Debug, Clone)]
pub struct TunnelProbe {
    http: reqwest::Client,
    api_url: String,
    attempts: u32,
    delay: Duration,
}

impl Default for TunnelProbe {
    fn default() -> Self {
        Self::new(DEFAULT_NGROK_API_URL)
    }
}

impl TunnelProbe {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: api_url.into(),
            attempts: DEFAULT_ATTEMPTS,
            delay: DEFAULT_RETRY_DELAY,
        }
    }

    /// Set how many times, and how far apart, [`wait_for_public_url`](Self::wait_for_public_url) polls.
    pub fn with_retry(mut self, attempts: u32, delay: Duration) -> Self {
        self.attempts = attempts.max(1);
        self.delay = delay;
        self
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Fetch the HTTPS public URL once.
    pub async fn fetch_public_url(&self) -> Result<String> {
        let response = self
            .http
            .get(&self.api_url)
            .timeout(PROBE_TIMEOUT)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TelegramError::NgrokError(format!(
                "tunnel API returned {}",
                response.status()
            )));
        }

        let list: TunnelList = response.json().await.map_err(|e| {
            TelegramError::NgrokError(format!("Failed to parse ngrok API: {}", e))
        })?;

        list.https_url()
            .map(str::to_string)
            .ok_or_else(|| TelegramError::NgrokError("No HTTPS tunnel found".to_string()))
    }

    /// Poll until a public URL appears or attempts run out.
    pub async fn wait_for_public_url(&self) -> Result<String> {
        let mut last_error = None;
        for attempt in 1..=self.attempts {
            debug!(attempt, max = self.attempts, "Fetching ngrok tunnel URL");
            match self.fetch_public_url().await {
                Ok(url) => {
                    info!(url = %url, "ngrok tunnel found");
                    return Ok(url);
                }
                Err(e) => {
                    debug!(error = %e, "ngrok tunnel not ready yet");
                    last_error = Some(e);
                }
            }
            if attempt < self.attempts {
                sleep(self.delay).await;
            }
        }

        Err(TelegramError::NgrokError(format!(
            "Could not get tunnel URL after {} attempts ({}). Is ngrok running?",
            self.attempts,
            last_error.map(|e| e.to_string()).unwrap_or_default()
        )))
    }

    /// Whether the status API answers at all.
    pub async fn health_check(&self) -> bool {
        match self.http.get(&self.api_url).timeout(PROBE_TIMEOUT).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

/// Manages an ngrok tunnel subprocess.
pub struct NgrokTunnel {
    /// The ngrok child process.
    process: Child,
    /// The public URL of the tunnel.
    public_url: String,
    /// The local port being tunneled.
    local_port: u16,
}

impl NgrokTunnel {
    /// Start a new ngrok tunnel to the specified local port and wait for its URL.
    ///
    /// Requires `ngrok` on PATH and the `NGROK_AUTHTOKEN` environment variable.
    pub async fn spawn(port: u16, probe: &TunnelProbe) -> Result<Self> {
        let ngrok_path = which::which("ngrok").map_err(|_| TelegramError::NgrokNotFound)?;
        debug!(path = %ngrok_path.display(), "ngrok found");

        if std::env::var("NGROK_AUTHTOKEN").is_err() {
            return Err(TelegramError::NgrokNoAuthToken);
        }

        info!(port, "Starting ngrok tunnel");
        let process = Command::new(&ngrok_path)
            .args(["http", &port.to_string(), "--log", "stdout"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| TelegramError::NgrokError(format!("Failed to start ngrok: {}", e)))?;

        let mut tunnel = Self {
            process,
            public_url: String::new(),
            local_port: port,
        };

        sleep(STARTUP_GRACE).await;

        // Dropping `tunnel` on error kills the child.
        tunnel.public_url = probe.wait_for_public_url().await?;
        info!(url = %tunnel.public_url, "ngrok tunnel established");
        Ok(tunnel)
    }

    /// Get the public URL of the tunnel.
    pub fn public_url(&self) -> &str {
        &self.public_url
    }

    /// Get the local port being tunneled.
    pub fn local_port(&self) -> u16 {
        self.local_port
    }

    /// Stop the ngrok tunnel.
    pub fn stop(&mut self) -> Result<()> {
        if let Ok(Some(_)) = self.process.try_wait() {
            return Ok(());
        }
        info!("Stopping ngrok tunnel");
        self.process
            .kill()
            .map_err(|e| TelegramError::NgrokError(format!("Failed to stop ngrok: {}", e)))?;
        if let Err(e) = self.process.wait() {
            warn!(error = %e, "Failed to reap ngrok process");
        }
        Ok(())
    }
}

impl Drop for NgrokTunnel {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            error!(error = %e, "Failed to stop ngrok on drop");
        }
    }
}
