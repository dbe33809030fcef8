//! On-disk record of the webhook to restore after a dev session.
//!
//! Written before the current webhook is deleted and removed on clean
//! teardown, so a surviving file means the last session did not restore.
//! Once the tunnel is registered its URL is recorded too, which lets the
//! next session recognise a stale tunnel left behind by a crash.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Contents of the cache file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedWebhook {
    /// The webhook URL registered before the dev session, if there was one.
    pub url: Option<String>,
    /// Tunnel URL the session registered, once it got that far.
    #[serde(default)]
    pub tunnel_url: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// The cache file.
#[derive(Debug, Clone)]
pub struct WebhookCache {
    path: PathBuf,
}

impl WebhookCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Cache in the Echobot state directory.
    pub fn default_location() -> Self {
        Self::new(echobot_core::config::webhook_cache_file())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the cache. Missing or unreadable files yield `None`.
    pub fn load(&self) -> Option<CachedWebhook> {
        if !self.path.exists() {
            return None;
        }

        match fs::read_to_string(&self.path) {
            Ok(content) => match serde_json::from_str::<CachedWebhook>(&content) {
                Ok(cached) => {
                    info!(url = ?cached.url, "Loaded cached webhook");
                    Some(cached)
                }
                Err(e) => {
                    warn!(path = %self.path.display(), error = %e, "Failed to parse webhook cache");
                    None
                }
            },
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read webhook cache");
                None
            }
        }
    }

    /// Remember `url` as the webhook to restore, and `tunnel_url` as the one
    /// this session registered.
    pub fn save(&self, url: Option<&str>, tunnel_url: Option<&str>) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let cached = CachedWebhook {
            url: url.map(str::to_string),
            tunnel_url: tunnel_url.map(str::to_string),
            timestamp: Utc::now(),
        };
        let content = serde_json::to_string_pretty(&cached)?;
        fs::write(&self.path, content)?;
        debug!(path = %self.path.display(), url = ?url, tunnel = ?tunnel_url, "Saved webhook cache");
        Ok(())
    }

    /// Remove the cache file if present.
    pub fn clear(&self) -> std::io::Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "Webhook cache cleared");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_missing_is_none() {
        let dir = tempdir().unwrap();
        let cache = WebhookCache::new(dir.path().join("webhook_cache.json"));
        assert!(cache.load().is_none());
    }

    #[test]
    fn test_save_load_clear() {
        let dir = tempdir().unwrap();
        let cache = WebhookCache::new(dir.path().join("nested").join("webhook_cache.json"));

        cache
            .save(Some("https://prod.example.com/hook"), Some("https://dev.ngrok.app"))
            .unwrap();
        let loaded = cache.load().unwrap();
        assert_eq!(loaded.url.as_deref(), Some("https://prod.example.com/hook"));
        assert_eq!(loaded.tunnel_url.as_deref(), Some("https://dev.ngrok.app"));

        cache.clear().unwrap();
        assert!(!cache.path().exists());
        // Clearing twice is fine.
        cache.clear().unwrap();
    }

    #[test]
    fn test_save_without_previous_url() {
        let dir = tempdir().unwrap();
        let cache = WebhookCache::new(dir.path().join("webhook_cache.json"));
        cache.save(None, None).unwrap();
        let loaded = cache.load().unwrap();
        assert_eq!(loaded.url, None);
        assert_eq!(loaded.tunnel_url, None);
    }

    #[test]
    fn test_cache_without_tunnel_field_loads() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("webhook_cache.json");
        fs::write(
            &path,
            r#"{"url": "https://prod.example.com/hook", "timestamp": "2026-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        let loaded = WebhookCache::new(path).load().unwrap();
        assert_eq!(loaded.url.as_deref(), Some("https://prod.example.com/hook"));
        assert_eq!(loaded.tunnel_url, None);
    }

    #[test]
    fn test_corrupt_cache_is_none() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("webhook_cache.json");
        fs::write(&path, "{not json").unwrap();
        assert!(WebhookCache::new(path).load().is_none());
    }
}
