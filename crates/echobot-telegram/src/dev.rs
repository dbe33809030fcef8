//! Local development webhook management.
//!
//! Points the bot's webhook at a tunnel for the lifetime of a dev server and
//! puts the previous registration back afterwards:
//!
//! 1. remember the currently registered webhook (or the one a crashed session
//!    left in the cache) and persist it before changing anything
//! 2. delete it and register the tunnel URL
//! 3. on shutdown, delete the tunnel webhook and restore the remembered one

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::RwLock;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::cache::WebhookCache;
use crate::client::TelegramClient;
use crate::error::{Result, TelegramError};
use crate::ngrok::TunnelProbe;

/// Pause between consecutive webhook changes.
const DEFAULT_STEP_DELAY: Duration = Duration::from_secs(1);

/// What the manager has changed on the platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WebhookState {
    /// Tunnel URL currently registered by us.
    pub tunnel_url: Option<String>,
    /// URL to restore on teardown.
    pub previous_url: Option<String>,
    /// Whether teardown has work to do.
    pub needs_cleanup: bool,
}

/// Shared handle to the manager's state, for status endpoints.
pub type SharedWebhookState = Arc<RwLock<WebhookState>>;

/// Registers the tunnel webhook and restores the previous one.
pub struct WebhookManager {
    client: TelegramClient,
    cache: WebhookCache,
    probe: TunnelProbe,
    state: SharedWebhookState,
    step_delay: Duration,
}

impl WebhookManager {
    pub fn new(client: TelegramClient, cache: WebhookCache, probe: TunnelProbe) -> Self {
        Self {
            client,
            cache,
            probe,
            state: Arc::new(RwLock::new(WebhookState::default())),
            step_delay: DEFAULT_STEP_DELAY,
        }
    }

    /// Override the pause between webhook changes.
    pub fn with_step_delay(mut self, delay: Duration) -> Self {
        self.step_delay = delay;
        self
    }

    /// Handle to the live state.
    pub fn state(&self) -> SharedWebhookState {
        Arc::clone(&self.state)
    }

    /// Snapshot of the current state.
    pub async fn snapshot(&self) -> WebhookState {
        self.state.read().await.clone()
    }

    /// Point the webhook at the tunnel. Returns the registered tunnel URL.
    ///
    /// On error the state may still need cleanup (the old webhook may already
    /// be deleted), so callers should run [`teardown`](Self::teardown).
    pub async fn setup(&self) -> Result<String> {
        info!("Configuring webhook for local development");

        let current = self
            .client
            .get_webhook_info()
            .await
            .map(|info| info.url)
            .filter(|url| !url.is_empty());

        let previous = self.resolve_previous(current.as_deref());
        if let Some(url) = &previous {
            info!(url = %url, "Webhook will be restored on shutdown");
        }
        {
            let mut state = self.state.write().await;
            state.previous_url = previous.clone();
            state.needs_cleanup = true;
        }

        // Persist before touching the platform so an interrupted session can
        // still be recovered on the next run.
        if let Err(e) = self.cache.save(previous.as_deref(), None) {
            warn!(path = %self.cache.path().display(), error = %e, "Failed to save webhook cache");
        }

        if let Some(url) = &current {
            info!(url = %url, "Deleting current webhook");
            if !self.client.delete_webhook().await {
                warn!(url = %url, "Failed to delete current webhook");
            }
            sleep(self.step_delay).await;
        }

        info!(api = %self.probe.api_url(), "Waiting for tunnel");
        let tunnel_url = self.probe.wait_for_public_url().await?;

        // Recorded first: if the call is cut short the tunnel may still be live.
        self.state.write().await.tunnel_url = Some(tunnel_url.clone());
        if !self.client.set_webhook(&tunnel_url).await {
            return Err(TelegramError::WebhookFailed(tunnel_url));
        }

        if let Err(e) = self.cache.save(previous.as_deref(), Some(&tunnel_url)) {
            warn!(path = %self.cache.path().display(), error = %e, "Failed to save webhook cache");
        }

        info!(
            tunnel = %tunnel_url,
            previous = previous.as_deref().unwrap_or("none"),
            "Webhook setup complete"
        );
        Ok(tunnel_url)
    }

    /// Decide which webhook teardown should put back.
    ///
    /// The registered URL wins unless it is the tunnel an unfinished session
    /// recorded in the cache. With nothing registered, the cached URL is used.
    fn resolve_previous(&self, current: Option<&str>) -> Option<String> {
        let cached = self.cache.load();
        let previous = match (current, cached) {
            (Some(url), Some(cached)) if cached.tunnel_url.as_deref() == Some(url) => {
                info!(stale = %url, "Registered webhook is a tunnel from an unfinished session");
                cached.url
            }
            (Some(url), _) => Some(url.to_string()),
            (None, Some(cached)) => {
                info!(url = ?cached.url, "Found cache from an unfinished session");
                cached.url
            }
            (None, None) => None,
        };
        previous.filter(|url| !url.is_empty())
    }

    /// Undo [`setup`](Self::setup). Best-effort and idempotent.
    pub async fn teardown(&self) {
        let snapshot = {
            let state = self.state.read().await;
            if !state.needs_cleanup {
                debug!("No webhook cleanup needed");
                return;
            }
            state.clone()
        };

        info!("Cleaning up webhook");
        if snapshot.tunnel_url.is_some() {
            if !self.client.delete_webhook().await {
                warn!("Failed to delete tunnel webhook");
            }
            sleep(self.step_delay).await;
        }

        if let Some(previous) = &snapshot.previous_url {
            if self.client.set_webhook(previous).await {
                info!(url = %previous, "Previous webhook restored");
            } else {
                warn!(url = %previous, "Failed to restore previous webhook");
            }
        }

        if let Err(e) = self.cache.clear() {
            warn!(path = %self.cache.path().display(), error = %e, "Failed to clear webhook cache");
        }

        let mut state = self.state.write().await;
        state.tunnel_url = None;
        state.needs_cleanup = false;
        info!("Webhook cleanup complete");
    }

    /// Run `serve` between setup and teardown.
    ///
    /// Setup is raced against `shutdown`; if the signal wins, setup is
    /// abandoned and [`TelegramError::SetupInterrupted`] is returned. Teardown
    /// runs on every path: interrupted setup, failed setup, and after `serve`
    /// returns.
    pub async fn run<S, F, Fut, T>(&self, shutdown: S, serve: F) -> Result<T>
    where
        S: Future<Output = ()>,
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = T>,
    {
        let setup = tokio::select! {
            result = self.setup() => result,
            _ = shutdown => {
                warn!("Shutdown requested during webhook setup");
                Err(TelegramError::SetupInterrupted)
            }
        };

        let tunnel_url = match setup {
            Ok(url) => url,
            Err(e) => {
                self.teardown().await;
                return Err(e);
            }
        };

        let output = serve(tunnel_url).await;
        self.teardown().await;
        Ok(output)
    }
}

impl Drop for WebhookManager {
    fn drop(&mut self) {
        if let Ok(state) = self.state.try_read() {
            if state.needs_cleanup {
                warn!(
                    previous = ?state.previous_url,
                    "Webhook manager dropped without teardown; the cached URL will be restored next run"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::{tempdir, TempDir};
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PROD_URL: &str = "https://prod.example.com/hook";
    const TUNNEL_URL: &str = "https://dev-tunnel.ngrok.app";

    struct Fixture {
        telegram: MockServer,
        ngrok: MockServer,
        dir: TempDir,
    }

    impl Fixture {
        async fn new() -> Self {
            Self {
                telegram: MockServer::start().await,
                ngrok: MockServer::start().await,
                dir: tempdir().unwrap(),
            }
        }

        fn cache(&self) -> WebhookCache {
            WebhookCache::new(self.dir.path().join("webhook_cache.json"))
        }

        fn manager(&self) -> WebhookManager {
            self.manager_with_retry(2, Duration::from_millis(1))
        }

        fn manager_with_retry(&self, attempts: u32, delay: Duration) -> WebhookManager {
            WebhookManager::new(
                TelegramClient::new("tok", &self.telegram.uri()),
                self.cache(),
                TunnelProbe::new(format!("{}/api/tunnels", self.ngrok.uri())).with_retry(attempts, delay),
            )
            .with_step_delay(Duration::ZERO)
        }

        async fn tunnel_missing(&self) {
            Mock::given(method("GET"))
                .and(path("/api/tunnels"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({"tunnels": []})))
                .mount(&self.ngrok)
                .await;
        }

        async fn current_webhook(&self, url: &str) {
            Mock::given(method("GET"))
                .and(path("/bottok/getWebhookInfo"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "ok": true,
                    "result": {"url": url, "has_custom_certificate": false, "pending_update_count": 0}
                })))
                .mount(&self.telegram)
                .await;
        }

        async fn tunnel_ready(&self) {
            Mock::given(method("GET"))
                .and(path("/api/tunnels"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "tunnels": [{"proto": "https", "public_url": TUNNEL_URL}]
                })))
                .mount(&self.ngrok)
                .await;
        }

        async fn expect_set(&self, url: &str, times: u64) {
            Mock::given(method("POST"))
                .and(path("/bottok/setWebhook"))
                .and(body_json(json!({"url": url})))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": true})))
                .expect(times)
                .mount(&self.telegram)
                .await;
        }

        async fn expect_delete(&self, times: u64) {
            Mock::given(method("POST"))
                .and(path("/bottok/deleteWebhook"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": true})))
                .expect(times)
                .mount(&self.telegram)
                .await;
        }
    }

    #[tokio::test]
    async fn test_setup_and_teardown_restore_previous_webhook() {
        let fx = Fixture::new().await;
        fx.current_webhook(PROD_URL).await;
        fx.tunnel_ready().await;
        fx.expect_set(TUNNEL_URL, 1).await;
        fx.expect_set(PROD_URL, 1).await;
        fx.expect_delete(2).await;

        let manager = fx.manager();
        let url = manager.setup().await.unwrap();
        assert_eq!(url, TUNNEL_URL);

        let state = manager.snapshot().await;
        assert_eq!(state.tunnel_url.as_deref(), Some(TUNNEL_URL));
        assert_eq!(state.previous_url.as_deref(), Some(PROD_URL));
        assert!(state.needs_cleanup);
        assert_eq!(fx.cache().load().unwrap().url.as_deref(), Some(PROD_URL));

        manager.teardown().await;
        let state = manager.snapshot().await;
        assert!(!state.needs_cleanup);
        assert!(state.tunnel_url.is_none());
        assert!(fx.cache().load().is_none());

        // Second teardown is a no-op; mock expectations would catch extra calls.
        manager.teardown().await;
    }

    #[tokio::test]
    async fn test_no_previous_webhook_nothing_restored() {
        let fx = Fixture::new().await;
        fx.current_webhook("").await;
        fx.tunnel_ready().await;
        fx.expect_set(TUNNEL_URL, 1).await;
        fx.expect_delete(1).await;

        let manager = fx.manager();
        manager.setup().await.unwrap();
        assert_eq!(manager.snapshot().await.previous_url, None);
        manager.teardown().await;
    }

    #[tokio::test]
    async fn test_leftover_cache_wins_over_stale_tunnel() {
        let fx = Fixture::new().await;
        fx.cache().save(Some(PROD_URL), Some("https://stale.ngrok.app")).unwrap();
        fx.current_webhook("https://stale.ngrok.app").await;
        fx.tunnel_ready().await;
        fx.expect_set(TUNNEL_URL, 1).await;
        fx.expect_set(PROD_URL, 1).await;
        fx.expect_delete(2).await;

        let manager = fx.manager();
        manager.setup().await.unwrap();
        assert_eq!(manager.snapshot().await.previous_url.as_deref(), Some(PROD_URL));
        manager.teardown().await;
    }

    #[tokio::test]
    async fn test_run_restores_when_tunnel_missing() {
        let fx = Fixture::new().await;
        fx.current_webhook(PROD_URL).await;
        fx.tunnel_missing().await;
        // Old webhook deleted during setup, restored by teardown.
        fx.expect_delete(1).await;
        fx.expect_set(PROD_URL, 1).await;

        let manager = fx.manager();
        let result = manager
            .run(std::future::pending(), |_| async { "served" })
            .await;
        assert!(matches!(result, Err(TelegramError::NgrokError(_))));
        assert!(!manager.snapshot().await.needs_cleanup);
        assert!(fx.cache().load().is_none());
    }

    #[tokio::test]
    async fn test_run_tears_down_after_serve() {
        let fx = Fixture::new().await;
        fx.current_webhook(PROD_URL).await;
        fx.tunnel_ready().await;
        fx.expect_set(TUNNEL_URL, 1).await;
        fx.expect_set(PROD_URL, 1).await;
        fx.expect_delete(2).await;

        let manager = fx.manager();
        let state = manager.state();
        let output = manager
            .run(std::future::pending(), |url| async move {
                assert!(state.read().await.needs_cleanup);
                url
            })
            .await
            .unwrap();
        assert_eq!(output, TUNNEL_URL);
        assert!(!manager.snapshot().await.needs_cleanup);
    }

    #[tokio::test]
    async fn test_unreadable_webhook_info_still_sets_up() {
        let fx = Fixture::new().await;
        Mock::given(method("GET"))
            .and(path("/bottok/getWebhookInfo"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&fx.telegram)
            .await;
        fx.tunnel_ready().await;
        fx.expect_set(TUNNEL_URL, 1).await;
        fx.expect_delete(1).await;

        let manager = fx.manager();
        manager.setup().await.unwrap();
        manager.teardown().await;
    }

    #[tokio::test]
    async fn test_set_webhook_failure_is_error() {
        let fx = Fixture::new().await;
        fx.current_webhook("").await;
        fx.tunnel_ready().await;
        Mock::given(method("POST"))
            .and(path("/bottok/setWebhook"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({"ok": false})))
            .mount(&fx.telegram)
            .await;

        let result = fx.manager().setup().await;
        assert!(matches!(result, Err(TelegramError::WebhookFailed(_))));
    }

    #[tokio::test]
    async fn test_registered_webhook_wins_over_empty_cache() {
        let fx = Fixture::new().await;
        fx.cache().save(None, None).unwrap();
        fx.current_webhook(PROD_URL).await;
        fx.tunnel_ready().await;
        fx.expect_set(TUNNEL_URL, 1).await;
        fx.expect_set(PROD_URL, 1).await;
        fx.expect_delete(2).await;

        let manager = fx.manager();
        manager.setup().await.unwrap();
        assert_eq!(manager.snapshot().await.previous_url.as_deref(), Some(PROD_URL));
        manager.teardown().await;
    }

    #[tokio::test]
    async fn test_registered_webhook_wins_over_other_cached_url() {
        let fx = Fixture::new().await;
        fx.cache()
            .save(Some("https://old.example.com/hook"), Some("https://stale.ngrok.app"))
            .unwrap();
        fx.current_webhook(PROD_URL).await;
        fx.tunnel_ready().await;
        fx.expect_set(TUNNEL_URL, 1).await;
        fx.expect_set(PROD_URL, 1).await;
        fx.expect_delete(2).await;

        let manager = fx.manager();
        manager.setup().await.unwrap();
        assert_eq!(manager.snapshot().await.previous_url.as_deref(), Some(PROD_URL));
        manager.teardown().await;
    }

    #[tokio::test]
    async fn test_cached_url_restored_when_nothing_registered() {
        let fx = Fixture::new().await;
        fx.cache().save(Some(PROD_URL), None).unwrap();
        fx.current_webhook("").await;
        fx.tunnel_ready().await;
        fx.expect_set(TUNNEL_URL, 1).await;
        fx.expect_set(PROD_URL, 1).await;
        fx.expect_delete(1).await;

        let manager = fx.manager();
        manager.setup().await.unwrap();
        assert_eq!(manager.snapshot().await.previous_url.as_deref(), Some(PROD_URL));
        manager.teardown().await;
    }

    #[tokio::test]
    async fn test_cache_written_before_webhook_deleted() {
        let fx = Fixture::new().await;
        fx.current_webhook(PROD_URL).await;
        fx.tunnel_missing().await;
        fx.expect_delete(1).await;

        // Setup is abandoned while it waits for the tunnel, after the
        // registered webhook has already been deleted.
        let manager = fx.manager_with_retry(1000, Duration::from_millis(10));
        let result = tokio::time::timeout(Duration::from_millis(100), manager.setup()).await;
        assert!(result.is_err());

        let cached = fx.cache().load().unwrap();
        assert_eq!(cached.url.as_deref(), Some(PROD_URL));
        assert_eq!(cached.tunnel_url, None);
    }

    #[tokio::test]
    async fn test_run_shutdown_during_setup_restores_webhook() {
        let fx = Fixture::new().await;
        fx.current_webhook(PROD_URL).await;
        fx.tunnel_missing().await;
        fx.expect_delete(1).await;
        fx.expect_set(PROD_URL, 1).await;

        let manager = fx.manager_with_retry(1000, Duration::from_millis(10));
        let result = manager
            .run(sleep(Duration::from_millis(100)), |_| async { "served" })
            .await;
        assert!(matches!(result, Err(TelegramError::SetupInterrupted)));

        let state = manager.snapshot().await;
        assert!(!state.needs_cleanup);
        assert!(fx.cache().load().is_none());
    }

    #[tokio::test]
    async fn test_teardown_releases_state_lock_during_network_calls() {
        let fx = Fixture::new().await;
        fx.current_webhook(PROD_URL).await;
        fx.tunnel_ready().await;
        fx.expect_set(TUNNEL_URL, 1).await;
        fx.expect_delete(2).await;
        Mock::given(method("POST"))
            .and(path("/bottok/setWebhook"))
            .and(body_json(json!({"url": PROD_URL})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"ok": true, "result": true}))
                    .set_delay(Duration::from_millis(200)),
            )
            .expect(1)
            .mount(&fx.telegram)
            .await;

        let manager = fx.manager();
        manager.setup().await.unwrap();

        let state = manager.state();
        let reader = async {
            sleep(Duration::from_millis(50)).await;
            // The restore call is still in flight; status reads must not block.
            let read = tokio::time::timeout(Duration::from_millis(50), state.read()).await;
            assert!(read.is_ok());
        };
        tokio::join!(manager.teardown(), reader);
        assert!(!manager.snapshot().await.needs_cleanup);
    }
}
