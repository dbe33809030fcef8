//! Process configuration read once at startup.

use std::fmt;

use echobot_core::config::{env_non_empty, parse_http_url};
use tracing::warn;

use crate::error::{Result, TelegramError};

/// Default Telegram Bot API base URL.
pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// Default webhook server host.
pub const DEFAULT_WEBHOOK_HOST: &str = "0.0.0.0";

/// Default webhook server port.
pub const DEFAULT_WEBHOOK_PORT: u16 = 7172;

/// Default ngrok local API endpoint.
pub const DEFAULT_NGROK_API_URL: &str = "http://127.0.0.1:4040/api/tunnels";

/// Platform credentials plus the optional error-reporting channel.
#[derive(Clone)]
pub struct BotConfig {
    /// Bot token from @BotFather.
    pub token: String,
    /// Bot API base URL, without trailing slash.
    pub api_url: String,
    /// Where error reports go, if configured.
    pub reporter: Option<ReporterConfig>,
}

/// Credentials of the separate error-reporting bot.
#[derive(Clone, PartialEq, Eq)]
pub struct ReporterConfig {
    pub token: String,
    pub chat_id: i64,
}

impl BotConfig {
    /// Create a config for the given token against the public Bot API.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            api_url: DEFAULT_API_URL.to_string(),
            reporter: None,
        }
    }

    /// Load from the process environment.
    ///
    /// Reads `TELEGRAM_BOT_TOKEN` (or `BOT_TOKEN`), `TELEGRAM_API_URL`,
    /// `BUG_HUNTER_BOT_TOKEN` and `BUG_HUNTER_CHAT_ID`.
    pub fn from_env() -> Result<Self> {
        let token = env_non_empty("TELEGRAM_BOT_TOKEN")
            .or_else(|| env_non_empty("BOT_TOKEN"))
            .ok_or(TelegramError::NoToken)?;

        let mut config = Self::new(token);
        if let Some(api_url) = env_non_empty("TELEGRAM_API_URL") {
            config = config.with_api_url(&api_url)?;
        }

        config.reporter = ReporterConfig::from_parts(
            env_non_empty("BUG_HUNTER_BOT_TOKEN"),
            env_non_empty("BUG_HUNTER_CHAT_ID"),
        );
        Ok(config)
    }

    /// Point the client at another Bot API server.
    pub fn with_api_url(mut self, api_url: &str) -> Result<Self> {
        parse_http_url(api_url).map_err(TelegramError::InvalidConfig)?;
        self.api_url = api_url.trim_end_matches('/').to_string();
        Ok(self)
    }

    /// Enable error reporting.
    pub fn with_reporter(mut self, reporter: ReporterConfig) -> Self {
        self.reporter = Some(reporter);
        self
    }
}

impl ReporterConfig {
    /// Build from raw values. Both must be present; the chat id must be numeric.
    pub fn from_parts(token: Option<String>, chat_id: Option<String>) -> Option<Self> {
        let (token, chat_id) = (token?, chat_id?);
        match chat_id.parse::<i64>() {
            Ok(chat_id) => Some(Self { token, chat_id }),
            Err(_) => {
                warn!(chat_id = %chat_id, "BUG_HUNTER_CHAT_ID is not numeric, error reporting disabled");
                None
            }
        }
    }
}

/// Hide all but the first and last few characters of a token.
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}***{}", head, tail)
}

impl fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotConfig")
            .field("token", &mask_token(&self.token))
            .field("api_url", &self.api_url)
            .field("reporter", &self.reporter)
            .finish()
    }
}

impl fmt::Debug for ReporterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReporterConfig")
            .field("token", &mask_token(&self.token))
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_uses_public_api() {
        let config = BotConfig::new("123:abc");
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert!(config.reporter.is_none());
    }

    #[test]
    fn test_with_api_url_trims_slash() {
        let config = BotConfig::new("t")
            .with_api_url("http://127.0.0.1:9000/")
            .unwrap();
        assert_eq!(config.api_url, "http://127.0.0.1:9000");
    }

    #[test]
    fn test_with_api_url_rejects_garbage() {
        let result = BotConfig::new("t").with_api_url("telegram");
        assert!(matches!(result, Err(TelegramError::InvalidConfig(_))));
    }

    #[test]
    fn test_reporter_requires_both_parts() {
        assert_eq!(ReporterConfig::from_parts(None, Some("1".into())), None);
        assert_eq!(ReporterConfig::from_parts(Some("t".into()), None), None);
        assert_eq!(
            ReporterConfig::from_parts(Some("t".into()), Some("-987654321".into())),
            Some(ReporterConfig {
                token: "t".into(),
                chat_id: -987654321
            })
        );
    }

    #[test]
    fn test_reporter_rejects_non_numeric_chat() {
        assert_eq!(
            ReporterConfig::from_parts(Some("t".into()), Some("@channel".into())),
            None
        );
    }

    #[test]
    fn test_mask_token() {
        assert_eq!(mask_token("short"), "*****");
        assert_eq!(
            mask_token("123456:ABC-DEF1234ghIkl-zyx57W2v1u123ew11"),
            "1234***ew11"
        );
    }

    #[test]
    fn test_debug_does_not_leak_token() {
        let config = BotConfig::new("123456:ABC-DEF1234ghIkl-zyx57W2v1u123ew11");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("ABC-DEF1234ghIkl"));
    }
}
