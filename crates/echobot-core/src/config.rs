//! Shared configuration for Echobot.
//!
//! Locates the state directory and loads `.env` files.
//!
//! # Environment Variables
//!
//! - `ECHOBOT_STATE_DIR`: Override the state directory (default `~/.echobot`)

use std::path::PathBuf;

use tracing::debug;

/// Environment variable for custom state directory.
pub const STATE_DIR_ENV: &str = "ECHOBOT_STATE_DIR";

/// Default state directory name under home.
const DEFAULT_STATE_DIR: &str = ".echobot";

/// Webhook cache file name.
const WEBHOOK_CACHE_FILE: &str = "webhook_cache.json";

/// Get the Echobot state directory.
///
/// The state directory is determined by:
/// 1. `ECHOBOT_STATE_DIR` environment variable if set
/// 2. `~/.echobot` if home directory is available
/// 3. `.echobot` in current directory as fallback
pub fn state_dir() -> PathBuf {
    std::env::var(STATE_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(DEFAULT_STATE_DIR))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR))
        })
}

/// Path of the file remembering the webhook to restore after a dev session.
pub fn webhook_cache_file() -> PathBuf {
    state_dir().join(WEBHOOK_CACHE_FILE)
}

/// Ensure the state directory exists.
pub fn ensure_state_dir() -> std::io::Result<PathBuf> {
    let dir = state_dir();
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Load `.env.local`, falling back to `.env`. Missing files are fine.
pub fn load_dotenv() {
    match dotenvy::from_filename(".env.local").or_else(|_| dotenvy::dotenv()) {
        Ok(path) => debug!(path = %path.display(), "Loaded environment file"),
        Err(e) => debug!(error = %e, "No environment file loaded"),
    }
}

/// Read an environment variable, treating empty values as unset.
pub fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Validate that a string is an absolute http(s) URL.
pub fn parse_http_url(raw: &str) -> Result<url::Url, String> {
    let parsed = url::Url::parse(raw).map_err(|e| format!("{}: {}", raw, e))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(format!("{}: unsupported scheme {}", raw, other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webhook_cache_file_is_under_state_dir() {
        let file = webhook_cache_file();
        assert!(file.ends_with(WEBHOOK_CACHE_FILE));
        assert!(file.parent().is_some());
    }

    #[test]
    fn test_ensure_state_dir_honours_override() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("state");
        std::env::set_var(STATE_DIR_ENV, &target);

        let created = ensure_state_dir().unwrap();
        std::env::remove_var(STATE_DIR_ENV);

        assert_eq!(created, target);
        assert!(target.is_dir());
    }

    #[test]
    fn test_env_non_empty() {
        std::env::set_var("ECHOBOT_TEST_EMPTY_VAR", "   ");
        assert_eq!(env_non_empty("ECHOBOT_TEST_EMPTY_VAR"), None);
        std::env::set_var("ECHOBOT_TEST_SET_VAR", " value ");
        assert_eq!(env_non_empty("ECHOBOT_TEST_SET_VAR").as_deref(), Some("value"));
        assert_eq!(env_non_empty("ECHOBOT_TEST_MISSING_VAR"), None);
    }

    #[test]
    fn test_parse_http_url() {
        assert!(parse_http_url("https://api.telegram.org").is_ok());
        assert!(parse_http_url("http://127.0.0.1:4040/api/tunnels").is_ok());
        assert!(parse_http_url("ftp://example.com").is_err());
        assert!(parse_http_url("not a url").is_err());
    }
}
