//! Configuration for walletchat.
//!
//! Settings are loaded with priority: env var > default. `BACKEND_URL` and
//! friends may live in `./.env` or `~/.walletchat/.env` (loaded via dotenvy
//! early in startup; the working-directory file takes priority because
//! dotenvy never overwrites existing vars).

use std::path::PathBuf;

use crate::error::ConfigError;

/// Default backend agent base URL (the FastAPI dev server).
const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

/// Default block-explorer transaction URL prefix (Base Sepolia).
const DEFAULT_EXPLORER_TX_BASE: &str = "https://sepolia.basescan.org/tx/";

/// Main configuration for the client.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the wallet agent backend.
    pub backend_url: String,
    /// URL prefix transaction hashes are linked under.
    pub explorer_tx_base: String,
    /// Path of the file holding the durable session id.
    pub session_path: PathBuf,
}

impl Config {
    /// Load configuration from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let backend_url = optional_env("BACKEND_URL")
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());
        validate_base_url("BACKEND_URL", &backend_url)?;

        let explorer_tx_base = optional_env("EXPLORER_TX_BASE_URL")
            .unwrap_or_else(|| DEFAULT_EXPLORER_TX_BASE.to_string());
        validate_base_url("EXPLORER_TX_BASE_URL", &explorer_tx_base)?;

        let session_path = optional_env("WALLETCHAT_SESSION_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(default_session_path);

        Ok(Self {
            backend_url: trim_trailing_slash(&backend_url),
            explorer_tx_base,
            session_path,
        })
    }
}

/// Path to the walletchat dot-directory: `~/.walletchat`.
pub fn walletchat_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".walletchat")
}

/// Default session file path (`~/.walletchat/session`).
pub fn default_session_path() -> PathBuf {
    walletchat_dir().join("session")
}

/// Load env vars from `~/.walletchat/.env` (in addition to the standard
/// `.env`). Call **after** `dotenvy::dotenv()` so the effective priority is:
///
///   explicit env vars > `./.env` > `~/.walletchat/.env`
pub fn load_walletchat_env() {
    let path = walletchat_dir().join(".env");
    if path.exists() {
        let _ = dotenvy::from_path(&path);
    }
}

/// Read an env var, treating unset and whitespace-only as absent.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validate_base_url(key: &str, value: &str) -> Result<(), ConfigError> {
    let parsed = url::Url::parse(value).map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        message: e.to_string(),
    })?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected an http(s) URL, got '{value}'"),
        });
    }
    Ok(())
}

fn trim_trailing_slash(value: &str) -> String {
    value.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_http_backend_url() {
        let err = validate_base_url("BACKEND_URL", "ftp://example.com").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn accepts_https_backend_url() {
        assert!(validate_base_url("BACKEND_URL", "https://agent.example.com").is_ok());
    }

    #[test]
    fn trims_trailing_slash_from_backend_url() {
        assert_eq!(
            trim_trailing_slash("http://localhost:8000/"),
            "http://localhost:8000"
        );
        assert_eq!(
            trim_trailing_slash("http://localhost:8000"),
            "http://localhost:8000"
        );
    }
}
