//! Configuration for the chat client.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Base URL of the hosted caBuddy backend.
pub const DEFAULT_BACKEND_URL: &str = "https://cabuddybackend.onrender.com";

/// Environment variable for a custom backend URL (e.g. a local instance).
pub const BACKEND_URL_ENV: &str = "CABUDDY_BACKEND_URL";

/// Get the backend base URL from the environment or use the hosted default.
#[must_use]
pub fn backend_base_url() -> String {
    std::env::var(BACKEND_URL_ENV).unwrap_or_else(|_| DEFAULT_BACKEND_URL.to_string())
}

/// Configuration for the chat client.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Backend base URL, without a trailing slash.
    pub base_url: String,
    /// Request timeout. The hosted backend can be slow to wake.
    #[serde(with = "duration_serde")]
    pub request_timeout: Duration,
    /// Connection timeout.
    #[serde(with = "duration_serde")]
    pub connect_timeout: Duration,
    /// Directory holding the persisted chat state.
    pub data_dir: PathBuf,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            base_url: backend_base_url(),
            request_timeout: Duration::from_secs(120),
            connect_timeout: Duration::from_secs(10),
            data_dir: default_data_dir(),
        }
    }
}

impl ChatConfig {
    /// Create a new config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the backend base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the directory holding the persisted chat state.
    #[must_use]
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }
}

/// Platform data directory for persisted chats, with a cwd fallback.
fn default_data_dir() -> PathBuf {
    dirs_next::data_dir().map_or_else(
        || PathBuf::from(".cabuddy"),
        |dir| dir.join("cabuddy").join("state"),
    )
}

/// Serde module for Duration serialization.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_default_config() {
        let config = ChatConfig::default();
        assert!(config.base_url.starts_with("http"));
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert!(!config.data_dir.as_os_str().is_empty());
    }

    #[test]
    fn test_config_builder() {
        let config = ChatConfig::new()
            .with_base_url("http://127.0.0.1:8000")
            .with_timeout(Duration::from_secs(30))
            .with_data_dir("/tmp/cabuddy-test");

        assert_eq!(config.base_url, "http://127.0.0.1:8000");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.data_dir, PathBuf::from("/tmp/cabuddy-test"));
    }
}
