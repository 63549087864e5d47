//! Configuration for talking to a hosted embedding service.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::Mode;

/// Base URL of the hosted embedding API.
pub const DEFAULT_BASE_URL: &str = "https://midras-api-worker.ajcardoza2000.workers.dev";

/// Upper bound on a single embedding call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(180);

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "MIDRAS_API_KEY";

/// Environment variable overriding the base URL.
pub const BASE_URL_ENV: &str = "MIDRAS_BASE_URL";

/// Where the API key travels in a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiKeyPlacement {
    /// `Authorization: Bearer <key>` header.
    #[default]
    Header,
    /// `api_key` field in the JSON body.
    Body,
}

/// Configuration for a hosted-mode client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the embedding API, without a trailing slash.
    pub base_url: String,

    /// API key sent with every request.
    #[serde(default)]
    pub api_key: String,

    /// How the API key is attached.
    #[serde(default)]
    pub api_key_placement: ApiKeyPlacement,

    /// Upper bound on a single request.
    #[serde(
        rename = "timeout_ms",
        serialize_with = "serialize_duration_ms",
        deserialize_with = "deserialize_duration_ms"
    )]
    pub timeout: Duration,

    /// Mode used when the caller does not pick one.
    #[serde(default)]
    pub mode: Mode,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            api_key: String::new(),
            api_key_placement: ApiKeyPlacement::default(),
            timeout: DEFAULT_TIMEOUT,
            mode: Mode::default(),
        }
    }
}

impl ClientConfig {
    /// Creates a new builder with default values.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Reads `MIDRAS_API_KEY` and `MIDRAS_BASE_URL`, falling back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            config.api_key = key;
        }
        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            config.base_url = url;
        }
        config.base_url = trim_base_url(&config.base_url);
        config
    }

    /// Joins `path` onto the base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }
}

fn trim_base_url(url: &str) -> String {
    url.trim_end_matches('/').to_owned()
}

/// Builder for `ClientConfig`.
#[derive(Debug, Default)]
#[must_use]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Sets the base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = trim_base_url(&url.into());
        self
    }

    /// Sets the API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    pub fn api_key_placement(mut self, placement: ApiKeyPlacement) -> Self {
        self.config.api_key_placement = placement;
        self
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.config.mode = mode;
        self
    }

    /// Builds the `ClientConfig`.
    pub fn build(self) -> ClientConfig {
        self.config
    }
}

#[allow(clippy::cast_possible_truncation)]
fn serialize_duration_ms<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_u64(duration.as_millis() as u64)
}

fn deserialize_duration_ms<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let ms = u64::deserialize(deserializer)?;
    Ok(Duration::from_millis(ms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, OnceLock};

    fn env_lock() -> &'static Mutex<()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    // === Defaults ===

    #[test]
    fn default_config_values() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert!(config.api_key.is_empty());
        assert_eq!(config.api_key_placement, ApiKeyPlacement::Header);
        assert_eq!(config.timeout, Duration::from_secs(180));
        assert_eq!(config.mode, Mode::Standard);
    }

    // === Builder ===

    #[test]
    fn builder_trims_trailing_slash() {
        let config = ClientConfig::builder()
            .base_url("https://custom-api-url.com/")
            .build();
        assert_eq!(config.base_url, "https://custom-api-url.com");
    }

    #[test]
    fn builder_chains_all_fields() {
        let config = ClientConfig::builder()
            .base_url("http://localhost:8765")
            .api_key("test_api_key")
            .api_key_placement(ApiKeyPlacement::Body)
            .timeout(Duration::from_secs(5))
            .mode(Mode::Turbo)
            .build();
        assert_eq!(config.api_key, "test_api_key");
        assert_eq!(config.api_key_placement, ApiKeyPlacement::Body);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.mode, Mode::Turbo);
    }

    #[test]
    fn endpoint_joins_paths() {
        let config = ClientConfig::builder().base_url("http://host:1/").build();
        assert_eq!(config.endpoint("/embed/queries"), "http://host:1/embed/queries");
        assert_eq!(config.endpoint("embed/pdf"), "http://host:1/embed/pdf");
    }

    // === Environment ===

    #[test]
    #[allow(unsafe_code)]
    fn from_env_reads_key_and_url() {
        let _guard = env_lock().lock().expect("env lock poisoned");
        let prev_key = std::env::var(API_KEY_ENV).ok();
        let prev_url = std::env::var(BASE_URL_ENV).ok();
        unsafe {
            std::env::set_var(API_KEY_ENV, "from-env");
            std::env::set_var(BASE_URL_ENV, "http://env-host/");
        }

        let config = ClientConfig::from_env();

        unsafe {
            match prev_key {
                Some(v) => std::env::set_var(API_KEY_ENV, v),
                None => std::env::remove_var(API_KEY_ENV),
            }
            match prev_url {
                Some(v) => std::env::set_var(BASE_URL_ENV, v),
                None => std::env::remove_var(BASE_URL_ENV),
            }
        }

        assert_eq!(config.api_key, "from-env");
        assert_eq!(config.base_url, "http://env-host");
    }

    // === Serde ===

    #[test]
    fn serializes_timeout_as_millis() {
        let config = ClientConfig::builder()
            .timeout(Duration::from_millis(2500))
            .build();
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["timeout_ms"], 2500);
        assert_eq!(json["api_key_placement"], "header");
    }

    #[test]
    fn deserializes_with_defaults() {
        let json = serde_json::json!({
            "base_url": "http://localhost:8000",
            "timeout_ms": 1000
        });
        let config: ClientConfig = serde_json::from_value(json).unwrap();
        assert_eq!(config.timeout, Duration::from_secs(1));
        assert_eq!(config.mode, Mode::Standard);
        assert!(config.api_key.is_empty());
    }
}
