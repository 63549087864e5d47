//! Configuration for vector indexes.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Width of the vectors stored by default.
pub const DEFAULT_DIMENSIONS: usize = 128;

/// Default gRPC endpoint of a local qdrant.
pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6334";

/// Environment variable holding the qdrant URL.
pub const QDRANT_URL_ENV: &str = "QDRANT_URL";

/// Environment variable holding the qdrant API key.
pub const QDRANT_API_KEY_ENV: &str = "QDRANT_API_KEY";

/// Parameters every collection is created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexParams {
    /// Width of each stored vector.
    pub dimensions: usize,
}

impl Default for IndexParams {
    fn default() -> Self {
        Self {
            dimensions: DEFAULT_DIMENSIONS,
        }
    }
}

/// Connection settings for a qdrant server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QdrantConfig {
    pub url: String,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(
        rename = "timeout_ms",
        serialize_with = "serialize_duration_ms",
        deserialize_with = "deserialize_duration_ms"
    )]
    pub timeout: Duration,

    #[serde(default)]
    pub params: IndexParams,
}

impl Default for QdrantConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_QDRANT_URL.to_owned(),
            api_key: None,
            timeout: Duration::from_secs(30),
            params: IndexParams::default(),
        }
    }
}

impl QdrantConfig {
    /// Creates a new builder with default values.
    pub fn builder() -> QdrantConfigBuilder {
        QdrantConfigBuilder::default()
    }

    /// Reads `QDRANT_URL` and `QDRANT_API_KEY`, falling back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var(QDRANT_URL_ENV) {
            config.url = url;
        }
        config.api_key = std::env::var(QDRANT_API_KEY_ENV)
            .ok()
            .filter(|k| !k.is_empty());
        config
    }
}

/// Builder for `QdrantConfig`.
#[derive(Debug, Default)]
#[must_use]
pub struct QdrantConfigBuilder {
    config: QdrantConfig,
}

impl QdrantConfigBuilder {
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.config.url = url.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn dimensions(mut self, dimensions: usize) -> Self {
        self.config.params.dimensions = dimensions;
        self
    }

    pub fn build(self) -> QdrantConfig {
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
