//! Client configuration.
//!
//! Stored as TOML, e.g.:
//!
//! ```toml
//! endpoint = "https://cloud.appwrite.io/v1"
//! project = "my-project"
//! key = "secret"
//! chunk_size = 5242880
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Default upload chunk size: 5 MiB.
///
/// The server rejects request bodies above this size, so payloads larger
/// than one chunk are sent with `content-range` headers.
pub const DEFAULT_CHUNK_SIZE: u64 = 5 * 1024 * 1024;

const DEFAULT_ENDPOINT: &str = "https://cloud.appwrite.io/v1";

/// Connection settings for a [`Client`](crate::Client).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// API base URL, including the version prefix (`.../v1`).
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Project ID sent as `x-appwrite-project`.
    #[serde(default)]
    pub project: String,

    /// Server API key sent as `x-appwrite-key`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    /// Accept self-signed TLS certificates (development servers).
    #[serde(default)]
    pub self_signed: bool,

    /// Upload chunk size in bytes.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: u64,

    /// Per-request timeout. No timeout when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.into()
}

fn default_chunk_size() -> u64 {
    DEFAULT_CHUNK_SIZE
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            project: String::new(),
            key: None,
            self_signed: false,
            chunk_size: DEFAULT_CHUNK_SIZE,
            timeout_secs: None,
        }
    }
}

impl ClientConfig {
    /// Creates a configuration for `endpoint` and `project` with defaults elsewhere.
    pub fn new(endpoint: impl Into<String>, project: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            project: project.into(),
            ..Default::default()
        }
    }

    /// Parses a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, Error> {
        let config: ClientConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a TOML configuration file.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), endpoint = %config.endpoint, "configuration loaded");
        Ok(config)
    }

    /// Checks that the settings can be used to build a client.
    pub fn validate(&self) -> Result<(), Error> {
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            return Err(Error::Config(format!(
                "endpoint must be an http(s) URL: {}",
                self.endpoint
            )));
        }
        if self.chunk_size == 0 {
            return Err(Error::Config("chunk_size must be greater than zero".into()));
        }
        Ok(())
    }

    /// Builds the absolute URL for an API path such as `/storage/buckets`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint.trim_end_matches('/'), path)
    }
}
