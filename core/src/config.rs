//! Client configuration.
//!
//! # Design
//! The only credential is the API key. When none is configured the client
//! falls back to `DEMO_KEY`, which NASA throttles heavily; `Client`
//! construction logs a warning in that case. `base_url` exists so tests (and
//! self-hosted mirrors) can point the client somewhere other than
//! `api.nasa.gov`.

/// The shared demo key accepted by api.nasa.gov without registration.
pub const DEMO_KEY: &str = "DEMO_KEY";

/// Production API root.
pub const DEFAULT_BASE_URL: &str = "https://api.nasa.gov";

/// Environment variable read by `ClientConfig::from_env`.
pub const API_KEY_ENV: &str = "NASA_API_KEY";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Credential attached to every request. `None` means `DEMO_KEY`.
    pub api_key: Option<String>,
    pub base_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a config from `NASA_API_KEY`. An unset or empty variable leaves
    /// the key unset.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let api_key = lookup(API_KEY_ENV).filter(|key| !key.trim().is_empty());
        Self {
            api_key,
            ..Self::default()
        }
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// The key requests will carry.
    pub fn effective_api_key(&self) -> &str {
        self.api_key.as_deref().unwrap_or(DEMO_KEY)
    }

    pub fn uses_demo_key(&self) -> bool {
        self.api_key.is_none()
    }
}
