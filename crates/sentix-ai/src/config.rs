//! Client configuration, read from the process environment.

use std::fmt;
use std::time::Duration;

use crate::ClassifyError;

pub const AUTH_ENV_VAR: &str = "GEMINI_API_KEY";
pub const MODEL_ENV_VAR: &str = "SENTIX_MODEL";
pub const ENDPOINT_ENV_VAR: &str = "SENTIX_ENDPOINT";

pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Settings for [`GeminiClient`](crate::GeminiClient).
///
/// The API key is optional here so that a client can be constructed without
/// one; every classification attempt checks for it before touching the network.
#[derive(Clone)]
pub struct ClientConfig {
    pub api_key: Option<String>,
    pub model: String,
    /// Base URL, no trailing slash.
    pub endpoint: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ClientConfig {
    /// Read `GEMINI_API_KEY`, `SENTIX_MODEL` and `SENTIX_ENDPOINT`.
    pub fn from_env() -> Self {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build a config from an arbitrary variable lookup. Unset or blank
    /// variables fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |var: &str| lookup(var).filter(|v: &String| !v.trim().is_empty());
        let mut config = Self {
            api_key: get(AUTH_ENV_VAR),
            ..Self::default()
        };
        if let Some(model) = get(MODEL_ENV_VAR) {
            config.model = model;
        }
        if let Some(endpoint) = get(ENDPOINT_ENV_VAR) {
            config = config.with_endpoint(endpoint);
        }
        config
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The configured key, or [`ClassifyError::MissingCredential`] if it is
    /// unset or blank.
    pub fn api_key(&self) -> Result<&str, ClassifyError> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(ClassifyError::MissingCredential { var: AUTH_ENV_VAR })
    }

    /// Full `generateContent` URL for the configured model.
    pub fn generate_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.endpoint, self.model
        )
    }
}
