//! Configuration system (layered: code > env > config file).

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, Result};

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_STREAM_IDLE_TIMEOUT_MS: u64 = 120_000;
pub const DEFAULT_MAX_CONTINUATIONS: usize = 20;
pub const DEFAULT_MAX_OPEN_ATTEMPTS: u32 = 3;

/// Client configuration.
///
/// Resolution order: values set in code, then `AGUI_*` environment
/// variables (a `.env` file is honored), then an optional TOML file.
#[derive(Clone, Builder, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    /// Run endpoint for the HTTP transport.
    #[builder(into)]
    pub endpoint: Option<String>,
    /// Bearer token sent with every run request.
    #[builder(into)]
    pub api_key: Option<String>,
    #[builder(default)]
    pub headers: HashMap<String, String>,
    /// Time allowed to connect and receive response headers; 0 disables.
    #[builder(default = DEFAULT_REQUEST_TIMEOUT_SECS)]
    pub request_timeout_secs: u64,
    /// Silence allowed between two events before the run fails; 0 disables.
    #[builder(default = DEFAULT_STREAM_IDLE_TIMEOUT_MS)]
    pub stream_idle_timeout_ms: u64,
    /// Upper bound on continuation runs chained after one `start()`.
    #[builder(default = DEFAULT_MAX_CONTINUATIONS)]
    pub max_continuations: usize,
    /// Attempts made to open a stream when the failure is transient.
    #[builder(default = DEFAULT_MAX_OPEN_ATTEMPTS)]
    pub max_open_attempts: u32,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("stream_idle_timeout_ms", &self.stream_idle_timeout_ms)
            .field("max_continuations", &self.max_continuations)
            .field("max_open_attempts", &self.max_open_attempts)
            .finish()
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ClientConfig {
    /// Load from `AGUI_*` environment variables on top of defaults.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::default().merge_lookup(|key| std::env::var(key).ok())
    }

    /// Load a TOML file, then let the environment override it.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let _ = dotenvy::dotenv();
        let base = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        base.merge_lookup(|key| std::env::var(key).ok())
    }

    /// Parse a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }

    /// Override fields from a key lookup (normally the process environment).
    pub fn merge_lookup<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = lookup("AGUI_ENDPOINT") {
            self.endpoint = Some(endpoint);
        }
        if let Some(key) = lookup("AGUI_API_KEY") {
            self.api_key = Some(key);
        }
        if let Some(raw) = lookup("AGUI_REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = parse_number("AGUI_REQUEST_TIMEOUT_SECS", &raw)?;
        }
        if let Some(raw) = lookup("AGUI_STREAM_IDLE_TIMEOUT_MS") {
            self.stream_idle_timeout_ms = parse_number("AGUI_STREAM_IDLE_TIMEOUT_MS", &raw)?;
        }
        if let Some(raw) = lookup("AGUI_MAX_CONTINUATIONS") {
            self.max_continuations = parse_number("AGUI_MAX_CONTINUATIONS", &raw)?;
        }
        if let Some(raw) = lookup("AGUI_MAX_OPEN_ATTEMPTS") {
            self.max_open_attempts = parse_number("AGUI_MAX_OPEN_ATTEMPTS", &raw)?;
        }
        Ok(self)
    }

    /// `None` when opening a stream may take as long as it needs.
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }

    /// `None` when the idle timeout is disabled.
    pub fn stream_idle_timeout(&self) -> Option<Duration> {
        (self.stream_idle_timeout_ms > 0).then(|| Duration::from_millis(self.stream_idle_timeout_ms))
    }

    /// The endpoint, or a configuration error when unset.
    pub fn require_endpoint(&self) -> Result<&str> {
        self.endpoint
            .as_deref()
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| ClientError::Configuration("AGUI_ENDPOINT is not set".to_string()))
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| ClientError::Configuration(format!("{key} must be a number, got '{raw}'")))
}
