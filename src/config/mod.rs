use garde::Validate;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Client configuration, read from the environment (and `.env` if present).
#[derive(Debug, Deserialize, Validate)]
pub struct ClientConfig {
    /// Base URL of the processing backend (e.g., "http://localhost:8000")
    #[serde(default = "default_api_base")]
    #[garde(length(min = 1))]
    pub api_base: String,

    /// Access-gate secret. The gate cannot be unlocked when unset.
    #[garde(skip)]
    pub access_code: Option<String>,

    /// Interval between job status polls, in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    #[garde(range(min = 1))]
    pub poll_interval_ms: u64,

    /// Per-request timeout for backend calls, in seconds
    #[serde(default = "default_request_timeout_secs")]
    #[garde(range(min = 1))]
    pub request_timeout_secs: u64,

    /// File backing the persisted access flag
    #[serde(default = "default_access_store_path")]
    #[garde(skip)]
    pub access_store_path: PathBuf,

    /// Prometheus exporter listen address (e.g., "127.0.0.1:9090"). Disabled when unset.
    #[garde(skip)]
    pub metrics_addr: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    Env(#[from] envy::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] garde::Report),
}

fn default_api_base() -> String {
    "http://localhost:8000".to_string()
}

fn default_poll_interval_ms() -> u64 {
    2500
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_access_store_path() -> PathBuf {
    PathBuf::from(".clippyio_access.json")
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Parse and validate configuration from explicit key/value pairs.
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config: Self = envy::from_iter(vars)?;
        config.validate()?;
        Ok(config)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Configuration for the in-memory stub backend.
#[derive(Debug, Deserialize)]
pub struct StubConfig {
    /// Server bind address
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Base used when building clip URLs
    #[serde(default = "default_api_base")]
    pub public_base: String,

    /// Status polls a job answers before reaching its terminal state
    #[serde(default = "default_polls_until_done")]
    pub polls_until_done: u32,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_polls_until_done() -> u32 {
    3
}

impl StubConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_defaults() {
        let config = ClientConfig::from_vars(Vec::new()).unwrap();
        assert_eq!(config.api_base, "http://localhost:8000");
        assert_eq!(config.poll_interval(), Duration::from_millis(2500));
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert!(config.access_code.is_none());
        assert!(config.metrics_addr.is_none());
    }

    #[test]
    fn test_client_overrides() {
        let vars = vec![
            ("API_BASE".to_string(), "https://api.clippy.io".to_string()),
            ("ACCESS_CODE".to_string(), "letmein".to_string()),
            ("POLL_INTERVAL_MS".to_string(), "500".to_string()),
        ];
        let config = ClientConfig::from_vars(vars).unwrap();
        assert_eq!(config.api_base, "https://api.clippy.io");
        assert_eq!(config.access_code.as_deref(), Some("letmein"));
        assert_eq!(config.poll_interval(), Duration::from_millis(500));
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let vars = vec![("POLL_INTERVAL_MS".to_string(), "0".to_string())];
        let err = ClientConfig::from_vars(vars).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_zero_request_timeout_rejected() {
        let vars = vec![("REQUEST_TIMEOUT_SECS".to_string(), "0".to_string())];
        let err = ClientConfig::from_vars(vars).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_unparseable_poll_interval_rejected() {
        let vars = vec![("POLL_INTERVAL_MS".to_string(), "soon".to_string())];
        let err = ClientConfig::from_vars(vars).unwrap_err();
        assert!(matches!(err, ConfigError::Env(_)));
    }

    #[test]
    fn test_stub_defaults() {
        let config: StubConfig = envy::from_iter(Vec::<(String, String)>::new()).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:8000");
        assert_eq!(config.polls_until_done, 3);
    }
}
