//! Application configuration loaded from environment variables.
//!
//! Values are read once at startup. The signing key is the only secret; it is
//! injected as an environment variable by the deployment.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Event platform app id used in function registration.
pub const DEFAULT_APP_ID: &str = "quickcart-next";
/// Maximum number of `order/created` events per batch.
pub const DEFAULT_ORDER_BATCH_MAX_SIZE: usize = 25;
/// Maximum wait after the first pending `order/created` event.
pub const DEFAULT_ORDER_BATCH_TIMEOUT: Duration = Duration::from_secs(5);
/// Retries per failed run in the in-process dispatcher.
pub const DEFAULT_DISPATCH_MAX_RETRIES: u32 = 3;

/// Which [`crate::db::Store`] implementation to run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Firestore,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(StoreBackend::Firestore),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(ConfigError::Invalid("STORE_BACKEND", s.to_string())),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// GCP project ID
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    pub store_backend: StoreBackend,
    /// App id reported in the function registration document
    pub app_id: String,
    /// HMAC key for dispatcher request signatures. Unsigned requests are
    /// accepted when this is `None`.
    pub signing_key: Option<Vec<u8>>,
    pub order_batch_max_size: usize,
    pub order_batch_timeout: Duration,
    pub dispatch_max_retries: u32,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            store_backend: StoreBackend::Memory,
            app_id: DEFAULT_APP_ID.to_string(),
            signing_key: None,
            order_batch_max_size: DEFAULT_ORDER_BATCH_MAX_SIZE,
            order_batch_timeout: DEFAULT_ORDER_BATCH_TIMEOUT,
            dispatch_max_retries: DEFAULT_DISPATCH_MAX_RETRIES,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let order_batch_max_size = parse_var("ORDER_BATCH_MAX_SIZE", DEFAULT_ORDER_BATCH_MAX_SIZE)?;
        if order_batch_max_size == 0 {
            return Err(ConfigError::Invalid("ORDER_BATCH_MAX_SIZE", "0".to_string()));
        }

        let timeout_ms = parse_var(
            "ORDER_BATCH_TIMEOUT_MS",
            DEFAULT_ORDER_BATCH_TIMEOUT.as_millis() as u64,
        )?;

        Ok(Self {
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: parse_var("PORT", 8080)?,
            store_backend: env::var("STORE_BACKEND")
                .map(|v| v.parse())
                .unwrap_or(Ok(StoreBackend::Firestore))?,
            app_id: env::var("EVENT_APP_ID").unwrap_or_else(|_| DEFAULT_APP_ID.to_string()),
            signing_key: env::var("EVENT_SIGNING_KEY")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .map(String::into_bytes),
            order_batch_max_size,
            order_batch_timeout: Duration::from_millis(timeout_ms),
            dispatch_max_retries: parse_var("DISPATCH_MAX_RETRIES", DEFAULT_DISPATCH_MAX_RETRIES)?,
        })
    }
}

/// Parse an optional numeric variable, falling back to `default` when unset.
fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(name, raw)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}
