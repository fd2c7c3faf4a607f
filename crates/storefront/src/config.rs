//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `LOCKERBAY_API_BASE_URL` - Base URL of the LockerBay backend
//!
//! ## Optional
//! - `LOCKERBAY_API_TOKEN` - Bearer token for the backend API
//! - `LOCKERBAY_HTTP_TIMEOUT_SECS` - HTTP client timeout (default: 10)
//! - `LOCKERBAY_CATALOG_CACHE_TTL_SECS` - Catalog cache TTL (default: 300)
//! - `LOCKERBAY_RESEND_COOLDOWN_SECS` - Verification resend cooldown
//!   (default: 60)
//! - `LOCKERBAY_CACHE_FILE` - Path for the durable sign-up cache; when
//!   unset the cache is in-memory only

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
const DEFAULT_CATALOG_CACHE_TTL_SECS: u64 = 300;
const DEFAULT_RESEND_COOLDOWN_SECS: u64 = 60;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront session-core configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Base URL of the LockerBay backend API
    pub api_base_url: Url,
    /// Bearer token for the backend API
    pub api_token: Option<SecretString>,
    /// HTTP client timeout
    pub http_timeout: Duration,
    /// TTL for cached catalog responses
    pub catalog_cache_ttl: Duration,
    /// Cooldown between verification-link resends
    pub resend_cooldown: Duration,
    /// Path for the durable sign-up cache (in-memory when unset)
    pub cache_file: Option<PathBuf>,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::load(&|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    fn load(vars: &dyn Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_base_url = required(vars, "LOCKERBAY_API_BASE_URL")?;
        let api_base_url = Url::parse(&api_base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("LOCKERBAY_API_BASE_URL".to_owned(), e.to_string())
        })?;

        let api_token = vars("LOCKERBAY_API_TOKEN")
            .filter(|token| !token.trim().is_empty())
            .map(SecretString::from);

        let http_timeout = duration_var(vars, "LOCKERBAY_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?;
        let catalog_cache_ttl = duration_var(
            vars,
            "LOCKERBAY_CATALOG_CACHE_TTL_SECS",
            DEFAULT_CATALOG_CACHE_TTL_SECS,
        )?;
        let resend_cooldown = duration_var(
            vars,
            "LOCKERBAY_RESEND_COOLDOWN_SECS",
            DEFAULT_RESEND_COOLDOWN_SECS,
        )?;

        let cache_file = vars("LOCKERBAY_CACHE_FILE")
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            api_base_url,
            api_token,
            http_timeout,
            catalog_cache_ttl,
            resend_cooldown,
            cache_file,
        })
    }
}

fn required(vars: &dyn Fn(&str) -> Option<String>, key: &str) -> Result<String, ConfigError> {
    vars(key)
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(key.to_owned()))
}

fn duration_var(
    vars: &dyn Fn(&str) -> Option<String>,
    key: &str,
    default_secs: u64,
) -> Result<Duration, ConfigError> {
    match vars(key) {
        None => Ok(Duration::from_secs(default_secs)),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_owned(), e.to_string())),
    }
}
