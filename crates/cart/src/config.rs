//! Cart configuration loaded from environment variables.
//!
//! Explicit construction is the primary API - browser-embedded hosts build a
//! [`CartConfig`] from values the page shipped. `from_env` exists for
//! binaries (the CLI, test harnesses).
//!
//! # Environment Variables
//!
//! ## Required
//! - `MANIPI_API_BASE_URL` - Backend origin the cart API lives under
//!
//! ## Optional
//! - `MANIPI_CART_COOKIE_MAX_AGE_DAYS` - Cart cookie lifetime (default: 30)

use thiserror::Error;
use url::Url;

use crate::cookies::DEFAULT_MAX_AGE_DAYS;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart manager configuration.
#[derive(Debug, Clone)]
pub struct CartConfig {
    /// Backend origin the `/update_item/` endpoint lives under.
    pub api_base: Url,
    /// Lifetime of the anonymous cart cookie, in days.
    pub cookie_max_age_days: i64,
}

impl CartConfig {
    /// Create a configuration for the given API base with default cookie
    /// lifetime.
    #[must_use]
    pub const fn new(api_base: Url) -> Self {
        Self {
            api_base,
            cookie_max_age_days: DEFAULT_MAX_AGE_DAYS,
        }
    }

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

        let api_base = get_required_env("MANIPI_API_BASE_URL")?
            .parse::<Url>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("MANIPI_API_BASE_URL".to_owned(), e.to_string())
            })?;

        let cookie_max_age_days = get_env_or_default(
            "MANIPI_CART_COOKIE_MAX_AGE_DAYS",
            &DEFAULT_MAX_AGE_DAYS.to_string(),
        )
        .parse::<i64>()
        .map_err(|e| {
            ConfigError::InvalidEnvVar("MANIPI_CART_COOKIE_MAX_AGE_DAYS".to_owned(), e.to_string())
        })?;

        Ok(Self {
            api_base,
            cookie_max_age_days,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_owned()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_uses_default_cookie_lifetime() {
        let config = CartConfig::new(Url::parse("https://shop.manipi.example/").unwrap());
        assert_eq!(config.cookie_max_age_days, 30);
    }

    #[test]
    fn test_get_env_or_default_falls_back() {
        assert_eq!(
            get_env_or_default("MANIPI_TEST_UNSET_VARIABLE", "30"),
            "30"
        );
    }

    #[test]
    fn test_missing_required_env() {
        let err = get_required_env("MANIPI_TEST_UNSET_VARIABLE").unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(_)));
    }
}
