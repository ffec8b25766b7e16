//! Cart configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `FLOATING_CART_DATA_DIR` - Directory for the file store (default: platform
//!   data dir + `floating-cart`, or `./.floating-cart`)
//! - `FLOATING_CART_STORAGE_KEY` - Storage key of the cart (default: `@floatingCart:products`)
//! - `FLOATING_CART_PERSIST_RETRIES` - Extra write attempts after a failure (default: 2)
//! - `FLOATING_CART_PERSIST_BACKOFF_MS` - Delay between write attempts (default: 50)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Default storage key of the cart.
pub const DEFAULT_STORAGE_KEY: &str = "@floatingCart:products";

const DEFAULT_PERSIST_RETRIES: u32 = 2;
const DEFAULT_PERSIST_BACKOFF_MS: u64 = 50;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart application configuration.
#[derive(Debug, Clone)]
pub struct CartConfig {
    /// Directory used by the file store
    pub data_dir: PathBuf,
    /// Cart store behaviour
    pub store: StoreOptions,
}

/// Options for a [`CartStore`](crate::CartStore).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    /// Key of the persisted cart slot
    pub storage_key: String,
    /// Extra write attempts after a failed write
    pub persist_retries: u32,
    /// Delay between write attempts
    pub persist_backoff: Duration,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            persist_retries: DEFAULT_PERSIST_RETRIES,
            persist_backoff: Duration::from_millis(DEFAULT_PERSIST_BACKOFF_MS),
        }
    }
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            store: StoreOptions::default(),
        }
    }
}

impl CartConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_dir = lookup("FLOATING_CART_DATA_DIR").map_or_else(default_data_dir, PathBuf::from);

        let storage_key = lookup("FLOATING_CART_STORAGE_KEY")
            .unwrap_or_else(|| DEFAULT_STORAGE_KEY.to_string());
        if storage_key.trim().is_empty() {
            return Err(ConfigError::InvalidEnvVar(
                "FLOATING_CART_STORAGE_KEY".to_string(),
                "must not be empty".to_string(),
            ));
        }

        let persist_retries = parse_or_default(
            &lookup,
            "FLOATING_CART_PERSIST_RETRIES",
            DEFAULT_PERSIST_RETRIES,
        )?;
        let backoff_ms = parse_or_default(
            &lookup,
            "FLOATING_CART_PERSIST_BACKOFF_MS",
            DEFAULT_PERSIST_BACKOFF_MS,
        )?;

        Ok(Self {
            data_dir,
            store: StoreOptions {
                storage_key,
                persist_retries,
                persist_backoff: Duration::from_millis(backoff_ms),
            },
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Platform data directory for the cart, falling back to the working directory.
fn default_data_dir() -> PathBuf {
    dirs::data_dir().map_or_else(
        || PathBuf::from(".floating-cart"),
        |dir| dir.join("floating-cart"),
    )
}

/// Parse a variable, using `default` when it is unset.
fn parse_or_default<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key).map_or(Ok(default), |value| {
        value
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = CartConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.store, StoreOptions::default());
        assert_eq!(config.store.storage_key, "@floatingCart:products");
        assert_eq!(config.store.persist_retries, 2);
        assert_eq!(config.store.persist_backoff, Duration::from_millis(50));
    }

    #[test]
    fn test_overrides() {
        let config = CartConfig::from_lookup(lookup_from(&[
            ("FLOATING_CART_DATA_DIR", "/tmp/cart"),
            ("FLOATING_CART_STORAGE_KEY", "@test:cart"),
            ("FLOATING_CART_PERSIST_RETRIES", "5"),
            ("FLOATING_CART_PERSIST_BACKOFF_MS", "10"),
        ]))
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/cart"));
        assert_eq!(config.store.storage_key, "@test:cart");
        assert_eq!(config.store.persist_retries, 5);
        assert_eq!(config.store.persist_backoff, Duration::from_millis(10));
    }

    #[test]
    fn test_invalid_number() {
        let err =
            CartConfig::from_lookup(lookup_from(&[("FLOATING_CART_PERSIST_RETRIES", "many")]))
                .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidEnvVar(ref key, _) if key == "FLOATING_CART_PERSIST_RETRIES"
        ));
    }

    #[test]
    fn test_empty_storage_key() {
        assert!(
            CartConfig::from_lookup(lookup_from(&[("FLOATING_CART_STORAGE_KEY", "  ")])).is_err()
        );
    }
}
