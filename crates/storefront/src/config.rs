//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `SHOPFRONT_TAX_RATE` - Cart tax rate as a fraction, 0 to 1 (default: 0.08)
//! - `SHOPFRONT_PERSIST_TIMEOUT_SECS` - Bound on each order write (default: 10)
//! - `SHOPFRONT_CATALOG_URL` - Product catalog API base (default: <https://fakestoreapi.com>)
//! - `SHOPFRONT_CATALOG_CACHE_TTL_SECS` - Catalog cache lifetime (default: 300)
//! - `SHOPFRONT_CATALOG_CACHE_CAPACITY` - Catalog cache entries (default: 1000)
//! - `SHOPFRONT_LOG_JSON` - Emit JSON logs when `true` or `1` (default: false)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag (default: development)

use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use shopfront_core::TaxRate;
use thiserror::Error;
use url::Url;

const DEFAULT_TAX_RATE: &str = "0.08";
const DEFAULT_PERSIST_TIMEOUT_SECS: &str = "10";
const DEFAULT_CATALOG_URL: &str = "https://fakestoreapi.com";
const DEFAULT_CACHE_TTL_SECS: &str = "300";
const DEFAULT_CACHE_CAPACITY: &str = "1000";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront configuration.
#[derive(Debug, Clone)]
pub struct ShopConfig {
    /// Tax rate a new cart starts with
    pub tax_rate: TaxRate,
    /// Upper bound on a single order write
    pub persist_timeout: Duration,
    /// Product catalog configuration
    pub catalog: CatalogConfig,
    /// Logging and error tracking
    pub telemetry: TelemetryConfig,
}

/// Product catalog configuration.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Base URL of the product-catalog HTTP API, always ending in `/`
    pub base_url: Url,
    /// How long a cached read stays fresh
    pub cache_ttl: Duration,
    /// Maximum cached entries
    pub cache_capacity: u64,
}

/// Logging and Sentry configuration.
#[derive(Debug, Clone, Default)]
pub struct TelemetryConfig {
    /// Emit logs as JSON instead of human-readable text
    pub log_json: bool,
    /// Sentry DSN; Sentry is disabled when unset
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
}

impl Default for ShopConfig {
    fn default() -> Self {
        Self {
            tax_rate: TaxRate::default(),
            persist_timeout: Duration::from_secs(10),
            catalog: CatalogConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse("https://fakestoreapi.com/")
                .unwrap_or_else(|_| unreachable!("default catalog URL is valid")),
            cache_ttl: Duration::from_secs(300),
            cache_capacity: 1000,
        }
    }
}

impl ShopConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup` instead of the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let requested: Decimal = get_parsed_env(
            &lookup,
            "SHOPFRONT_TAX_RATE",
            DEFAULT_TAX_RATE,
        )?;
        let (tax_rate, clamped) = TaxRate::clamped(requested);
        if clamped {
            return Err(ConfigError::InvalidEnvVar(
                "SHOPFRONT_TAX_RATE".to_string(),
                format!("{requested} is outside 0..=1"),
            ));
        }

        let persist_timeout = Duration::from_secs(get_parsed_env(
            &lookup,
            "SHOPFRONT_PERSIST_TIMEOUT_SECS",
            DEFAULT_PERSIST_TIMEOUT_SECS,
        )?);
        if persist_timeout.is_zero() {
            return Err(ConfigError::InvalidEnvVar(
                "SHOPFRONT_PERSIST_TIMEOUT_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            tax_rate,
            persist_timeout,
            catalog: CatalogConfig::from_lookup(&lookup)?,
            telemetry: TelemetryConfig::from_lookup(&lookup),
        })
    }
}

impl CatalogConfig {
    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let raw = get_env_or_default(lookup, "SHOPFRONT_CATALOG_URL", DEFAULT_CATALOG_URL);
        let base_url = parse_base_url(&raw).map_err(|reason| {
            ConfigError::InvalidEnvVar("SHOPFRONT_CATALOG_URL".to_string(), reason)
        })?;

        Ok(Self {
            base_url,
            cache_ttl: Duration::from_secs(get_parsed_env(
                lookup,
                "SHOPFRONT_CATALOG_CACHE_TTL_SECS",
                DEFAULT_CACHE_TTL_SECS,
            )?),
            cache_capacity: get_parsed_env(
                lookup,
                "SHOPFRONT_CATALOG_CACHE_CAPACITY",
                DEFAULT_CACHE_CAPACITY,
            )?,
        })
    }
}

impl TelemetryConfig {
    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Self {
        let log_json = get_optional_env(lookup, "SHOPFRONT_LOG_JSON")
            .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"));
        Self {
            log_json,
            sentry_dsn: get_optional_env(lookup, "SENTRY_DSN"),
            sentry_environment: get_optional_env(lookup, "SENTRY_ENVIRONMENT"),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable. Blank values count as unset.
fn get_optional_env(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key).filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: &str,
) -> String {
    get_optional_env(lookup, key).unwrap_or_else(|| default.to_string())
}

/// Get an environment variable parsed as `T`, falling back to `default`.
fn get_parsed_env<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: &str,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(lookup, key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse an HTTP(S) base URL, normalising it to end in `/` so joins append.
fn parse_base_url(raw: &str) -> Result<Url, String> {
    let mut url = Url::parse(raw.trim()).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme '{}'", url.scheme()));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
