use std::env;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::application::order_service::ImportFailurePolicy;
use crate::infrastructure::blocking_store::StoreLimits;

/// Upper bound for retention, grace and cleanup interval (ten years).
pub const MAX_WINDOW_SECS: u64 = 10 * 365 * 86_400;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} has invalid value '{value}': {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Runtime settings, read from the environment (and `.env` via dotenvy in
/// `main`).
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub shopping_service_url: String,
    pub cart_timeout: Duration,
    pub db_pool_size: u32,
    pub store_limits: StoreLimits,
    pub retention: Duration,
    pub purge_grace: Duration,
    pub cleanup_interval: Duration,
    pub import_failure_policy: ImportFailurePolicy,
    pub max_upload_bytes: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(key))
        };

        let store_limits = StoreLimits {
            workers: parse_or(&lookup, "STORE_WORKERS", 8)?,
            queue_capacity: parse_or(&lookup, "STORE_QUEUE_CAPACITY", 64)?,
        };
        if store_limits.workers == 0 {
            return Err(invalid("STORE_WORKERS", "0", "at least one worker is required"));
        }

        let db_pool_size: u32 = parse_or(&lookup, "DB_POOL_SIZE", 10)?;
        if db_pool_size == 0 {
            return Err(invalid("DB_POOL_SIZE", "0", "pool must hold a connection"));
        }

        let cleanup_interval = window_secs_or(&lookup, "CLEANUP_INTERVAL_SECS", 180)?;
        if cleanup_interval.is_zero() {
            return Err(invalid("CLEANUP_INTERVAL_SECS", "0", "interval must be positive"));
        }

        let retention = window_secs_or(&lookup, "RETENTION_SECS", 60)?;
        let purge_grace = window_secs_or(&lookup, "PURGE_GRACE_SECS", 30)?;
        // Untouched orders have updated_at == inserted_at, so a longer grace
        // would silently become the retention.
        if purge_grace > retention {
            return Err(invalid(
                "PURGE_GRACE_SECS",
                &purge_grace.as_secs().to_string(),
                format!("must not exceed RETENTION_SECS ({})", retention.as_secs()),
            ));
        }

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&lookup, "PORT", 8080)?,
            shopping_service_url: required("SHOPPING_SERVICE_URL")?,
            cart_timeout: secs_or(&lookup, "CART_TIMEOUT_SECS", 5)?,
            db_pool_size,
            store_limits,
            retention,
            purge_grace,
            cleanup_interval,
            import_failure_policy: parse_or(
                &lookup,
                "IMPORT_FAILURE_POLICY",
                ImportFailurePolicy::Continue,
            )?,
            max_upload_bytes: parse_or(&lookup, "MAX_UPLOAD_BYTES", 4 * 1024 * 1024)?,
        })
    }
}

fn invalid(key: &'static str, value: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: reason.into(),
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| invalid(key, &raw, e.to_string())),
    }
}

fn secs_or<F>(lookup: &F, key: &'static str, default: u64) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    parse_or(lookup, key, default).map(Duration::from_secs)
}

/// Like [`secs_or`] but capped at [`MAX_WINDOW_SECS`], for durations that
/// are subtracted from or added to the clock.
fn window_secs_or<F>(lookup: &F, key: &'static str, default: u64) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let window = secs_or(lookup, key, default)?;
    if window.as_secs() > MAX_WINDOW_SECS {
        return Err(invalid(
            key,
            &window.as_secs().to_string(),
            format!("must be at most {MAX_WINDOW_SECS} seconds"),
        ));
    }
    Ok(window)
}
