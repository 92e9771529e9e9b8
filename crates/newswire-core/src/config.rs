use std::path::PathBuf;

use crate::app_config::{AppConfig, Environment, FetchConfig};
use crate::ConfigError;

/// Cron expression (with seconds) for the default hourly ingestion cycle.
pub const DEFAULT_SCHEDULE_CRON: &str = "0 0 * * * *";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Load only the settings needed to fetch feeds.
///
/// Used by commands that never touch the database or the classifier, so
/// `DATABASE_URL` and `NEWSWIRE_CLASSIFIER_URL` are not required. Loads
/// `.env` files first, like [`load_app_config`].
///
/// # Errors
///
/// Returns `ConfigError` if a fetch setting has an invalid value.
pub fn load_fetch_config() -> Result<FetchConfig, ConfigError> {
    dotenvy::dotenv().ok();
    build_fetch_config(|key| std::env::var(key))
}

/// Typed access to env vars through a lookup function.
struct EnvReader<F> {
    lookup: F,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    fn require(&self, var: &str) -> Result<String, ConfigError> {
        (self.lookup)(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    }

    fn or_default(&self, var: &str, default: &str) -> String {
        (self.lookup)(var).unwrap_or_else(|_| default.to_string())
    }

    fn parse<T>(&self, var: &str, default: &str) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.or_default(var, default)
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    }

    fn parse_positive_usize(&self, var: &str, default: &str) -> Result<usize, ConfigError> {
        match self.parse::<usize>(var, default)? {
            0 => Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: "must be at least 1".to_string(),
            }),
            n => Ok(n),
        }
    }

    fn fetch_config(&self) -> Result<FetchConfig, ConfigError> {
        let feeds_path = self.or_default("NEWSWIRE_FEEDS_PATH", "./config/feeds.yaml");
        Ok(FetchConfig {
            env: parse_environment(&self.or_default("NEWSWIRE_ENV", "development"))?,
            log_level: self.or_default("NEWSWIRE_LOG_LEVEL", "info"),
            feeds_path: PathBuf::from(feeds_path),
            user_agent: self.or_default("NEWSWIRE_USER_AGENT", "newswire/0.1 (news-ingestion)"),
            fetch_timeout_secs: self.parse("NEWSWIRE_FETCH_TIMEOUT_SECS", "30")?,
            max_concurrent_feeds: self.parse_positive_usize("NEWSWIRE_MAX_CONCURRENT_FEEDS", "4")?,
            fetch_max_retries: self.parse("NEWSWIRE_FETCH_MAX_RETRIES", "2")?,
            fetch_retry_backoff_ms: self.parse("NEWSWIRE_FETCH_RETRY_BACKOFF_MS", "500")?,
        })
    }
}

/// Build the fetch-only settings using the provided env-var lookup function.
fn build_fetch_config<F>(lookup: F) -> Result<FetchConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    EnvReader { lookup }.fetch_config()
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let env = EnvReader { lookup };

    let database_url = env.require("DATABASE_URL")?;
    let classifier_url = env.require("NEWSWIRE_CLASSIFIER_URL")?;

    let FetchConfig {
        env: environment,
        log_level,
        feeds_path,
        user_agent,
        fetch_timeout_secs,
        max_concurrent_feeds,
        fetch_max_retries,
        fetch_retry_backoff_ms,
    } = env.fetch_config()?;

    let schedule_cron = env.or_default("NEWSWIRE_SCHEDULE_CRON", DEFAULT_SCHEDULE_CRON);
    let db_max_connections = env.parse("NEWSWIRE_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = env.parse("NEWSWIRE_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = env.parse("NEWSWIRE_DB_ACQUIRE_TIMEOUT_SECS", "10")?;
    let classifier_timeout_secs = env.parse("NEWSWIRE_CLASSIFIER_TIMEOUT_SECS", "120")?;
    let image_timeout_secs = env.parse("NEWSWIRE_IMAGE_TIMEOUT_SECS", "10")?;
    let max_concurrent_images = env.parse_positive_usize("NEWSWIRE_MAX_CONCURRENT_IMAGES", "8")?;

    Ok(AppConfig {
        database_url,
        env: environment,
        log_level,
        feeds_path,
        schedule_cron,
        classifier_url,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        fetch_timeout_secs,
        classifier_timeout_secs,
        image_timeout_secs,
        user_agent,
        max_concurrent_feeds,
        max_concurrent_images,
        fetch_max_retries,
        fetch_retry_backoff_ms,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "NEWSWIRE_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
