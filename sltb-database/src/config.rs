use std::time::Duration;

use anyhow::Context;
use log::warn;

use crate::types::DbConnectParams;

/**
 * Get an environment variable or a default value
 *
 * # Arguments
 * @param key: &str - The environment variable key
 * @param default: &str - The default value
 *
 * # Returns
 * @return String - The value of the environment variable or the default value
 */
pub fn get_env_var_or_default(key: &str, default: &str) -> String {
    match std::env::var(key) {
        Ok(val) => val,
        Err(_) => {
            warn!("{} not set, using default value: {}", key, default);
            default.to_string()
        }
    }
}

/**
 * Get a required environment variable
 *
 * # Returns
 * @return anyhow::Result<String> - The value, or an error naming the missing key
 */
pub fn get_env_or_throw(key: &str) -> anyhow::Result<String> {
    std::env::var(key).with_context(|| format!("{} must be set", key))
}

fn parse_env<T: std::str::FromStr>(key: &str, default: &str) -> anyhow::Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    get_env_var_or_default(key, default)
        .parse::<T>()
        .with_context(|| format!("{} has an invalid value", key))
}

/// Connection pool settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub sql_logging: bool,
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        DatabaseConfig {
            url: url.into(),
            max_connections: 10,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(30),
            sql_logging: false,
        }
    }

    /// Reads `DB_URL`, or composes it from the `DB_*` parts when it is unset.
    pub fn from_env() -> anyhow::Result<Self> {
        let url = match std::env::var("DB_URL") {
            Ok(url) => url,
            Err(_) => DbConnectParams {
                engine: get_env_var_or_default("DB_ENGINE", "postgres"),
                username: get_env_or_throw("DB_USER")?,
                password: get_env_or_throw("DB_PASSWORD")?,
                host: get_env_var_or_default("DB_HOST", "localhost"),
                port: parse_env("DB_PORT", "5432")?,
                dbname: get_env_or_throw("DB_NAME")?,
            }
            .to_url(),
        };

        Ok(DatabaseConfig {
            url,
            max_connections: parse_env("DB_MAX_CONNECTIONS", "10")?,
            min_connections: parse_env("DB_MIN_CONNECTIONS", "1")?,
            acquire_timeout: Duration::from_secs(parse_env("DB_ACQUIRE_TIMEOUT_SECS", "30")?),
            sql_logging: parse_env("DB_SQL_LOGGING", "false")?,
        })
    }
}

/// Hides the credentials part of a connection URL for logging.
pub fn mask_url(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}****{}", &url[..scheme_end + 3], &url[at..])
        }
        _ => url.to_string(),
    }
}
