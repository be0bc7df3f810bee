use std::str::FromStr;
use std::time::Duration;

use dotenvy::var;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} has an invalid value '{value}'")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
}

/// Credentials of the PayPal REST API used to capture approved card payments.
#[derive(Debug, Clone)]
pub struct PayPalConfig {
    pub url: String,
    pub client_id: String,
    pub secret: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub storage: StorageBackend,
    pub database_url: Option<String>,
    /// Shared store for parties and carts. Without it they live in process memory.
    pub redis_url: Option<String>,
    pub paypal: Option<PayPalConfig>,
    pub host: String,
    pub port: u16,
    pub jwt: JwtConfig,
    /// Inactivity window of personal and party carts.
    pub cart_ttl: Duration,
    pub event_channel_capacity: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let storage = parsed("APP_STORAGE", StorageBackend::Postgres)?;
        let database_url = var("DATABASE_URL").ok();
        if storage == StorageBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }
        let secret = var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?;

        Ok(Self {
            storage,
            database_url,
            redis_url: var("REDIS_URL").ok(),
            paypal: paypal_from_env()?,
            host: var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parsed("PORT", 8080)?,
            jwt: JwtConfig {
                secret,
                issuer: var("JWT_ISSUER").unwrap_or_else(|_| "restaurant-service".to_string()),
            },
            cart_ttl: Duration::from_secs(parsed("CART_TTL_SECS", 15 * 60)?),
            event_channel_capacity: parsed("EVENT_CHANNEL_CAPACITY", 256)?,
        })
    }

    /// Settings for an in-process instance, used by tests and local tooling.
    pub fn in_memory(jwt_secret: &str) -> Self {
        Self {
            storage: StorageBackend::Memory,
            database_url: None,
            redis_url: None,
            paypal: None,
            host: "127.0.0.1".to_string(),
            port: 0,
            jwt: JwtConfig {
                secret: jwt_secret.to_string(),
                issuer: "restaurant-service".to_string(),
            },
            cart_ttl: Duration::from_secs(15 * 60),
            event_channel_capacity: 256,
        }
    }
}

/// PayPal is optional, but a client id without its secret is a misconfiguration.
fn paypal_from_env() -> Result<Option<PayPalConfig>, ConfigError> {
    let Ok(client_id) = var("PAYPAL_CLIENT_ID") else {
        return Ok(None);
    };
    let secret = var("PAYPAL_SECRET").map_err(|_| ConfigError::Missing("PAYPAL_SECRET"))?;
    Ok(Some(PayPalConfig {
        url: var("PAYPAL_URL").unwrap_or_else(|_| "https://api-m.sandbox.paypal.com".to_string()),
        client_id,
        secret,
    }))
}

fn parsed<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        Err(_) => Ok(default),
    }
}
