use std::{env, net::SocketAddr};

use thiserror::Error;

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_CACHE_TTL_SECONDS: u64 = 300;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Process configuration, read once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub database_url: String,
    /// No cache is used when unset.
    pub redis_url: Option<String>,
    pub bind_address: SocketAddr,
    pub database_max_connections: u32,
    pub cache_ttl_seconds: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL")
            .filter(|url| !url.is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        Ok(Self {
            database_url,
            redis_url: lookup("REDIS_URL").filter(|url| !url.is_empty()),
            bind_address: parse_or(&lookup, "BIND_ADDRESS", || {
                SocketAddr::from(([0, 0, 0, 0], 8000))
            })?,
            database_max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", || {
                DEFAULT_MAX_CONNECTIONS
            })?,
            cache_ttl_seconds: parse_or(&lookup, "CACHE_TTL_SECONDS", || {
                DEFAULT_CACHE_TTL_SECONDS
            })?,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: impl FnOnce() -> T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        None => Ok(default()),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}
