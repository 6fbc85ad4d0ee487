use std::future::Future;

use redis::{aio::MultiplexedConnection, AsyncCommands, FromRedisValue, ToRedisArgs};
use redis_macros::{FromRedisValue, ToRedisArgs};
use serde::{Deserialize, Serialize};

use crate::{
    error::{ApiError, CacheError},
    schema::{Ingredient, Tag},
};

// Caching - keys

#[derive(Clone, Debug)]
pub struct CacheKey {
    _value: String,
    _type: CacheKeyType,
}

impl CacheKey {
    pub fn from<T: ToString>(r#type: CacheKeyType, key: T) -> Self {
        Self {
            _value: key.to_string(),
            _type: r#type,
        }
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self._type {
            CacheKeyType::Tags => write!(f, "tags-{}", self._value),
            CacheKeyType::IngredientSearch => {
                write!(f, "ingredient-search-{}", self._value.to_lowercase())
            }
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum CacheKeyType {
    Tags,
    IngredientSearch,
}

impl CacheKeyType {
    pub fn new<T: ToString>(self, key: T) -> CacheKey {
        CacheKey::from(self, key)
    }
}

// Cache - values

#[derive(Serialize, Deserialize, FromRedisValue, ToRedisArgs, Clone, Debug)]
pub struct CachedTags {
    pub tags: Vec<Tag>,
}

#[derive(Serialize, Deserialize, FromRedisValue, ToRedisArgs, Clone, Debug)]
pub struct CachedIngredients {
    pub ingredients: Vec<Ingredient>,
}

/// Optional read-through cache over the catalog. Without a connection every call goes
/// straight to `callback`.
#[derive(Clone)]
pub struct Cache {
    connection: Option<MultiplexedConnection>,
    ttl_seconds: u64,
}

impl Cache {
    pub fn new(connection: Option<MultiplexedConnection>, ttl_seconds: u64) -> Self {
        Self {
            connection,
            ttl_seconds,
        }
    }

    pub fn disabled() -> Self {
        Self::new(None, 0)
    }

    pub fn is_enabled(&self) -> bool {
        self.connection.is_some()
    }

    /// Cache failures are logged and fall through to `callback`; they never fail the request.
    pub async fn get_or<V, F, Fut>(&self, key: CacheKey, callback: F) -> Result<V, ApiError>
    where
        V: FromRedisValue + ToRedisArgs + Send + Sync,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, ApiError>>,
    {
        let mut cache = match &self.connection {
            Some(connection) => connection.clone(),
            None => return callback().await,
        };
        let key = key.to_string();

        match get_cache_value::<&str, V>(&key, &mut cache).await {
            Ok(Some(value)) => {
                log::trace!("> Found {key}");
                return Ok(value);
            }
            Ok(None) => {}
            Err(e) => {
                log::error!("> Failed to read cached value {key}, deleting it: {e}");
                if let Err(e) = delete_cache_value(&key, &mut cache).await {
                    log::error!("> Failed to delete cached value! {e}");
                }
            }
        }

        log::trace!("> Fetching {key}");
        let value = callback().await?;
        if let Err(e) = set_cache_value(&key, &value, self.ttl_seconds, &mut cache).await {
            log::error!("> Failed to cache {key}: {e}");
        }

        Ok(value)
    }
}

// Cache - raw handlers

pub async fn set_cache_value<K: ToRedisArgs + Send + Sync, V: ToRedisArgs + Send + Sync>(
    key: K,
    value: V,
    ttl_seconds: u64,
    cache: &mut MultiplexedConnection,
) -> Result<(), CacheError> {
    let _: () = cache.set_ex(key, value, ttl_seconds).await?;

    Ok(())
}

pub async fn delete_cache_value<K: ToRedisArgs + Send + Sync>(
    key: K,
    cache: &mut MultiplexedConnection,
) -> Result<(), CacheError> {
    let _: () = cache.del(key).await?;

    Ok(())
}

pub async fn get_cache_value<K: ToRedisArgs + Send + Sync, V: FromRedisValue>(
    key: K,
    cache: &mut MultiplexedConnection,
) -> Result<Option<V>, CacheError> {
    let value: Option<V> = cache.get(key).await?;

    Ok(value)
}
