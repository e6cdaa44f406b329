//! Redis transport implementation

use std::fmt;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use tracing::debug;

use crate::config::CacheConfig;
use crate::error::CacheError;

use super::StoreBackend;

/// Redis-backed transport
///
/// Holds a single multiplexed connection via `ConnectionManager`, which
/// queues commands issued before the connection is ready and reconnects on
/// failure. Timeout and retry policy live in the transport, not here.
#[derive(Clone)]
pub struct RedisBackend {
    connection: ConnectionManager,
}

impl fmt::Debug for RedisBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisBackend")
            .field("connection", &"<ConnectionManager>")
            .finish()
    }
}

impl RedisBackend {
    /// Opens a connection to the store described by the configuration
    pub async fn connect(config: &CacheConfig) -> Result<Self, CacheError> {
        let url = config.connection_url();

        let client = Client::open(url.as_str())
            .map_err(|e| CacheError::configuration(format!("Failed to create Redis client: {e}")))?;

        let connection = ConnectionManager::new(client)
            .await
            .map_err(|e| CacheError::transport(format!("Failed to connect to Redis: {e}")))?;

        debug!(host = %config.host, port = config.port, "connected to cache store");

        Ok(Self { connection })
    }
}

#[async_trait]
impl StoreBackend for RedisBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.connection.clone();

        let result: Option<String> = conn
            .get(key)
            .await
            .map_err(|e| CacheError::transport(format!("Failed to get key '{key}': {e}")))?;

        Ok(result)
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), CacheError> {
        let mut conn = self.connection.clone();

        let _: () = conn
            .set_ex(key, value, ttl_seconds.max(1))
            .await
            .map_err(|e| CacheError::transport(format!("Failed to set key '{key}': {e}")))?;

        Ok(())
    }

    async fn delete_many(&self, keys: &[String]) -> Result<(), CacheError> {
        if keys.is_empty() {
            return Ok(());
        }

        let mut conn = self.connection.clone();

        // Single MULTI/EXEC round trip: one dispatch for the whole batch
        let mut pipe = redis::pipe();
        pipe.atomic();
        for key in keys {
            pipe.del(key).ignore();
        }

        let _: () = pipe
            .query_async(&mut conn)
            .await
            .map_err(|e| CacheError::transport(format!("Failed to delete {} keys: {e}", keys.len())))?;

        Ok(())
    }
}
