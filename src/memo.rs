//! Memoization wrapper over the cache client

use std::future::Future;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::client::CacheClient;
use crate::error::CacheError;
use crate::key::memo_key;

/// Default TTL for memoized results (5 minutes)
pub const DEFAULT_MEMO_TTL_SECONDS: u64 = 300;

/// Default key modifier interleaved between encoded arguments
pub const DEFAULT_KEY_MODIFIER: &str = "cache";

/// A function whose results are transparently cached by argument value
///
/// Built with [`CacheClient::wrap`]. Each call derives a key from the
/// function name and the JSON encoding of the arguments; structurally equal
/// argument tuples map to the same key. Only a missing entry counts as a
/// miss, so legitimately falsy results (`0`, `false`, `""`) are served from
/// the cache rather than recomputed. Results are stored JSON-encoded
/// regardless of the client's serialization policy, since the entries are an
/// internal typed format rather than user-facing values.
///
/// There is no single-flight de-duplication: concurrent calls with the same
/// arguments before the first completes will each invoke the function and
/// each write the result, last write wins.
pub struct Memoized<F> {
    client: CacheClient,
    name: String,
    func: F,
    ttl_seconds: u64,
    key_modifier: String,
}

impl<F> Memoized<F> {
    pub(crate) fn new(client: CacheClient, name: String, func: F) -> Self {
        Self {
            client,
            name,
            func,
            ttl_seconds: DEFAULT_MEMO_TTL_SECONDS,
            key_modifier: DEFAULT_KEY_MODIFIER.to_string(),
        }
    }

    /// Sets the TTL for cached results
    pub fn ttl(mut self, seconds: u64) -> Self {
        self.ttl_seconds = seconds;
        self
    }

    /// Sets the key modifier, segregating entries from other wrappers of the
    /// same function
    pub fn key_modifier(mut self, modifier: impl Into<String>) -> Self {
        self.key_modifier = modifier.into();
        self
    }

    /// Invokes the wrapped function, serving a cached result when one exists
    ///
    /// On a miss the function runs and its result is stored best-effort: a
    /// failed write does not fail the call. Cache read failures propagate,
    /// matching the read contract of [`CacheClient::get`].
    pub async fn call<A, T, Fut>(&self, args: A) -> Result<T, CacheError>
    where
        A: Serialize,
        F: Fn(A) -> Fut,
        Fut: Future<Output = T>,
        T: Serialize + DeserializeOwned,
    {
        let key = memo_key(&self.name, &self.key_modifier, &args)?;

        if let Some(raw) = self.client.get_raw(&key).await? {
            match serde_json::from_str(&raw) {
                Ok(value) => {
                    debug!(name = %self.name, "memoized result served from cache");
                    return Ok(value);
                }
                // Undecodable entry (e.g. written under another type); fall
                // through and recompute.
                Err(_) => {}
            }
        }

        let result = (self.func)(args).await;

        // Entries are always stored JSON-encoded, independent of the
        // configured serialization policy, so the load above stays
        // symmetric with the store.
        match serde_json::to_string(&result) {
            Ok(raw) => {
                if let Err(error) = self.client.try_set_raw_ex(&key, &raw, self.ttl_seconds).await {
                    warn!(name = %self.name, %error, "memoized result not cached");
                }
            }
            Err(error) => {
                warn!(name = %self.name, %error, "memoized result not encodable");
            }
        }

        Ok(result)
    }
}
