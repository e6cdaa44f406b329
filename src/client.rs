//! Cache client: connection lifecycle and store operations

use std::sync::Arc;

#[cfg(test)]
use std::future::Future;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::warn;

use crate::backend::{RedisBackend, StoreBackend};
use crate::config::CacheConfig;
use crate::error::CacheError;
use crate::key;
use crate::memo::Memoized;
use crate::serialize;

/// Handle to the external cache
///
/// Owns the configuration and a lazily-created connection to the backing
/// store. Cloning is cheap and clones share the same connection. The
/// connection is established on the first operation (or an explicit
/// [`connect`](CacheClient::connect)); concurrent first callers suspend until
/// the one in-flight initialization finishes, so exactly one handle is ever
/// created per client.
///
/// The cache is a best-effort accelerator: writes and deletes report failure
/// as `false` instead of erroring, reads propagate transport failures.
#[derive(Clone, Debug)]
pub struct CacheClient {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    config: CacheConfig,
    backend: OnceCell<Arc<dyn StoreBackend>>,
    #[cfg(test)]
    backend_factory: Option<BackendFactory>,
}

#[cfg(test)]
type BoxedBackendFuture =
    std::pin::Pin<Box<dyn Future<Output = Result<Arc<dyn StoreBackend>, CacheError>> + Send>>;

/// Test-only hook replacing the Redis connect step
#[cfg(test)]
struct BackendFactory(Box<dyn Fn() -> BoxedBackendFuture + Send + Sync>);

#[cfg(test)]
impl std::fmt::Debug for BackendFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("<BackendFactory>")
    }
}

impl CacheClient {
    /// Creates a client with the given configuration
    ///
    /// No connection is made until the first operation.
    pub fn new(config: CacheConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                backend: OnceCell::new(),
                #[cfg(test)]
                backend_factory: None,
            }),
        }
    }

    /// Creates a client configured from environment variables
    pub fn from_env() -> Self {
        Self::new(CacheConfig::from_env())
    }

    #[cfg(test)]
    pub(crate) fn with_backend(config: CacheConfig, backend: Arc<dyn StoreBackend>) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                backend: OnceCell::new_with(Some(backend)),
                backend_factory: None,
            }),
        }
    }

    /// Creates an unconnected client whose lazy connect step runs `factory`
    /// instead of opening a Redis connection
    #[cfg(test)]
    pub(crate) fn with_backend_factory<F, Fut>(config: CacheConfig, factory: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Arc<dyn StoreBackend>, CacheError>> + Send + 'static,
    {
        Self {
            inner: Arc::new(Inner {
                config,
                backend: OnceCell::new(),
                backend_factory: Some(BackendFactory(Box::new(move || Box::pin(factory())))),
            }),
        }
    }

    /// Returns the resolved configuration
    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    /// Eagerly establishes the store connection
    ///
    /// Idempotent: once connected this returns immediately, and concurrent
    /// callers collapse onto a single connection attempt.
    pub async fn connect(&self) -> Result<(), CacheError> {
        self.backend().await.map(|_| ())
    }

    /// Returns whether a store connection has been established yet
    pub fn is_connected(&self) -> bool {
        self.inner.backend.initialized()
    }

    async fn backend(&self) -> Result<&Arc<dyn StoreBackend>, CacheError> {
        self.inner
            .backend
            .get_or_try_init(|| self.make_backend())
            .await
    }

    async fn make_backend(&self) -> Result<Arc<dyn StoreBackend>, CacheError> {
        #[cfg(test)]
        if let Some(factory) = &self.inner.backend_factory {
            return (factory.0)().await;
        }

        let backend = RedisBackend::connect(&self.inner.config).await?;
        Ok(Arc::new(backend) as Arc<dyn StoreBackend>)
    }

    fn namespaced(&self, key: &str) -> String {
        key::namespace(&self.inner.config.prefix, key)
    }

    /// Reads a value from the cache
    ///
    /// Returns `None` when the store has no entry for the key (including
    /// entries removed by TTL expiry); a missing key is never an error. In
    /// structured mode the stored string is parsed as JSON, falling back to
    /// the raw string when it does not parse. Transport failures propagate.
    pub async fn get(&self, key: &str) -> Result<Option<Value>, CacheError> {
        let raw = self.get_raw(key).await?;
        Ok(raw.map(|raw| serialize::decode(raw, self.inner.config.structured)))
    }

    /// Reads the raw stored string without decoding
    pub async fn get_raw(&self, key: &str) -> Result<Option<String>, CacheError> {
        let full_key = self.namespaced(key);
        self.backend().await?.get(&full_key).await
    }

    /// Writes a value with the configured default TTL
    ///
    /// Never fails: any error is logged and reported as `false`. Callers
    /// needing the failure detail use [`try_set`](CacheClient::try_set).
    pub async fn set<V>(&self, key: &str, value: &V) -> bool
    where
        V: Serialize + ?Sized,
    {
        self.set_ex(key, value, self.inner.config.default_ttl_seconds)
            .await
    }

    /// Writes a value with an explicit TTL, reporting failure as `false`
    pub async fn set_ex<V>(&self, key: &str, value: &V, ttl_seconds: u64) -> bool
    where
        V: Serialize + ?Sized,
    {
        match self.try_set_ex(key, value, ttl_seconds).await {
            Ok(()) => true,
            Err(error) => {
                warn!(key, %error, "cache write failed");
                false
            }
        }
    }

    /// Writes a value with the configured default TTL
    pub async fn try_set<V>(&self, key: &str, value: &V) -> Result<(), CacheError>
    where
        V: Serialize + ?Sized,
    {
        self.try_set_ex(key, value, self.inner.config.default_ttl_seconds)
            .await
    }

    /// Writes a value with an explicit TTL
    pub async fn try_set_ex<V>(&self, key: &str, value: &V, ttl_seconds: u64) -> Result<(), CacheError>
    where
        V: Serialize + ?Sized,
    {
        let payload = serialize::encode(value, self.inner.config.structured)?;
        let full_key = self.namespaced(key);
        self.backend().await?.set_ex(&full_key, &payload, ttl_seconds).await
    }

    /// Writes an already-encoded payload, bypassing the serialization policy
    ///
    /// Used for memoization entries, which carry their own typed JSON format
    /// independent of the configured policy.
    pub(crate) async fn try_set_raw_ex(
        &self,
        key: &str,
        raw: &str,
        ttl_seconds: u64,
    ) -> Result<(), CacheError> {
        let full_key = self.namespaced(key);
        self.backend().await?.set_ex(&full_key, raw, ttl_seconds).await
    }

    /// Deletes a single key, reporting failure as `false`
    pub async fn delete(&self, key: &str) -> bool {
        self.delete_many(&[key]).await
    }

    /// Deletes a batch of keys, reporting failure as `false`
    pub async fn delete_many<K>(&self, keys: &[K]) -> bool
    where
        K: AsRef<str> + Sync,
    {
        match self.try_delete_many(keys).await {
            Ok(()) => true,
            Err(error) => {
                warn!(%error, "cache delete failed");
                false
            }
        }
    }

    /// Deletes a single key
    pub async fn try_delete(&self, key: &str) -> Result<(), CacheError> {
        self.try_delete_many(&[key]).await
    }

    /// Deletes a batch of keys in one atomic round trip
    ///
    /// No partial-success reporting: if the batch errors the caller cannot
    /// tell which subset was removed.
    pub async fn try_delete_many<K>(&self, keys: &[K]) -> Result<(), CacheError>
    where
        K: AsRef<str> + Sync,
    {
        let full_keys: Vec<String> = keys.iter().map(|k| self.namespaced(k.as_ref())).collect();
        self.backend().await?.delete_many(&full_keys).await
    }

    /// Wraps a function so its results are cached by argument value
    ///
    /// `name` must be a stable identifier for the function; it is part of
    /// every derived key.
    pub fn wrap<F>(&self, name: impl Into<String>, func: F) -> Memoized<F> {
        Memoized::new(self.clone(), name.into(), func)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::MockBackend;
    use serde_json::json;

    fn client_with(backend: MockBackend) -> CacheClient {
        CacheClient::with_backend(CacheConfig::default(), Arc::new(backend))
    }

    #[tokio::test]
    async fn test_injected_backend_counts_as_connected() {
        let lazy = CacheClient::new(CacheConfig::default());
        assert!(!lazy.is_connected());

        let client = client_with(MockBackend::new());
        assert!(client.is_connected());

        // connect() is a no-op once a backend exists
        client.connect().await.unwrap();
        assert!(client.is_connected());
    }

    #[tokio::test]
    async fn test_concurrent_first_callers_share_one_connection() {
        use std::sync::atomic::{AtomicU32, Ordering};
        use std::time::Duration;

        let connects = Arc::new(AtomicU32::new(0));
        let counter = connects.clone();

        let client = CacheClient::with_backend_factory(CacheConfig::default(), move || {
            let counter = counter.clone();
            async move {
                // Hold initialization open long enough for the other
                // callers to pile up behind it
                tokio::time::sleep(Duration::from_millis(20)).await;
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Arc::new(MockBackend::new()) as Arc<dyn StoreBackend>)
            }
        });
        assert!(!client.is_connected());

        let mut handles = Vec::new();
        for i in 0..8 {
            let client = client.clone();
            handles.push(tokio::spawn(async move {
                if i % 2 == 0 {
                    client.connect().await
                } else {
                    client.get("k").await.map(|_| ())
                }
            }));
        }

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(connects.load(Ordering::SeqCst), 1);
        assert!(client.is_connected());
    }

    #[tokio::test]
    async fn test_set_then_get_roundtrip() {
        let client = client_with(MockBackend::new());

        assert!(client.set_ex("user_42", &json!({"name": "Ann"}), 60).await);

        let value = client.get("user_42").await.unwrap();
        assert_eq!(value, Some(json!({"name": "Ann"})));
    }

    #[tokio::test]
    async fn test_get_missing_returns_absent() {
        let client = client_with(MockBackend::new());

        let value = client.get("never_written").await.unwrap();
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn test_delete_then_get_returns_absent() {
        let client = client_with(MockBackend::new());

        client.set("user_42", &json!({"name": "Ann"})).await;
        assert!(client.delete("user_42").await);

        let value = client.get("user_42").await.unwrap();
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn test_delete_many_removes_all() {
        let client = client_with(MockBackend::new());

        for key in ["a", "b", "c"] {
            client.set(key, &1).await;
        }

        assert!(client.delete_many(&["a", "b", "c"]).await);

        for key in ["a", "b", "c"] {
            assert_eq!(client.get(key).await.unwrap(), None);
        }
    }

    #[tokio::test]
    async fn test_keys_are_namespaced() {
        let backend = MockBackend::new();
        let client = CacheClient::with_backend(
            CacheConfig::default().with_prefix("myapp"),
            Arc::new(backend),
        );

        client.set("user_42", &1).await;

        let raw = client.get_raw("user_42").await.unwrap();
        assert_eq!(raw, Some("1".to_string()));

        // A client with a different prefix does not see the entry
        let other = client_with(MockBackend::new());
        assert_eq!(other.get("user_42").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_uses_default_ttl() {
        let backend = Arc::new(MockBackend::new());
        let client = CacheClient::with_backend(CacheConfig::default(), backend.clone());

        client.set("k", &1).await;
        assert_eq!(backend.ttl_of("rcktcache_k"), Some(900));

        client.set_ex("k2", &1, 60).await;
        assert_eq!(backend.ttl_of("rcktcache_k2"), Some(60));
    }

    #[tokio::test]
    async fn test_set_swallows_failure_to_false() {
        let client = client_with(MockBackend::new().with_error("store down"));

        assert!(!client.set("k", &1).await);
        assert!(!client.delete("k").await);
    }

    #[tokio::test]
    async fn test_try_set_reports_failure_detail() {
        let client = client_with(MockBackend::new().with_error("store down"));

        let result = client.try_set("k", &1).await;
        assert!(matches!(result, Err(CacheError::Transport { .. })));
    }

    #[tokio::test]
    async fn test_get_propagates_transport_failure() {
        let client = client_with(MockBackend::new().with_error("store down"));

        let result = client.get("k").await;
        assert!(matches!(result, Err(CacheError::Transport { .. })));
    }

    #[tokio::test]
    async fn test_get_falls_back_to_raw_string() {
        // Entry stored as plain text while structured mode is on
        let backend = MockBackend::new().with_entry("rcktcache_k", "plain", 60);
        let client = client_with(backend);

        let value = client.get("k").await.unwrap();
        assert_eq!(value, Some(Value::String("plain".to_string())));
    }

    #[tokio::test]
    async fn test_falsy_values_are_not_absent() {
        let client = client_with(MockBackend::new());

        client.set("zero", &0).await;
        client.set("empty", &"").await;

        assert_eq!(client.get("zero").await.unwrap(), Some(json!(0)));
        assert_eq!(client.get("empty").await.unwrap(), Some(json!("")));
    }

    #[tokio::test]
    async fn test_plain_mode_rejects_object_writes() {
        let backend = MockBackend::new();
        let client = CacheClient::with_backend(
            CacheConfig::default().with_structured(false),
            Arc::new(backend),
        );

        assert!(!client.set("k", &json!({"a": 1})).await);
        assert!(client.set("k", &"text").await);
        assert_eq!(
            client.get("k").await.unwrap(),
            Some(Value::String("text".to_string()))
        );
    }
}
