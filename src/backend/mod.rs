//! Backing-store transport

mod redis;

pub use redis::RedisBackend;

use std::fmt::Debug;

use async_trait::async_trait;

use crate::error::CacheError;

/// Transport to the backing key-value store
///
/// Works on fully-qualified keys and raw string payloads; namespacing and
/// serialization happen above this seam.
#[async_trait]
pub trait StoreBackend: Send + Sync + Debug {
    /// Reads a raw value, `None` if the store has no entry
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Writes a raw value with an expiry in seconds
    async fn set_ex(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), CacheError>;

    /// Deletes a batch of keys as a single atomic round trip
    async fn delete_many(&self, keys: &[String]) -> Result<(), CacheError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory backend for testing
    #[derive(Debug, Default)]
    pub struct MockBackend {
        entries: Mutex<HashMap<String, (String, u64)>>,
        error: Mutex<Option<String>>,
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        /// Seeds a raw entry, bypassing the serialization layer
        pub fn with_entry(self, key: &str, raw: &str, ttl_seconds: u64) -> Self {
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), (raw.to_string(), ttl_seconds));
            self
        }

        /// Makes every operation fail with a transport error
        pub fn with_error(self, error: impl Into<String>) -> Self {
            *self.error.lock().unwrap() = Some(error.into());
            self
        }

        pub fn len(&self) -> usize {
            self.entries.lock().unwrap().len()
        }

        pub fn ttl_of(&self, key: &str) -> Option<u64> {
            self.entries.lock().unwrap().get(key).map(|(_, ttl)| *ttl)
        }

        fn check_error(&self) -> Result<(), CacheError> {
            if let Some(error) = self.error.lock().unwrap().clone() {
                return Err(CacheError::transport(error));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl StoreBackend for MockBackend {
        async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
            self.check_error()?;
            let entries = self.entries.lock().unwrap();
            Ok(entries.get(key).map(|(raw, _)| raw.clone()))
        }

        async fn set_ex(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), CacheError> {
            self.check_error()?;
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), (value.to_string(), ttl_seconds));
            Ok(())
        }

        async fn delete_many(&self, keys: &[String]) -> Result<(), CacheError> {
            self.check_error()?;
            let mut entries = self.entries.lock().unwrap();
            for key in keys {
                entries.remove(key);
            }
            Ok(())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_mock_set_get_delete() {
            let backend = MockBackend::new();

            backend.set_ex("k", "v", 60).await.unwrap();
            assert_eq!(backend.get("k").await.unwrap(), Some("v".to_string()));
            assert_eq!(backend.ttl_of("k"), Some(60));

            backend.delete_many(&["k".to_string()]).await.unwrap();
            assert_eq!(backend.get("k").await.unwrap(), None);
        }

        #[tokio::test]
        async fn test_mock_with_error() {
            let backend = MockBackend::new().with_error("down");

            let result = backend.get("k").await;
            assert!(matches!(result, Err(CacheError::Transport { .. })));
        }
    }
}
