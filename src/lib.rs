//! rcktcache
//!
//! Redis-backed external cache with support for:
//! - Lazy, idempotent connection establishment
//! - Namespaced get/set/delete with TTL expiration
//! - Pluggable structured (JSON) or plain-text serialization
//! - Atomic batch invalidation
//! - Memoization of arbitrary async functions keyed by argument value
//!
//! The cache is a best-effort accelerator, never a source of truth: writes
//! and deletes report failure as a boolean, reads distinguish a missing key
//! (`None`) from a stored falsy value.
//!
//! ```no_run
//! use rcktcache::{CacheClient, CacheConfig};
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), rcktcache::CacheError> {
//! let cache = CacheClient::new(CacheConfig::from_env().with_prefix("myapp"));
//!
//! cache.set_ex("user_42", &json!({"name": "Ann"}), 60).await;
//! let user = cache.get("user_42").await?;
//!
//! cache.delete_many(&["user_42", "user_43"]).await;
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod client;
pub mod config;
pub mod error;
pub mod key;
pub mod memo;
pub mod serialize;

pub use client::CacheClient;
pub use config::CacheConfig;
pub use error::CacheError;
pub use memo::Memoized;
