//! Key namespacing and memoization-key derivation

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::config::DEFAULT_PREFIX;
use crate::error::CacheError;

const SEPARATOR: char = '_';

/// Memoization keys longer than this are replaced by a digest
const MEMO_KEY_MAX_LEN: usize = 200;

/// Returns the fully-qualified store key for a logical key
///
/// Logical keys are passed through as-is: a key containing the separator is
/// not escaped, which can collide with another prefix/key combination. Known
/// limitation, kept for readability of stored keys.
pub fn namespace(prefix: &str, logical_key: &str) -> String {
    let prefix = if prefix.is_empty() { DEFAULT_PREFIX } else { prefix };
    format!("{prefix}{SEPARATOR}{logical_key}")
}

/// Derives a deterministic store key for a memoized call
///
/// The key concatenates the function identifier with each argument's JSON
/// encoding, interleaved with `modifier`, then base64-encodes the result so
/// it only contains store-key-safe characters. Structurally equal argument
/// tuples always produce the same key; the JSON encoding keeps values of
/// different types apart even when they render to the same text (`5` vs
/// `"5"`). Oversized keys are replaced by a SHA-256 digest of the same
/// concatenation to bound their length.
pub fn memo_key<A>(name: &str, modifier: &str, args: &A) -> Result<String, CacheError>
where
    A: Serialize + ?Sized,
{
    let encoded = serde_json::to_value(args)
        .map_err(|e| CacheError::encode(format!("Failed to encode memoization arguments: {e}")))?;

    // A tuple of arguments serializes to an array; anything else is treated
    // as a single argument.
    let parts = match encoded {
        Value::Array(items) => items,
        other => vec![other],
    };

    let mut plain = String::from(name);
    for part in &parts {
        plain.push_str(modifier);
        plain.push_str(&part.to_string());
    }

    let key = URL_SAFE_NO_PAD.encode(&plain);
    if key.len() > MEMO_KEY_MAX_LEN {
        let digest = hex::encode(Sha256::digest(plain.as_bytes()));
        return Ok(format!("{name}{SEPARATOR}{digest}"));
    }

    Ok(key)
}
