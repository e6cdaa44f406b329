use thiserror::Error;

/// Errors surfaced by the cache layer
#[derive(Debug, Error)]
pub enum CacheError {
    /// No connection handle could be produced. Defensive: implicit lazy
    /// initialization normally always constructs one.
    #[error("Cache not initialized: {message}")]
    NotInitialized { message: String },

    /// Failure surfaced by the backing store during a read, write or delete.
    #[error("Transport error: {message}")]
    Transport { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Value is not representable under the active serialization policy.
    #[error("Encode error: {message}")]
    Encode { message: String },
}

impl CacheError {
    pub fn not_initialized(message: impl Into<String>) -> Self {
        Self::NotInitialized {
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn encode(message: impl Into<String>) -> Self {
        Self::Encode {
            message: message.into(),
        }
    }
}
