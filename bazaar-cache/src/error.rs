//! Error types for caching operations.

use thiserror::Error;

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Caching errors.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Redis client error
    #[cfg(feature = "redis")]
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Value could not be serialized for storage.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Stored payload could not be deserialized.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// Shared-store failure; absorbed by the fallback wrapper.
    #[error("cache connection error: {0}")]
    Connection(String),

    /// Invalid cache configuration.
    #[error("cache configuration error: {0}")]
    Config(String),
}

impl CacheError {
    /// Create a new serialization error.
    pub fn serialization<S: Into<String>>(msg: S) -> Self {
        Self::Serialization(msg.into())
    }

    /// Create a new deserialization error.
    pub fn deserialization<S: Into<String>>(msg: S) -> Self {
        Self::Deserialization(msg.into())
    }

    /// Create a new connection error.
    pub fn connection<S: Into<String>>(msg: S) -> Self {
        Self::Connection(msg.into())
    }

    /// Create a new configuration error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() {
            Self::Deserialization(err.to_string())
        } else {
            Self::Serialization(err.to_string())
        }
    }
}
