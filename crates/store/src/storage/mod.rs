//! Persistent key-value storage for the cart.
//!
//! The cart only needs a single string slot, but storage is modelled as a
//! general string-keyed store so the same adapters can back other local
//! state. Two adapters are provided:
//!
//! - [`FileStore`] - one file per key inside a data directory
//! - [`MemoryStore`] - process-local map, used in tests and previews

mod file;
mod memory;

use async_trait::async_trait;
use thiserror::Error;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Errors raised by a [`KeyValueStore`].
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("I/O error for key {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// Cart could not be serialized before writing.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backing store refused the operation.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl StorageError {
    pub(crate) fn io(key: &str, source: std::io::Error) -> Self {
        Self::Io {
            key: key.to_string(),
            source,
        }
    }
}

/// Durable string-keyed storage surviving process restarts.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, or `None` if nothing is stored.
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
}
