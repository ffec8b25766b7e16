//! Cart error type.

use std::sync::Arc;

use thiserror::Error;

use crate::storage::StorageError;

/// Errors surfaced by the cart.
///
/// Persistence failures during normal mutations are logged rather than
/// returned; they only reach callers through [`CartStore::flush`].
///
/// [`CartStore::flush`]: crate::CartStore::flush
#[derive(Debug, Error)]
pub enum CartError {
    /// The cart was requested from a scope with no `CartProvider` above it.
    #[error("{0} must be used within a CartProvider")]
    Access(&'static str),

    /// The latest cart revision could not be written.
    #[error("cart revision {revision} was not persisted: {source}")]
    Persistence {
        revision: u64,
        #[source]
        source: Arc<StorageError>,
    },
}

/// Result type alias for `CartError`.
pub type Result<T> = std::result::Result<T, CartError>;
