//! Integration tests for Floating Cart.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p floating-cart-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_persistence` - Cart round trips through the file store
//! - `cart_provider` - Scoped cart access from a component tree
//!
//! Shared fixtures live in this crate so each test file stays focused on
//! behaviour.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use floating_cart_core::{NewLineItem, Price, ProductId};
use floating_cart_store::{CartStore, FileStore, StoreOptions};

/// Build a catalog product.
///
/// # Panics
///
/// Panics if `id` or `price` is invalid.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn product(id: &str, title: &str, price: &str) -> NewLineItem {
    NewLineItem::new(
        ProductId::parse(id).unwrap(),
        title,
        format!("https://cdn.example.com/{id}.png"),
        Price::parse(price).unwrap(),
    )
}

/// Parse a product ID.
///
/// # Panics
///
/// Panics if `id` is empty.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn id(id: &str) -> ProductId {
    ProductId::parse(id).unwrap()
}

/// Store options with a short retry backoff.
#[must_use]
pub fn test_options() -> StoreOptions {
    StoreOptions {
        persist_backoff: Duration::from_millis(1),
        ..StoreOptions::default()
    }
}

/// Open a cart over a file store in `dir` and load whatever is stored there.
///
/// # Panics
///
/// Panics if the directory cannot be used. Must run inside a tokio runtime.
#[allow(clippy::unwrap_used)]
pub async fn open_cart(dir: &Path) -> CartStore {
    let storage = FileStore::open(dir).await.unwrap();
    let cart = CartStore::new(Arc::new(storage), test_options());
    cart.initialize().await;
    cart
}
