//! Floating Cart Store - Cart state synchronized to local storage.
//!
//! The cart is an ordered list of line items held in memory and mirrored to a
//! single slot of a persistent key-value store:
//!
//! 1. The cart starts empty and loads the stored cart once in the background.
//! 2. Every mutation updates the in-memory cart immediately.
//! 3. A background worker writes the new cart to storage.
//!
//! The in-memory cart is the source of truth for the running session; storage
//! failures are logged and never undo a mutation.
//!
//! # Modules
//!
//! - [`store`] - The [`CartStore`] handle and its operations
//! - [`storage`] - Key-value storage trait with file and in-memory adapters
//! - [`provider`] - Scoped lookup of a shared cart
//! - [`config`] - Environment-driven configuration
//! - [`codec`] - JSON layout of the stored cart
//! - [`error`] - Error types
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use floating_cart_core::{NewLineItem, Price, ProductId};
//! use floating_cart_store::{CartConfig, CartStore, FileStore};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CartConfig::from_env()?;
//! let storage = FileStore::open(&config.data_dir).await?;
//! let cart = CartStore::new(Arc::new(storage), config.store);
//! cart.spawn_initialize();
//!
//! cart.add_to_cart(NewLineItem::new(
//!     ProductId::parse("p1")?,
//!     "Shoe",
//!     "https://cdn.example.com/shoe.png",
//!     Price::parse("50")?,
//! ));
//! cart.flush().await?;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod codec;
pub mod config;
pub mod error;
pub mod provider;
pub mod storage;
pub mod store;

pub use config::{CartConfig, ConfigError, StoreOptions};
pub use error::CartError;
pub use provider::{CartProvider, Scope, use_cart};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
pub use store::{CartState, CartStore, LoadOutcome};
