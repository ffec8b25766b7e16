//! Cart commands.
//!
//! # Environment Variables
//!
//! - `FLOATING_CART_DATA_DIR` - Directory holding the stored cart
//! - `FLOATING_CART_STORAGE_KEY` - Storage key of the cart

use std::fmt::Write as _;
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use floating_cart_core::{NewLineItem, Price, PriceError, ProductId, ProductIdError};
use floating_cart_store::{
    CartConfig, CartError, CartState, CartStore, ConfigError, FileStore, StorageError,
};

/// Errors that can occur while running a cart command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Storage could not be opened.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// The change could not be persisted.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Invalid product ID.
    #[error("Invalid product id: {0}")]
    InvalidId(#[from] ProductIdError),

    /// Invalid price.
    #[error("Invalid price: {0}")]
    InvalidPrice(#[from] PriceError),

    /// JSON output failed.
    #[error("Output error: {0}")]
    Output(#[from] serde_json::Error),
}

/// Open the stored cart and load its contents.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the data directory cannot
/// be created. Unreadable cart data is not an error; the cart starts empty.
pub async fn open() -> Result<CartStore, CommandError> {
    let config = CartConfig::from_env()?;
    let storage = FileStore::open(&config.data_dir).await?;
    info!(data_dir = %config.data_dir.display(), "Opening cart");

    let cart = CartStore::new(Arc::new(storage), config.store);
    let outcome = cart.initialize().await;
    info!(?outcome, lines = cart.len(), "Cart ready");
    Ok(cart)
}

/// Print the cart.
///
/// # Errors
///
/// Returns an error if JSON output fails.
pub fn show(cart: &CartStore, json: bool) -> Result<(), CommandError> {
    let state = cart.state();
    let output = if json {
        serde_json::to_string_pretty(state.products())?
    } else {
        render_table(&state)
    };

    #[allow(clippy::print_stdout)]
    {
        println!("{output}");
    }
    Ok(())
}

/// Add one unit of a product.
///
/// # Errors
///
/// Returns an error if the ID or price is invalid, or the cart cannot be saved.
pub async fn add(
    cart: &CartStore,
    id: &str,
    title: String,
    image_url: String,
    price: &str,
) -> Result<(), CommandError> {
    let item = NewLineItem::new(ProductId::parse(id)?, title, image_url, Price::parse(price)?);
    cart.add_to_cart(item);
    cart.flush().await?;
    info!(id, lines = cart.len(), "Added to cart");
    Ok(())
}

/// Add one unit to an existing line.
///
/// # Errors
///
/// Returns an error if the ID is invalid or the cart cannot be saved.
pub async fn increment(cart: &CartStore, id: &str) -> Result<(), CommandError> {
    let id = ProductId::parse(id)?;
    if !cart.increment(&id) {
        warn!(%id, "Product is not in the cart");
    }
    cart.flush().await?;
    Ok(())
}

/// Remove one unit from a line.
///
/// # Errors
///
/// Returns an error if the ID is invalid or the cart cannot be saved.
pub async fn decrement(cart: &CartStore, id: &str) -> Result<(), CommandError> {
    let id = ProductId::parse(id)?;
    if !cart.decrement(&id) {
        warn!(%id, "Product is not in the cart");
    }
    cart.flush().await?;
    Ok(())
}

/// Drop a line.
///
/// # Errors
///
/// Returns an error if the ID is invalid or the cart cannot be saved.
pub async fn remove(cart: &CartStore, id: &str) -> Result<(), CommandError> {
    let id = ProductId::parse(id)?;
    if !cart.remove(&id) {
        warn!(%id, "Product is not in the cart");
    }
    cart.flush().await?;
    Ok(())
}

/// Empty the cart.
///
/// # Errors
///
/// Returns an error if the cart cannot be saved.
pub async fn clear(cart: &CartStore) -> Result<(), CommandError> {
    cart.clear();
    cart.flush().await?;
    Ok(())
}

/// Render the cart as a plain-text table.
fn render_table(state: &CartState) -> String {
    let products = state.products();
    if products.is_empty() {
        return "Cart is empty".to_string();
    }

    // Padding in `format!` counts chars, so widths must too.
    let width = |text: &str| text.chars().count();
    let id_width = products
        .iter()
        .map(|p| width(p.id.as_str()))
        .max()
        .unwrap_or(0)
        .max(width("ID"));
    let title_width = products
        .iter()
        .map(|p| width(&p.title))
        .max()
        .unwrap_or(0)
        .max(width("TITLE"));

    let mut out = format!("{:<id_width$}  {:<title_width$}  {:>10}  QTY", "ID", "TITLE", "PRICE");
    for p in products {
        let _ = write!(
            out,
            "\n{:<id_width$}  {:<title_width$}  {:>10}  {}",
            p.id.as_str(),
            p.title,
            p.price.to_string(),
            p.quantity()
        );
    }
    let _ = write!(
        out,
        "\n{} line(s), {} unit(s)",
        products.len(),
        state.item_count()
    );
    out
}
