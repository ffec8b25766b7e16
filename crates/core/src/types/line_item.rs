//! Cart line items.
//!
//! A [`NewLineItem`] is what the catalog hands to the cart; the cart turns it
//! into a [`LineItem`] by assigning a quantity. Field names match the JSON
//! layout used by the persisted cart (`id`, `title`, `image_url`, `price`,
//! `quantity`).

use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use super::{Price, ProductId};

/// A product as supplied by upstream callers, without a quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLineItem {
    pub id: ProductId,
    pub title: String,
    pub image_url: String,
    pub price: Price,
}

impl NewLineItem {
    /// Create a new product entry.
    #[must_use]
    pub fn new(
        id: ProductId,
        title: impl Into<String>,
        image_url: impl Into<String>,
        price: Price,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            image_url: image_url.into(),
            price,
        }
    }
}

/// One product entry in the cart.
///
/// The quantity is never zero: a line whose quantity would drop to zero is
/// removed from the cart instead, and deserialization rejects `0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: ProductId,
    pub title: String,
    pub image_url: String,
    pub price: Price,
    quantity: NonZeroU32,
}

impl LineItem {
    /// Create a line for `item` with a quantity of one.
    #[must_use]
    pub fn first(item: NewLineItem) -> Self {
        Self {
            id: item.id,
            title: item.title,
            image_url: item.image_url,
            price: item.price,
            quantity: NonZeroU32::MIN,
        }
    }

    /// Create a line with an explicit quantity.
    #[must_use]
    pub fn with_quantity(item: NewLineItem, quantity: NonZeroU32) -> Self {
        Self {
            quantity,
            ..Self::first(item)
        }
    }

    /// The number of units of this product in the cart (always at least one).
    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity.get()
    }

    /// Add one unit. Saturates at `u32::MAX`.
    pub fn increment(&mut self) {
        self.quantity = self.quantity.saturating_add(1);
    }

    /// Remove one unit.
    ///
    /// Returns `false` when the line held a single unit, meaning the caller
    /// must drop the line; the quantity is left unchanged in that case.
    #[must_use]
    pub fn decrement(&mut self) -> bool {
        match NonZeroU32::new(self.quantity.get() - 1) {
            Some(quantity) => {
                self.quantity = quantity;
                true
            }
            None => false,
        }
    }

    /// Add `other` units to this line. Saturates at `u32::MAX`.
    pub fn merge_quantity(&mut self, other: NonZeroU32) {
        self.quantity = self.quantity.saturating_add(other.get());
    }

    /// Overwrite the descriptive fields with the incoming product data,
    /// keeping the quantity.
    pub fn refresh(&mut self, item: NewLineItem) {
        self.title = item.title;
        self.image_url = item.image_url;
        self.price = item.price;
    }
}
