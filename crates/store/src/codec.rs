//! JSON encoding of the persisted cart.
//!
//! The stored value is a JSON array of line items in cart order. Decoding is
//! lenient line by line so that data written by older builds still loads:
//! lines that cannot be read or have a quantity of zero are dropped, and
//! repeated IDs are merged into the first occurrence. Only a value that is not
//! a JSON array is rejected as a whole.

use std::num::NonZeroU32;

use serde::Deserialize;

use floating_cart_core::{LineItem, NewLineItem, Price, ProductId};

/// A line item as found in storage, before the cart invariants are applied.
#[derive(Debug, Deserialize)]
struct StoredLine {
    id: ProductId,
    title: String,
    image_url: String,
    price: Price,
    quantity: u32,
}

/// Serialize the cart for storage.
///
/// # Errors
///
/// Returns `serde_json::Error` if serialization fails.
pub fn encode(products: &[LineItem]) -> Result<String, serde_json::Error> {
    serde_json::to_string(products)
}

/// Parse a stored cart and restore the cart invariants.
///
/// # Errors
///
/// Returns `serde_json::Error` if `raw` is not a JSON array.
pub fn decode(raw: &str) -> Result<Vec<LineItem>, serde_json::Error> {
    let stored: Vec<serde_json::Value> = serde_json::from_str(raw)?;
    let mut products: Vec<LineItem> = Vec::with_capacity(stored.len());

    for (index, value) in stored.into_iter().enumerate() {
        let line = match serde_json::from_value::<StoredLine>(value) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(index, error = %e, "Dropping unreadable stored line");
                continue;
            }
        };

        let Some(quantity) = NonZeroU32::new(line.quantity) else {
            tracing::debug!(id = %line.id, "Dropping stored line with zero quantity");
            continue;
        };

        if let Some(existing) = products.iter_mut().find(|p| p.id == line.id) {
            tracing::debug!(id = %line.id, "Merging duplicate stored line");
            existing.merge_quantity(quantity);
            continue;
        }

        let item = NewLineItem::new(line.id, line.title, line.image_url, line.price);
        products.push(LineItem::with_quantity(item, quantity));
    }

    Ok(products)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(id: &str, quantity: u32) -> LineItem {
        let item = NewLineItem::new(
            ProductId::parse(id).unwrap(),
            "Shoe",
            "x",
            Price::parse("50").unwrap(),
        );
        LineItem::with_quantity(item, NonZeroU32::new(quantity).unwrap())
    }

    #[test]
    fn test_decode_encoded_cart() {
        let products = vec![line("p1", 2), line("p2", 1)];
        let decoded = decode(&encode(&products).unwrap()).unwrap();
        assert_eq!(decoded, products);
    }

    #[test]
    fn test_decode_legacy_layout() {
        let raw = r#"[{"id":"p1","title":"Shoe","image_url":"x","price":50,"quantity":3}]"#;
        let decoded = decode(raw).unwrap();
        assert_eq!(decoded, vec![line("p1", 3)]);
    }

    #[test]
    fn test_decode_drops_zero_quantity() {
        let raw = r#"[
            {"id":"p1","title":"Shoe","image_url":"x","price":50,"quantity":0},
            {"id":"p2","title":"Shoe","image_url":"x","price":50,"quantity":1}
        ]"#;
        let decoded = decode(raw).unwrap();
        assert_eq!(decoded, vec![line("p2", 1)]);
    }

    #[test]
    fn test_decode_merges_duplicates_in_first_position() {
        let raw = r#"[
            {"id":"p1","title":"Shoe","image_url":"x","price":50,"quantity":1},
            {"id":"p2","title":"Shoe","image_url":"x","price":50,"quantity":1},
            {"id":"p1","title":"Shoe","image_url":"x","price":50,"quantity":2}
        ]"#;
        let decoded = decode(raw).unwrap();
        assert_eq!(decoded, vec![line("p1", 3), line("p2", 1)]);
    }

    #[test]
    fn test_decode_malformed() {
        assert!(decode("not json").is_err());
        assert!(decode(r#"{"id":"p1"}"#).is_err());
    }

    #[test]
    fn test_decode_skips_unreadable_lines() {
        let raw = r#"[
            {"id":"","title":"t","image_url":"x","price":1,"quantity":1},
            {"id":"p1","title":"Shoe","image_url":"x","price":50,"quantity":1},
            {"id":"p3","title":"Gold","image_url":"x","price":7.922816251426434e+28,"quantity":1},
            {"id":"p4","title":"Hat","image_url":"x","price":-2,"quantity":1},
            "junk",
            {"id":"p2","title":"Shoe","image_url":"x","price":50,"quantity":2}
        ]"#;
        let decoded = decode(raw).unwrap();
        assert_eq!(decoded, vec![line("p1", 1), line("p2", 2)]);
    }

    #[test]
    fn test_decode_keeps_long_ids() {
        let long = "p".repeat(300);
        let raw = format!(
            r#"[{{"id":"{long}","title":"Shoe","image_url":"x","price":50,"quantity":1}},
               {{"id":"p2","title":"Shoe","image_url":"x","price":50,"quantity":1}}]"#
        );
        let decoded = decode(&raw).unwrap();
        assert_eq!(decoded, vec![line(&long, 1), line("p2", 1)]);
    }

    #[test]
    fn test_encode_empty() {
        assert_eq!(encode(&[]).unwrap(), "[]");
    }
}
