//! Scoped access to a shared cart.
//!
//! Components that are handed a [`CartStore`] directly do not need this
//! module. It serves component trees where descendants look shared services
//! up from their position in the tree: a [`CartProvider`] attaches a cart to
//! a [`Scope`], and [`use_cart`] finds the nearest provided cart by walking
//! up from the requesting scope.

use std::sync::Arc;

use crate::error::{CartError, Result};
use crate::store::CartStore;

/// A node in a component tree.
#[derive(Clone, Default)]
pub struct Scope {
    node: Arc<ScopeNode>,
}

#[derive(Default)]
struct ScopeNode {
    parent: Option<Scope>,
    cart: Option<CartStore>,
}

impl Scope {
    /// Create a root scope with nothing provided.
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// Create a child scope that inherits everything provided above it.
    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            node: Arc::new(ScopeNode {
                parent: Some(self.clone()),
                cart: None,
            }),
        }
    }

    /// Nearest cart provided at or above this scope.
    fn provided_cart(&self) -> Option<&CartStore> {
        let mut scope = Some(self);
        while let Some(current) = scope {
            if let Some(cart) = &current.node.cart {
                return Some(cart);
            }
            scope = current.node.parent.as_ref();
        }
        None
    }
}

impl std::fmt::Debug for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scope")
            .field("has_cart", &self.provided_cart().is_some())
            .finish_non_exhaustive()
    }
}

/// Makes one cart available to a scope and all of its descendants.
#[derive(Debug, Clone)]
pub struct CartProvider {
    store: CartStore,
}

impl CartProvider {
    /// Create a provider for `store`.
    #[must_use]
    pub const fn new(store: CartStore) -> Self {
        Self { store }
    }

    /// Create a child of `parent` in which the cart is available.
    #[must_use]
    pub fn provide(&self, parent: &Scope) -> Scope {
        Scope {
            node: Arc::new(ScopeNode {
                parent: Some(parent.clone()),
                cart: Some(self.store.clone()),
            }),
        }
    }
}

/// Get the cart provided to `scope`.
///
/// # Errors
///
/// Returns `CartError::Access` if no [`CartProvider`] covers `scope`.
pub fn use_cart(scope: &Scope) -> Result<CartStore> {
    scope
        .provided_cart()
        .cloned()
        .ok_or(CartError::Access("use_cart"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use floating_cart_core::{NewLineItem, Price, ProductId};

    use super::*;
    use crate::config::StoreOptions;
    use crate::storage::MemoryStore;

    fn cart() -> CartStore {
        CartStore::new(Arc::new(MemoryStore::new()), StoreOptions::default())
    }

    #[tokio::test]
    async fn test_use_cart_outside_provider_fails() {
        let root = Scope::root();
        let err = use_cart(&root.child()).unwrap_err();

        assert!(matches!(err, CartError::Access(_)));
        assert_eq!(err.to_string(), "use_cart must be used within a CartProvider");
    }

    #[tokio::test]
    async fn test_descendants_share_provided_cart() {
        let root = Scope::root();
        let provided = CartProvider::new(cart()).provide(&root);
        let screen = provided.child();
        let button = screen.child();

        use_cart(&button).unwrap().add_to_cart(NewLineItem::new(
            ProductId::parse("p1").unwrap(),
            "Shoe",
            "x",
            Price::parse("50").unwrap(),
        ));

        assert_eq!(use_cart(&screen).unwrap().len(), 1);
        assert!(use_cart(&root).is_err());
    }

    #[tokio::test]
    async fn test_nearest_provider_wins() {
        let root = Scope::root();
        let outer = CartProvider::new(cart()).provide(&root);
        let inner_cart = cart();
        let inner = CartProvider::new(inner_cart.clone()).provide(&outer.child());

        use_cart(&inner.child()).unwrap().clear();
        inner_cart.add_to_cart(NewLineItem::new(
            ProductId::parse("p1").unwrap(),
            "Shoe",
            "x",
            Price::parse("50").unwrap(),
        ));

        assert_eq!(use_cart(&inner).unwrap().len(), 1);
        assert_eq!(use_cart(&outer).unwrap().len(), 0);
    }
}
