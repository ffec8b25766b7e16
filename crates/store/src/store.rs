//! The cart state container.
//!
//! [`CartStore`] owns the ordered list of line items. Every mutation is an
//! atomic read-modify-write on the latest committed list, so two operations
//! fired back to back can never both start from the same stale cart. After a
//! mutation the new list is published on a `watch` channel; subscribers see
//! it immediately and a background worker writes it to the key-value store.
//!
//! # Persistence
//!
//! Writes are fire-and-forget from the caller's point of view. The worker
//! always writes the newest revision, so a burst of mutations may collapse
//! into one write, and an older cart is never written after a newer one.
//! Failed writes are retried a bounded number of times and then logged; the
//! in-memory cart is never rolled back. Use [`CartStore::flush`] to wait for
//! the current revision to reach storage.

use std::sync::Arc;

use tokio::sync::{OnceCell, watch};
use tokio::task::JoinHandle;
use tracing::instrument;

use floating_cart_core::{LineItem, NewLineItem, ProductId};

use crate::codec;
use crate::config::StoreOptions;
use crate::error::{CartError, Result};
use crate::storage::{KeyValueStore, StorageError};

/// A committed version of the cart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartState {
    revision: u64,
    products: Vec<LineItem>,
}

impl CartState {
    /// Number of mutations applied in this session. Loading the persisted
    /// cart does not count as a mutation.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Line items in insertion order.
    #[must_use]
    pub fn products(&self) -> &[LineItem] {
        &self.products
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.products.iter().map(|p| u64::from(p.quantity())).sum()
    }
}

/// What [`CartStore::initialize`] found in storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A stored cart with this many lines replaced the empty cart.
    Loaded(usize),
    /// Nothing was stored.
    Empty,
    /// Stored data could not be parsed and was ignored.
    Malformed,
    /// Storage could not be read.
    Unavailable,
    /// A stored cart was found but the cart had already been mutated, so the
    /// session state was kept.
    Superseded,
}

/// Outcome of the latest write attempted by the persistence worker.
#[derive(Debug, Clone, Default)]
struct Settled {
    revision: u64,
    failure: Option<Arc<StorageError>>,
}

/// Shared handle to a cart.
///
/// Cloning is cheap and every clone refers to the same cart, so the handle can
/// be passed to each component that reads or changes the cart.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartStoreInner>,
}

struct CartStoreInner {
    options: StoreOptions,
    storage: Arc<dyn KeyValueStore>,
    state: watch::Sender<CartState>,
    settled: watch::Receiver<Settled>,
    loaded: OnceCell<LoadOutcome>,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("CartStore")
            .field("storage_key", &self.inner.options.storage_key)
            .field("revision", &state.revision)
            .field("lines", &state.products.len())
            .finish_non_exhaustive()
    }
}

impl CartStore {
    /// Create an empty cart backed by `storage`.
    ///
    /// The persisted cart is not read here; call [`initialize`](Self::initialize)
    /// or [`spawn_initialize`](Self::spawn_initialize).
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime, since the persistence worker
    /// is spawned immediately.
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStore>, options: StoreOptions) -> Self {
        let (state, state_rx) = watch::channel(CartState::default());
        let (settled_tx, settled) = watch::channel(Settled::default());

        tokio::spawn(persist_worker(
            Arc::clone(&storage),
            options.clone(),
            state_rx,
            settled_tx,
        ));

        Self {
            inner: Arc::new(CartStoreInner {
                options,
                storage,
                state,
                settled,
                loaded: OnceCell::new(),
            }),
        }
    }

    /// Load the persisted cart.
    ///
    /// Runs once per store; later calls return the first outcome without
    /// touching storage. Missing, unreadable, or malformed data leaves the cart
    /// empty and is only logged. If the cart was mutated before loading
    /// finished, the stored cart is discarded in favour of the session state.
    #[instrument(skip(self), fields(key = %self.inner.options.storage_key))]
    pub async fn initialize(&self) -> LoadOutcome {
        *self.inner.loaded.get_or_init(|| self.load()).await
    }

    /// Run [`initialize`](Self::initialize) in the background.
    pub fn spawn_initialize(&self) -> JoinHandle<LoadOutcome> {
        let store = self.clone();
        tokio::spawn(async move { store.initialize().await })
    }

    /// Whether [`initialize`](Self::initialize) has completed.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.inner.loaded.initialized()
    }

    async fn load(&self) -> LoadOutcome {
        let key = &self.inner.options.storage_key;

        let raw = match self.inner.storage.get_item(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                tracing::info!("No stored cart, starting empty");
                return LoadOutcome::Empty;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read stored cart, starting empty");
                return LoadOutcome::Unavailable;
            }
        };

        let products = match codec::decode(&raw) {
            Ok(products) => products,
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring malformed stored cart");
                return LoadOutcome::Malformed;
            }
        };

        let lines = products.len();
        let applied = self.inner.state.send_if_modified(|state| {
            if state.revision > 0 {
                return false;
            }
            state.products = products;
            true
        });

        if applied {
            tracing::info!(lines, "Loaded stored cart");
            LoadOutcome::Loaded(lines)
        } else {
            tracing::warn!(lines, "Cart changed before load finished, keeping session cart");
            LoadOutcome::Superseded
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add one unit of `item`.
    ///
    /// An existing line with the same ID gains one unit and takes the
    /// incoming title, image and price. Otherwise the item is appended with a
    /// quantity of one.
    pub fn add_to_cart(&self, item: NewLineItem) {
        let id = item.id.clone();
        self.apply("add_to_cart", &id, move |products| {
            match products.iter_mut().find(|p| p.id == item.id) {
                Some(existing) => {
                    existing.increment();
                    existing.refresh(item);
                }
                None => products.push(LineItem::first(item)),
            }
            true
        });
    }

    /// Add one unit to the line for `id`. Returns `false` if there is no such line.
    pub fn increment(&self, id: &ProductId) -> bool {
        self.apply("increment", id, |products| {
            products.iter_mut().find(|p| p.id == *id).is_some_and(|p| {
                p.increment();
                true
            })
        })
    }

    /// Remove one unit from the line for `id`, dropping the line when its last
    /// unit goes. Returns `false` if there is no such line.
    pub fn decrement(&self, id: &ProductId) -> bool {
        self.apply("decrement", id, |products| {
            let Some(index) = products.iter().position(|p| p.id == *id) else {
                return false;
            };
            let keep = products.get_mut(index).is_some_and(LineItem::decrement);
            if !keep {
                products.remove(index);
            }
            true
        })
    }

    /// Drop the line for `id` whatever its quantity. Returns `false` if there
    /// is no such line.
    pub fn remove(&self, id: &ProductId) -> bool {
        self.apply("remove", id, |products| {
            let before = products.len();
            products.retain(|p| p.id != *id);
            products.len() != before
        })
    }

    /// Empty the cart.
    pub fn clear(&self) {
        let changed = self.inner.state.send_if_modified(|state| {
            if state.products.is_empty() {
                return false;
            }
            state.products.clear();
            state.revision += 1;
            true
        });
        tracing::debug!(changed, "clear");
    }

    /// Apply `mutate` to the latest cart. The revision only advances, and
    /// subscribers and the persistence worker are only woken, when `mutate`
    /// reports a change.
    fn apply<F>(&self, op: &'static str, id: &ProductId, mutate: F) -> bool
    where
        F: FnOnce(&mut Vec<LineItem>) -> bool,
    {
        let mut revision = 0;
        let changed = self.inner.state.send_if_modified(|state| {
            if !mutate(&mut state.products) {
                return false;
            }
            state.revision += 1;
            revision = state.revision;
            true
        });

        if changed {
            tracing::debug!(op, %id, revision, "Cart updated");
        } else {
            tracing::debug!(op, %id, "No matching line, cart unchanged");
        }
        changed
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Current line items in insertion order.
    #[must_use]
    pub fn products(&self) -> Vec<LineItem> {
        self.inner.state.borrow().products.clone()
    }

    /// Current committed cart state.
    #[must_use]
    pub fn state(&self) -> CartState {
        self.inner.state.borrow().clone()
    }

    /// The line for `id`, if present.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<LineItem> {
        self.inner
            .state
            .borrow()
            .products
            .iter()
            .find(|p| p.id == *id)
            .cloned()
    }

    /// Number of lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.state.borrow().products.len()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.state.borrow().products.is_empty()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.inner.state.borrow().item_count()
    }

    /// Receive every committed cart state, starting with the current one.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartState> {
        self.inner.state.subscribe()
    }

    // =========================================================================
    // Durability
    // =========================================================================

    /// Wait until the current revision has been written (or given up on).
    ///
    /// # Errors
    ///
    /// Returns `CartError::Persistence` carrying the storage error if the
    /// latest write failed after all retries, or if the persistence worker
    /// has stopped.
    #[instrument(skip(self))]
    pub async fn flush(&self) -> Result<()> {
        let target = self.inner.state.borrow().revision;
        let mut settled = self.inner.settled.clone();

        let outcome = settled
            .wait_for(|s| s.revision >= target)
            .await
            .map(|s| Settled::clone(&s))
            .map_err(|_| CartError::Persistence {
                revision: target,
                source: Arc::new(StorageError::Unavailable(
                    "persistence worker stopped".to_string(),
                )),
            })?;

        match outcome.failure {
            Some(source) => Err(CartError::Persistence {
                revision: outcome.revision,
                source,
            }),
            None => Ok(()),
        }
    }
}

/// Write each new cart revision to storage until the store is dropped.
async fn persist_worker(
    storage: Arc<dyn KeyValueStore>,
    options: StoreOptions,
    mut state: watch::Receiver<CartState>,
    settled: watch::Sender<Settled>,
) {
    let mut written = 0;

    while state.changed().await.is_ok() {
        let snapshot = CartState::clone(&state.borrow_and_update());
        if snapshot.revision <= written {
            // Loading the stored cart; nothing new to write.
            continue;
        }

        let failure = write_with_retry(storage.as_ref(), &options, &snapshot)
            .await
            .err()
            .map(Arc::new);
        written = snapshot.revision;
        settled.send_replace(Settled {
            revision: snapshot.revision,
            failure,
        });
    }

    tracing::debug!("Cart dropped, persistence worker exiting");
}

async fn write_with_retry(
    storage: &dyn KeyValueStore,
    options: &StoreOptions,
    snapshot: &CartState,
) -> std::result::Result<(), StorageError> {
    let key = options.storage_key.as_str();
    let value = codec::encode(&snapshot.products).map_err(|e| {
        tracing::error!(error = %e, revision = snapshot.revision, "Failed to encode cart");
        StorageError::from(e)
    })?;

    let mut attempt = 0;
    loop {
        match storage.set_item(key, &value).await {
            Ok(()) => {
                tracing::debug!(key, revision = snapshot.revision, "Cart persisted");
                return Ok(());
            }
            Err(e) if attempt < options.persist_retries => {
                attempt += 1;
                tracing::warn!(
                    key,
                    revision = snapshot.revision,
                    attempt,
                    error = %e,
                    "Cart write failed, retrying"
                );
                tokio::time::sleep(options.persist_backoff).await;
            }
            Err(e) => {
                tracing::error!(
                    key,
                    revision = snapshot.revision,
                    error = %e,
                    "Cart write failed, keeping in-memory cart"
                );
                return Err(e);
            }
        }
    }
}
