//! Cart state bound to a durable slot.

use tracing::{debug, warn};

use super::line_item::{LineItem, ProductSnapshot};
use super::reducer::{Cart, CartAction};
use super::slot::KeyValueSlot;
use crate::types::{ProductId, VariantId};

/// Slot key the cart snapshot is stored under.
pub const CART_STORAGE_KEY: &str = "cart";

/// Result of loading the persisted snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hydration {
    /// A valid snapshot was found and became the cart; holds its line count.
    Restored(usize),
    /// Nothing was stored.
    Missing,
    /// The stored value (or the slot read) failed and was ignored.
    Discarded,
}

/// Owns one session's cart and writes it to a [`KeyValueSlot`] after every
/// mutation.
///
/// The store starts unhydrated. Until [`CartStore::hydrate`] has run,
/// mutations change the in-memory cart only, so an empty startup state can
/// never overwrite a saved cart. A restored snapshot replaces anything applied
/// before hydration.
///
/// None of the operations fail. Slot errors and unreadable snapshots are
/// logged and otherwise ignored.
#[derive(Debug)]
pub struct CartStore<S: KeyValueSlot> {
    slot: S,
    cart: Cart,
    hydration: Option<Hydration>,
}

impl<S: KeyValueSlot> CartStore<S> {
    /// Create an unhydrated store with an empty cart.
    #[must_use]
    pub const fn new(slot: S) -> Self {
        Self {
            slot,
            cart: Cart::new(),
            hydration: None,
        }
    }

    /// Create a store and load the persisted cart.
    #[must_use]
    pub fn open(slot: S) -> Self {
        let mut store = Self::new(slot);
        store.hydrate();
        store
    }

    /// Load the persisted snapshot, once.
    ///
    /// Later calls return the first outcome without touching the slot. When
    /// the slot held nothing usable but the cart already has lines, or the
    /// stored value was discarded, the current cart is written back.
    pub fn hydrate(&mut self) -> Hydration {
        if let Some(outcome) = self.hydration {
            return outcome;
        }

        let outcome = match self.slot.get(CART_STORAGE_KEY) {
            Ok(None) => Hydration::Missing,
            Ok(Some(raw)) => match Cart::from_snapshot(&raw) {
                Ok(cart) => {
                    let lines = cart.len();
                    self.cart = cart;
                    Hydration::Restored(lines)
                }
                Err(e) => {
                    warn!(error = %e, "Discarding unreadable cart snapshot");
                    Hydration::Discarded
                }
            },
            Err(e) => {
                warn!(error = %e, "Failed to read cart snapshot");
                Hydration::Discarded
            }
        };

        debug!(?outcome, "Cart hydrated");
        self.hydration = Some(outcome);

        match outcome {
            Hydration::Restored(_) => {}
            Hydration::Missing if self.cart.is_empty() => {}
            Hydration::Missing | Hydration::Discarded => self.persist(),
        }

        outcome
    }

    /// Whether the initial load has completed.
    #[must_use]
    pub const fn is_hydrated(&self) -> bool {
        self.hydration.is_some()
    }

    /// Add `quantity` units of `product`.
    ///
    /// Merges into the existing line for `(product.id, variant_id)` if there
    /// is one, leaving its snapshot as it was. A quantity of 0 changes nothing.
    pub fn add_item(
        &mut self,
        product: ProductSnapshot,
        variant_id: Option<VariantId>,
        quantity: u32,
    ) {
        self.dispatch(CartAction::Add {
            product,
            variant_id,
            quantity,
        });
    }

    /// Remove the line keyed by `(product_id, variant_id)`, if present.
    pub fn remove_item(&mut self, product_id: &ProductId, variant_id: Option<&VariantId>) {
        self.dispatch(CartAction::Remove {
            product_id: product_id.clone(),
            variant_id: variant_id.cloned(),
        });
    }

    /// Set the quantity of an existing line.
    ///
    /// Zero or negative removes the line. A missing line is not created.
    pub fn update_quantity(
        &mut self,
        product_id: &ProductId,
        variant_id: Option<&VariantId>,
        quantity: i64,
    ) {
        self.dispatch(CartAction::UpdateQuantity {
            product_id: product_id.clone(),
            variant_id: variant_id.cloned(),
            quantity,
        });
    }

    /// Remove every line.
    pub fn clear_cart(&mut self) {
        self.dispatch(CartAction::Clear);
    }

    /// Apply `action`, then persist if hydrated.
    pub fn dispatch(&mut self, action: CartAction) {
        self.cart = std::mem::take(&mut self.cart).reduce(action);

        if self.is_hydrated() {
            self.persist();
        } else {
            debug!("Cart not hydrated yet, skipping persist");
        }
    }

    /// The current cart.
    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    /// The current line items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        self.cart.lines()
    }

    /// Borrow the underlying slot.
    #[must_use]
    pub const fn slot(&self) -> &S {
        &self.slot
    }

    /// Give back the slot, e.g. to flush it.
    #[must_use]
    pub fn into_slot(self) -> S {
        self.slot
    }

    fn persist(&mut self) {
        let snapshot = match self.cart.to_snapshot() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "Failed to encode cart snapshot");
                return;
            }
        };

        if let Err(e) = self.slot.set(CART_STORAGE_KEY, snapshot) {
            warn!(error = %e, "Failed to persist cart snapshot");
        } else {
            debug!(lines = self.cart.len(), "Cart persisted");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cart::line_item::tests::snapshot;
    use crate::cart::slot::MemorySlot;

    #[derive(Debug, thiserror::Error)]
    #[error("slot unavailable")]
    struct SlotUnavailable;

    /// Slot that records every write and can be told to fail.
    #[derive(Debug, Default)]
    struct RecordingSlot {
        inner: MemorySlot,
        writes: Vec<String>,
        fail_reads: bool,
        fail_writes: bool,
    }

    impl KeyValueSlot for RecordingSlot {
        type Error = SlotUnavailable;

        fn get(&self, key: &str) -> Result<Option<String>, Self::Error> {
            if self.fail_reads {
                return Err(SlotUnavailable);
            }
            Ok(self.inner.raw(key).map(str::to_owned))
        }

        fn set(&mut self, key: &str, value: String) -> Result<(), Self::Error> {
            if self.fail_writes {
                return Err(SlotUnavailable);
            }
            self.writes.push(value.clone());
            self.inner.set(key, value).map_err(|never| match never {})
        }
    }

    fn saved(lines: &[(&str, Option<&str>, u32)]) -> String {
        let mut cart = Cart::new();
        for (id, variant, quantity) in lines {
            cart = cart.reduce(CartAction::Add {
                product: snapshot(id, "Item", 1_000),
                variant_id: variant.map(VariantId::new),
                quantity: *quantity,
            });
        }
        cart.to_snapshot().unwrap()
    }

    #[test]
    fn test_open_empty_slot() {
        let mut store = CartStore::new(RecordingSlot::default());
        assert_eq!(store.hydrate(), Hydration::Missing);
        assert!(store.items().is_empty());
        // Nothing to write back for an empty cart
        assert!(store.slot().writes.is_empty());
    }

    #[test]
    fn test_open_restores_saved_cart() {
        let slot = MemorySlot::with_value(CART_STORAGE_KEY, saved(&[("P1", None, 2), ("P2", Some("oak"), 1)]));
        let mut store = CartStore::new(slot);

        assert_eq!(store.hydrate(), Hydration::Restored(2));
        assert_eq!(store.items().len(), 2);
        assert_eq!(store.items()[0].quantity(), 2);
        assert_eq!(store.items()[1].variant_id().map(VariantId::as_str), Some("oak"));
    }

    #[test]
    fn test_corrupt_snapshot_starts_empty_and_is_overwritten() {
        let slot = RecordingSlot {
            inner: MemorySlot::with_value(CART_STORAGE_KEY, "{{{ not a cart"),
            ..RecordingSlot::default()
        };
        let mut store = CartStore::new(slot);

        assert_eq!(store.hydrate(), Hydration::Discarded);
        assert!(store.items().is_empty());
        assert_eq!(store.slot().inner.raw(CART_STORAGE_KEY), Some("[]"));
    }

    #[test]
    fn test_read_failure_starts_empty() {
        let slot = RecordingSlot {
            fail_reads: true,
            ..RecordingSlot::default()
        };
        let store = CartStore::open(slot);
        assert!(store.is_hydrated());
        assert!(store.items().is_empty());
    }

    #[test]
    fn test_every_mutation_persists() {
        let mut store = CartStore::open(RecordingSlot::default());
        let rug = snapshot("P1", "Rug", 8_900);
        let p1 = ProductId::new("P1");

        store.add_item(rug.clone(), None, 2);
        store.add_item(rug, None, 1);
        store.update_quantity(&p1, None, 5);
        store.remove_item(&ProductId::new("P404"), None);
        store.clear_cart();

        let writes = &store.slot().writes;
        assert_eq!(writes.len(), 5);
        for (written, expected_qty) in writes.iter().zip([Some(2), Some(3), Some(5), Some(5), None]) {
            let cart = Cart::from_snapshot(written).unwrap();
            assert_eq!(cart.find(&p1, None).map(LineItem::quantity), expected_qty);
        }
        assert_eq!(store.slot().inner.raw(CART_STORAGE_KEY), Some("[]"));
    }

    #[test]
    fn test_no_persist_before_hydration() {
        let slot = MemorySlot::with_value(CART_STORAGE_KEY, saved(&[("P1", None, 4)]));
        let mut store = CartStore::new(slot);

        store.add_item(snapshot("P2", "Vase", 3_200), None, 1);
        store.clear_cart();

        // The saved cart was not touched by the early mutations
        let raw = store.slot().raw(CART_STORAGE_KEY).unwrap().to_owned();
        assert_eq!(raw, saved(&[("P1", None, 4)]));

        // and it wins over them once loaded
        assert_eq!(store.hydrate(), Hydration::Restored(1));
        assert_eq!(store.items()[0].product_id().as_str(), "P1");
        assert_eq!(store.items()[0].quantity(), 4);
    }

    #[test]
    fn test_early_mutations_written_when_nothing_saved() {
        let mut store = CartStore::new(RecordingSlot::default());
        store.add_item(snapshot("P2", "Vase", 3_200), None, 1);
        assert!(store.slot().writes.is_empty());

        assert_eq!(store.hydrate(), Hydration::Missing);
        assert_eq!(store.slot().writes.len(), 1);
        assert_eq!(store.items().len(), 1);
    }

    #[test]
    fn test_hydrate_is_idempotent() {
        let slot = MemorySlot::with_value(CART_STORAGE_KEY, saved(&[("P1", None, 1)]));
        let mut store = CartStore::open(slot);
        store.update_quantity(&ProductId::new("P1"), None, 9);

        assert_eq!(store.hydrate(), Hydration::Restored(1));
        assert_eq!(store.items()[0].quantity(), 9);
    }

    #[test]
    fn test_write_failure_keeps_memory_state() {
        let slot = RecordingSlot {
            fail_writes: true,
            ..RecordingSlot::default()
        };
        let mut store = CartStore::open(slot);
        store.add_item(snapshot("P1", "Rug", 8_900), Some(VariantId::new("red")), 1);

        assert_eq!(store.items().len(), 1);
        assert!(store.slot().inner.raw(CART_STORAGE_KEY).is_none());
    }

    #[test]
    fn test_persisted_state_reopens_equal() {
        let mut store = CartStore::open(MemorySlot::new());
        store.add_item(snapshot("P1", "Rug", 8_900), None, 2);
        store.add_item(snapshot("P3", "Throw", 5_400), Some(VariantId::new("sage")), 1);

        let before = store.cart().clone();
        let reopened = CartStore::open(store.into_slot());
        assert_eq!(reopened.cart(), &before);
    }

    #[test]
    fn test_borrowed_slot() {
        let mut slot = MemorySlot::new();
        {
            let mut store = CartStore::open(&mut slot);
            store.add_item(snapshot("P1", "Rug", 8_900), None, 1);
        }
        assert!(slot.raw(CART_STORAGE_KEY).is_some());
    }
}
