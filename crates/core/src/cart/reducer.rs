//! The cart value and its pure state transitions.
//!
//! [`Cart::reduce`] is the only place line items are created, merged or
//! dropped. It performs no I/O; [`CartStore`](super::CartStore) runs it and
//! then persists the result.

use std::collections::HashSet;

use serde::Serialize;
use thiserror::Error;

use super::line_item::{LineItem, ProductSnapshot};
use crate::types::{ProductId, VariantId};

/// Errors produced when decoding a persisted cart snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The value is not a JSON array of line items.
    #[error("malformed cart snapshot: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A line item carries quantity 0.
    #[error("line for product {product_id} has zero quantity")]
    ZeroQuantity {
        /// Product of the offending line.
        product_id: ProductId,
    },

    /// Two line items share the same `(product_id, variant_id)` key.
    #[error("duplicate line for product {product_id}")]
    DuplicateLine {
        /// Product of the repeated line.
        product_id: ProductId,
    },
}

/// A cart mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartAction {
    /// Add units of a product, merging with an existing line for the same key.
    Add {
        product: ProductSnapshot,
        variant_id: Option<VariantId>,
        quantity: u32,
    },
    /// Drop the line with exactly this key.
    Remove {
        product_id: ProductId,
        variant_id: Option<VariantId>,
    },
    /// Set a line's quantity; zero or negative removes the line.
    UpdateQuantity {
        product_id: ProductId,
        variant_id: Option<VariantId>,
        quantity: i64,
    },
    /// Remove every line.
    Clear,
}

/// Ordered list of line items, unique by `(product_id, variant_id)`.
///
/// Order is insertion order and only matters for display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Cart {
    lines: Vec<LineItem>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Line items in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    /// Iterate over line items in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, LineItem> {
        self.lines.iter()
    }

    /// Number of distinct lines (not units).
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Find the line keyed by `(product_id, variant_id)`.
    #[must_use]
    pub fn find(&self, product_id: &ProductId, variant_id: Option<&VariantId>) -> Option<&LineItem> {
        self.lines
            .iter()
            .find(|line| line.matches(product_id, variant_id))
    }

    fn find_mut(
        &mut self,
        product_id: &ProductId,
        variant_id: Option<&VariantId>,
    ) -> Option<&mut LineItem> {
        self.lines
            .iter_mut()
            .find(|line| line.matches(product_id, variant_id))
    }

    /// Apply an action and return the next cart.
    ///
    /// - `Add` with quantity 0 returns the cart unchanged.
    /// - `Add` on an existing key sums the quantities and keeps the original
    ///   snapshot.
    /// - `Remove` and `UpdateQuantity` on a missing key are no-ops.
    #[must_use]
    pub fn reduce(mut self, action: CartAction) -> Self {
        match action {
            CartAction::Add {
                product,
                variant_id,
                quantity,
            } => {
                if quantity == 0 {
                    return self;
                }
                if let Some(line) = self.find_mut(&product.id, variant_id.as_ref()) {
                    line.quantity = line.quantity.saturating_add(quantity);
                } else {
                    self.lines
                        .push(LineItem::new(product, variant_id, quantity));
                }
            }
            CartAction::Remove {
                product_id,
                variant_id,
            } => {
                self.lines
                    .retain(|line| !line.matches(&product_id, variant_id.as_ref()));
            }
            CartAction::UpdateQuantity {
                product_id,
                variant_id,
                quantity,
            } => {
                if quantity <= 0 {
                    return self.reduce(CartAction::Remove {
                        product_id,
                        variant_id,
                    });
                }
                let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
                if let Some(line) = self.find_mut(&product_id, variant_id.as_ref()) {
                    line.quantity = quantity;
                }
            }
            CartAction::Clear => self.lines.clear(),
        }
        self
    }

    /// Encode the cart as a JSON array of line items.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_snapshot(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.lines)
    }

    /// Decode a cart written by [`Cart::to_snapshot`].
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Malformed`] if the input is not a JSON array of
    /// line items, and [`SnapshotError::ZeroQuantity`] or
    /// [`SnapshotError::DuplicateLine`] if it decodes to a list that breaks
    /// the cart's invariants.
    pub fn from_snapshot(snapshot: &str) -> Result<Self, SnapshotError> {
        let lines: Vec<LineItem> = serde_json::from_str(snapshot)?;

        let mut seen = HashSet::with_capacity(lines.len());
        for line in &lines {
            if line.quantity == 0 {
                return Err(SnapshotError::ZeroQuantity {
                    product_id: line.product_id.clone(),
                });
            }
            if !seen.insert((&line.product_id, line.variant_id.as_ref())) {
                return Err(SnapshotError::DuplicateLine {
                    product_id: line.product_id.clone(),
                });
            }
        }

        Ok(Self { lines })
    }
}

impl<'a> IntoIterator for &'a Cart {
    type Item = &'a LineItem;
    type IntoIter = std::slice::Iter<'a, LineItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines.iter()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cart::line_item::tests::snapshot;

    fn add(product: &ProductSnapshot, variant: Option<&str>, quantity: u32) -> CartAction {
        CartAction::Add {
            product: product.clone(),
            variant_id: variant.map(VariantId::new),
            quantity,
        }
    }

    fn update(product_id: &str, variant: Option<&str>, quantity: i64) -> CartAction {
        CartAction::UpdateQuantity {
            product_id: ProductId::new(product_id),
            variant_id: variant.map(VariantId::new),
            quantity,
        }
    }

    fn remove(product_id: &str, variant: Option<&str>) -> CartAction {
        CartAction::Remove {
            product_id: ProductId::new(product_id),
            variant_id: variant.map(VariantId::new),
        }
    }

    #[test]
    fn test_add_merges_same_key() {
        let rug = snapshot("P1", "Rug", 8_900);
        let cart = Cart::new()
            .reduce(add(&rug, Some("red"), 2))
            .reduce(add(&rug, Some("red"), 3));

        assert_eq!(cart.len(), 1);
        assert_eq!(
            cart.find(&rug.id, Some(&VariantId::new("red")))
                .unwrap()
                .quantity(),
            5
        );
    }

    #[test]
    fn test_add_distinct_variants_are_separate_lines() {
        let rug = snapshot("P1", "Rug", 8_900);
        let cart = Cart::new()
            .reduce(add(&rug, None, 1))
            .reduce(add(&rug, Some("red"), 1))
            .reduce(add(&rug, Some("blue"), 1))
            .reduce(add(&rug, None, 4));

        assert_eq!(cart.len(), 3);
        let keys: Vec<_> = cart
            .iter()
            .map(|l| (l.product_id().as_str(), l.variant_id().map(VariantId::as_str)))
            .collect();
        assert_eq!(keys, vec![("P1", None), ("P1", Some("red")), ("P1", Some("blue"))]);
    }

    #[test]
    fn test_add_keeps_first_snapshot() {
        let original = snapshot("P1", "Rug", 8_900);
        let mut repriced = original.clone();
        repriced.title = "Jute Rug".to_string();
        repriced.price = snapshot("P1", "Rug", 12_000).price;

        let cart = Cart::new()
            .reduce(add(&original, None, 1))
            .reduce(add(&repriced, None, 1));

        let line = cart.find(&original.id, None).unwrap();
        assert_eq!(line.quantity(), 2);
        assert_eq!(line.product(), &original);
    }

    #[test]
    fn test_add_zero_quantity_is_noop() {
        let lamp = snapshot("P2", "Lamp", 4_500);
        let cart = Cart::new().reduce(add(&lamp, None, 0));
        assert!(cart.is_empty());

        let cart = cart.reduce(add(&lamp, None, 1)).reduce(add(&lamp, None, 0));
        assert_eq!(cart.find(&lamp.id, None).unwrap().quantity(), 1);
    }

    #[test]
    fn test_update_non_positive_removes() {
        let rug = snapshot("P1", "Rug", 8_900);
        let base = Cart::new()
            .reduce(add(&rug, None, 2))
            .reduce(add(&rug, Some("red"), 1));

        let zero = base.clone().reduce(update("P1", Some("red"), 0));
        let negative = base.clone().reduce(update("P1", Some("red"), -3));
        let removed = base.reduce(remove("P1", Some("red")));

        assert_eq!(zero, removed);
        assert_eq!(negative, removed);
        assert_eq!(removed.len(), 1);
        assert!(removed.find(&rug.id, None).is_some());
    }

    #[test]
    fn test_update_replaces_quantity_in_place() {
        let rug = snapshot("P1", "Rug", 8_900);
        let lamp = snapshot("P2", "Lamp", 4_500);
        let cart = Cart::new()
            .reduce(add(&rug, None, 2))
            .reduce(add(&lamp, None, 1))
            .reduce(update("P1", None, 7));

        assert_eq!(cart.lines()[0].quantity(), 7);
        assert_eq!(cart.lines()[0].product_id().as_str(), "P1");
        assert_eq!(cart.lines()[1].quantity(), 1);
    }

    #[test]
    fn test_update_missing_line_creates_nothing() {
        let cart = Cart::new().reduce(update("P404", None, 3));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_remove_requires_exact_variant() {
        let rug = snapshot("P1", "Rug", 8_900);
        let cart = Cart::new()
            .reduce(add(&rug, Some("red"), 1))
            .reduce(remove("P1", None));

        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let rug = snapshot("P1", "Rug", 8_900);
        let before = Cart::new().reduce(add(&rug, None, 2));
        let after = before.clone().reduce(remove("P2", None));
        assert_eq!(before, after);
    }

    #[test]
    fn test_clear() {
        let rug = snapshot("P1", "Rug", 8_900);
        let cart = Cart::new()
            .reduce(add(&rug, None, 2))
            .reduce(CartAction::Clear);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_snapshot_roundtrip_preserves_lines() {
        let mut rug = snapshot("P1", "Rug", 8_950);
        rug.vendor = Some("Loomhouse".to_string());
        rug.image = Some(crate::cart::ProductImage {
            url: "https://cdn.example.com/rug.jpg".to_string(),
            alt_text: Some("Hand-woven jute rug".to_string()),
        });
        let lamp = snapshot("P2", "Lamp", 4_500);

        let cart = Cart::new()
            .reduce(add(&rug, None, 2))
            .reduce(add(&lamp, Some("brass"), 1));

        let restored = Cart::from_snapshot(&cart.to_snapshot().unwrap()).unwrap();
        assert_eq!(restored, cart);
    }

    #[test]
    fn test_empty_snapshot_roundtrip() {
        let snapshot = Cart::new().to_snapshot().unwrap();
        assert_eq!(snapshot, "[]");
        assert!(Cart::from_snapshot(&snapshot).unwrap().is_empty());
    }

    #[test]
    fn test_every_add_sequence_keeps_keys_unique() {
        let products = [snapshot("P1", "Rug", 8_900), snapshot("P2", "Lamp", 4_500)];
        let variants = [None, Some("red")];
        let quantities = [0_u32, 1, 3];

        // Every (product, variant, quantity) choice, four adds deep
        let choices: Vec<(usize, usize, u32)> = (0..products.len())
            .flat_map(|p| (0..variants.len()).map(move |v| (p, v)))
            .flat_map(|(p, v)| quantities.iter().map(move |&q| (p, v, q)))
            .collect();

        for a in &choices {
            for b in &choices {
                for c in &choices {
                    for d in &choices {
                        let sequence = [a, b, c, d];
                        let cart = sequence.iter().fold(Cart::new(), |cart, &&(p, v, q)| {
                            cart.reduce(add(&products[p], variants[v], q))
                        });

                        let added: HashSet<_> = sequence
                            .iter()
                            .filter(|&&&(_, _, q)| q > 0)
                            .map(|&&(p, v, _)| (p, v))
                            .collect();
                        assert_eq!(cart.len(), added.len(), "after {sequence:?}");

                        let mut seen = HashSet::new();
                        for line in &cart {
                            assert!(
                                seen.insert((line.product_id(), line.variant_id())),
                                "duplicate line after {sequence:?}"
                            );

                            let expected: u32 = sequence
                                .iter()
                                .filter(|&&&(p, v, _)| {
                                    line.matches(&products[p].id, variants[v].map(VariantId::new).as_ref())
                                })
                                .map(|&&(_, _, q)| q)
                                .sum();
                            assert!(line.quantity() >= 1);
                            assert_eq!(line.quantity(), expected, "after {sequence:?}");
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_from_snapshot_rejects_garbage() {
        assert!(matches!(
            Cart::from_snapshot("{not json"),
            Err(SnapshotError::Malformed(_))
        ));
        assert!(matches!(
            Cart::from_snapshot(r#"{"items": []}"#),
            Err(SnapshotError::Malformed(_))
        ));
    }

    #[test]
    fn test_from_snapshot_rejects_broken_invariants() {
        let rug = snapshot("P1", "Rug", 8_900);
        let line = serde_json::to_value(LineItem::new(rug, None, 1)).unwrap();

        let mut zero = line.clone();
        zero["quantity"] = serde_json::json!(0);
        let raw = serde_json::to_string(&vec![zero]).unwrap();
        assert!(matches!(
            Cart::from_snapshot(&raw),
            Err(SnapshotError::ZeroQuantity { .. })
        ));

        let raw = serde_json::to_string(&vec![line.clone(), line]).unwrap();
        assert!(matches!(
            Cart::from_snapshot(&raw),
            Err(SnapshotError::DuplicateLine { .. })
        ));
    }

    #[test]
    fn test_negative_quantity_in_snapshot_is_malformed() {
        let rug = snapshot("P1", "Rug", 8_900);
        let mut line = serde_json::to_value(LineItem::new(rug, None, 1)).unwrap();
        line["quantity"] = serde_json::json!(-2);
        let raw = serde_json::to_string(&vec![line]).unwrap();
        assert!(matches!(
            Cart::from_snapshot(&raw),
            Err(SnapshotError::Malformed(_))
        ));
    }
}
