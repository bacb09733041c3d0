//! Shopping cart engine.
//!
//! # Layout
//!
//! - [`LineItem`] / [`ProductSnapshot`] - what a cart holds
//! - [`Cart`] / [`CartAction`] - the pure reducer (`Cart::reduce`)
//! - [`KeyValueSlot`] - host-supplied durable storage
//! - [`CartStore`] - a cart bound to a slot, persisted after every mutation
//!
//! # Example
//!
//! ```rust
//! use hearthloom_core::cart::{CartStore, MemorySlot, ProductSnapshot};
//! use hearthloom_core::{CurrencyCode, Price, ProductId, VariantId};
//! use rust_decimal::Decimal;
//!
//! let rug = ProductSnapshot {
//!     id: ProductId::new("P1"),
//!     handle: "jute-rug".to_string(),
//!     title: "Jute Rug".to_string(),
//!     price: Price::new(Decimal::new(8_900, 2), CurrencyCode::USD),
//!     compare_at_price: None,
//!     image: None,
//!     vendor: None,
//! };
//!
//! let mut store = CartStore::open(MemorySlot::new());
//! store.add_item(rug.clone(), None, 2);
//! store.add_item(rug, Some(VariantId::new("red")), 1);
//! store.update_quantity(&ProductId::new("P1"), Some(&VariantId::new("red")), 0);
//!
//! assert_eq!(store.items().len(), 1);
//! assert_eq!(store.items()[0].quantity(), 2);
//! ```

mod line_item;
mod reducer;
mod slot;
mod store;

pub use line_item::{LineItem, ProductImage, ProductSnapshot};
pub use reducer::{Cart, CartAction, SnapshotError};
pub use slot::{KeyValueSlot, MemorySlot};
pub use store::{CART_STORAGE_KEY, CartStore, Hydration};
