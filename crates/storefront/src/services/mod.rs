//! Business logic services for storefront.
//!
//! # Services
//!
//! - `cart` - Session-backed cart persistence

pub mod cart;

pub use cart::{SessionSlot, load_cart, save_cart};
