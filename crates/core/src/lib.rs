//! Hearthloom Core - Shared types and the cart engine.
//!
//! This crate provides the pieces shared across Hearthloom components:
//! - `storefront` - Public-facing catalog and cart service
//! - `cli` - Command-line tools for migrations and catalog seeding
//!
//! # Architecture
//!
//! The core crate contains only types, traits and pure logic - no database
//! access, no HTTP. Persistence reaches the cart through the
//! [`cart::KeyValueSlot`] trait, which each host implements over its own
//! storage.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs and prices
//! - [`cart`] - Line items, the cart reducer, and the persisted [`CartStore`]

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod types;

pub use cart::{Cart, CartAction, CartStore, KeyValueSlot, LineItem, MemorySlot, ProductSnapshot};
pub use types::*;
