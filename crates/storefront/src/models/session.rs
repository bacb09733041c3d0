//! Session-related types.

/// Session keys used by the storefront.
pub mod keys {
    /// Key holding the cart snapshot (a JSON array of line items).
    pub const CART: &str = hearthloom_core::cart::CART_STORAGE_KEY;
}
