//! Cart line items and the product snapshots they carry.

use serde::{Deserialize, Serialize};

use crate::types::{Price, ProductId, VariantId};

/// Product display data copied into a line item when it is first added.
///
/// The cart never re-reads the catalog, so this can drift from the live
/// product (price changes, retitled products). Presentation code renders
/// whatever was captured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    /// Catalog product ID.
    pub id: ProductId,
    /// URL handle (e.g., "jute-area-rug").
    pub handle: String,
    /// Product title.
    pub title: String,
    /// Unit price at the time the product was added.
    pub price: Price,
    /// Original price, when the product was on sale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compare_at_price: Option<Price>,
    /// Primary product image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ProductImage>,
    /// Brand or maker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
}

/// Product image reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImage {
    /// Image URL.
    pub url: String,
    /// Alt text for accessibility.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,
}

/// One product (and optional variant) in the cart, with a quantity.
///
/// A cart holds at most one line per `(product_id, variant_id)` pair, and
/// every line has `quantity >= 1`. Both rules are maintained by
/// [`Cart::reduce`](super::Cart::reduce); nothing outside this crate can
/// construct a cart that breaks them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub(crate) product_id: ProductId,
    #[serde(default)]
    pub(crate) variant_id: Option<VariantId>,
    pub(crate) quantity: u32,
    pub(crate) product: ProductSnapshot,
}

impl LineItem {
    pub(crate) fn new(product: ProductSnapshot, variant_id: Option<VariantId>, quantity: u32) -> Self {
        Self {
            product_id: product.id.clone(),
            variant_id,
            quantity,
            product,
        }
    }

    /// Catalog product this line refers to.
    #[must_use]
    pub const fn product_id(&self) -> &ProductId {
        &self.product_id
    }

    /// Selected variant, or `None` for the product's default configuration.
    #[must_use]
    pub const fn variant_id(&self) -> Option<&VariantId> {
        self.variant_id.as_ref()
    }

    /// Number of units, always at least 1.
    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Product snapshot captured when the line was created.
    #[must_use]
    pub const fn product(&self) -> &ProductSnapshot {
        &self.product
    }

    /// Whether this line is keyed by `(product_id, variant_id)`.
    ///
    /// A missing variant only matches a line without a variant.
    #[must_use]
    pub fn matches(&self, product_id: &ProductId, variant_id: Option<&VariantId>) -> bool {
        self.product_id == *product_id && self.variant_id.as_ref() == variant_id
    }
}
