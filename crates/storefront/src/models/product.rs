//! Catalog product types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use hearthloom_core::cart::{ProductImage, ProductSnapshot};
use hearthloom_core::{CurrencyCode, Price, ProductId};

/// A catalog product (domain type).
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub handle: String,
    pub title: String,
    pub vendor: Option<String>,
    pub price: Price,
    pub compare_at_price: Option<Price>,
    pub image: Option<ProductImage>,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Copy the display fields a cart line keeps.
    #[must_use]
    pub fn snapshot(&self) -> ProductSnapshot {
        ProductSnapshot {
            id: self.id.clone(),
            handle: self.handle.clone(),
            title: self.title.clone(),
            price: self.price,
            compare_at_price: self.compare_at_price,
            image: self.image.clone(),
            vendor: self.vendor.clone(),
        }
    }
}

/// Row shape of `storefront.product`.
#[derive(Debug, sqlx::FromRow)]
pub struct ProductRow {
    pub id: ProductId,
    pub handle: String,
    pub title: String,
    pub vendor: Option<String>,
    pub price: Decimal,
    pub compare_at_price: Option<Decimal>,
    pub currency_code: String,
    pub image_url: Option<String>,
    pub image_alt: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = String;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let currency: CurrencyCode = row.currency_code.parse()?;

        Ok(Self {
            id: row.id,
            handle: row.handle,
            title: row.title,
            vendor: row.vendor,
            price: Price::new(row.price, currency),
            compare_at_price: row.compare_at_price.map(|amount| Price::new(amount, currency)),
            image: row.image_url.map(|url| ProductImage {
                url,
                alt_text: row.image_alt,
            }),
            created_at: row.created_at,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn row() -> ProductRow {
        ProductRow {
            id: ProductId::new("P1"),
            handle: "jute-rug".to_string(),
            title: "Jute Rug".to_string(),
            vendor: Some("Loomhouse".to_string()),
            price: Decimal::new(8_900, 2),
            compare_at_price: Some(Decimal::new(11_000, 2)),
            currency_code: "usd".to_string(),
            image_url: Some("https://cdn.hearthloom.test/rug.jpg".to_string()),
            image_alt: Some("Jute rug in a sunlit room".to_string()),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_row_conversion() {
        let product = Product::try_from(row()).unwrap();
        assert_eq!(product.price.currency_code, CurrencyCode::USD);
        assert_eq!(product.compare_at_price.unwrap().amount, Decimal::new(11_000, 2));
        assert_eq!(
            product.image.unwrap().alt_text.as_deref(),
            Some("Jute rug in a sunlit room")
        );
    }

    #[test]
    fn test_row_with_unknown_currency() {
        let mut row = row();
        row.currency_code = "DOGE".to_string();
        assert!(Product::try_from(row).is_err());
    }

    #[test]
    fn test_snapshot_copies_display_fields() {
        let product = Product::try_from(row()).unwrap();
        let snapshot = product.snapshot();
        assert_eq!(snapshot.id, product.id);
        assert_eq!(snapshot.title, "Jute Rug");
        assert_eq!(snapshot.price, product.price);
        assert_eq!(snapshot.vendor.as_deref(), Some("Loomhouse"));
    }
}
