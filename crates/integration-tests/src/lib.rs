//! Integration tests for Hearthloom.
//!
//! # Running Tests
//!
//! ```bash
//! # Cart behavior against the core crate (no services needed)
//! cargo test -p hearthloom-integration-tests
//!
//! # HTTP tests against a running storefront with a seeded catalog
//! hl-cli migrate storefront
//! hl-cli seed catalog --file catalog.yaml
//! cargo test -p hearthloom-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_TEST_URL` - Storefront base URL (default: `http://127.0.0.1:3000`)
//! - `STOREFRONT_TEST_PRODUCT_ID` - An active catalog product id (default: `P1`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use rust_decimal::Decimal;

use hearthloom_core::cart::ProductSnapshot;
use hearthloom_core::{CurrencyCode, Price, ProductId};

/// Connection details for a running storefront.
#[derive(Debug, Clone)]
pub struct TestContext {
    pub client: reqwest::Client,
    pub storefront_url: String,
    pub product_id: String,
}

impl TestContext {
    /// Build a context from the environment with a fresh cookie jar.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_env() -> Result<Self, reqwest::Error> {
        let storefront_url = std::env::var("STOREFRONT_TEST_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:3000".to_string());
        let product_id =
            std::env::var("STOREFRONT_TEST_PRODUCT_ID").unwrap_or_else(|_| "P1".to_string());

        let client = reqwest::Client::builder().cookie_store(true).build()?;

        Ok(Self {
            client,
            storefront_url: storefront_url.trim_end_matches('/').to_string(),
            product_id,
        })
    }

    /// Absolute URL for `path` on the storefront.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.storefront_url)
    }
}

/// A USD product snapshot priced in cents.
#[must_use]
pub fn snapshot(id: &str, title: &str, cents: i64) -> ProductSnapshot {
    ProductSnapshot {
        id: ProductId::new(id),
        handle: title.to_lowercase().replace(' ', "-"),
        title: title.to_string(),
        price: Price::new(Decimal::new(cents, 2), CurrencyCode::USD),
        compare_at_price: None,
        image: None,
        vendor: None,
    }
}
