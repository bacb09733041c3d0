//! Catalog repository.
//!
//! The storefront only reads the catalog. Queries are checked at runtime
//! (`query_as` with [`ProductRow`]) so the crate builds without a database.

use sqlx::PgPool;

use hearthloom_core::ProductId;

use super::RepositoryError;
use crate::models::product::{Product, ProductRow};

const PRODUCT_COLUMNS: &str = r"
    id, handle, title, vendor, price, compare_at_price, currency_code,
    image_url, image_alt, created_at
";

/// Repository for catalog product queries.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List active products, ordered by title.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a row has an unknown currency.
    pub async fn list_active(&self, limit: i64) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product WHERE active ORDER BY title LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(into_product).collect()
    }

    /// Get an active product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the row has an unknown currency.
    pub async fn get_active_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product WHERE id = $1 AND active"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(into_product).transpose()
    }

    /// Get an active product by its URL handle.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the row has an unknown currency.
    pub async fn get_active_by_handle(&self, handle: &str) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product WHERE handle = $1 AND active"
        ))
        .bind(handle)
        .fetch_optional(self.pool)
        .await?;

        row.map(into_product).transpose()
    }
}

fn into_product(row: ProductRow) -> Result<Product, RepositoryError> {
    let id = row.id.clone();
    Product::try_from(row)
        .map_err(|e| RepositoryError::DataCorruption(format!("product {id}: {e}")))
}
