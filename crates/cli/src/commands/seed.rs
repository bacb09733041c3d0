//! Seed the storefront catalog from a YAML file.
//!
//! ```yaml
//! products:
//!   - id: P1
//!     handle: wool-rug
//!     title: Wool Rug
//!     vendor: Hearthloom
//!     price: "89.00"
//!     currency_code: USD
//!     image_url: https://cdn.example.com/rug.jpg
//! ```
//!
//! Rows are upserted by `id`, so re-running a file updates prices and titles
//! in place. Carts already holding a product keep their old snapshot.

use std::collections::HashSet;
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::{error, info};

use hearthloom_core::CurrencyCode;
use hearthloom_storefront::db;

use super::migrate::storefront_database_url;

/// Top-level catalog file.
#[derive(Debug, Deserialize)]
pub struct CatalogFile {
    pub products: Vec<CatalogEntry>,
}

/// One product in a catalog file.
#[derive(Debug, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    pub handle: String,
    pub title: String,
    pub vendor: Option<String>,
    pub price: String,
    pub compare_at_price: Option<String>,
    #[serde(default)]
    pub currency_code: Option<String>,
    pub image_url: Option<String>,
    pub image_alt: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

const fn default_active() -> bool {
    true
}

/// A validated catalog entry, ready to insert.
#[derive(Debug)]
struct CatalogRow<'a> {
    entry: &'a CatalogEntry,
    price: Decimal,
    compare_at_price: Option<Decimal>,
    currency: CurrencyCode,
}

fn parse_amount(raw: &str, field: &str, id: &str) -> Result<Decimal, String> {
    let amount: Decimal = raw
        .trim()
        .parse()
        .map_err(|e| format!("{id}: invalid {field} {raw:?}: {e}"))?;
    if amount.is_sign_negative() {
        return Err(format!("{id}: {field} must not be negative"));
    }
    Ok(amount)
}

/// Check every entry, collecting all problems rather than stopping at the first.
fn validate(file: &CatalogFile) -> Result<Vec<CatalogRow<'_>>, Vec<String>> {
    let mut rows = Vec::with_capacity(file.products.len());
    let mut errors = Vec::new();
    let mut ids = HashSet::new();
    let mut handles = HashSet::new();

    for entry in &file.products {
        let id = entry.id.trim();
        if id.is_empty() {
            errors.push(format!("product {:?}: id is empty", entry.handle));
            continue;
        }
        if entry.handle.trim().is_empty() || entry.title.trim().is_empty() {
            errors.push(format!("{id}: handle and title are required"));
        }
        if !ids.insert(id) {
            errors.push(format!("{id}: duplicate id"));
        }
        if !handles.insert(entry.handle.as_str()) {
            errors.push(format!("{id}: duplicate handle {:?}", entry.handle));
        }

        let price = parse_amount(&entry.price, "price", id);
        let compare_at_price = entry
            .compare_at_price
            .as_deref()
            .map(|raw| parse_amount(raw, "compare_at_price", id))
            .transpose();
        let currency = entry
            .currency_code
            .as_deref()
            .map_or(Ok(CurrencyCode::default()), str::parse::<CurrencyCode>)
            .map_err(|e| format!("{id}: {e}"));

        match (price, compare_at_price, currency) {
            (Ok(price), Ok(compare_at_price), Ok(currency)) => rows.push(CatalogRow {
                entry,
                price,
                compare_at_price,
                currency,
            }),
            (price, compare_at_price, currency) => {
                errors.extend(price.err());
                errors.extend(compare_at_price.err());
                errors.extend(currency.err());
            }
        }
    }

    if errors.is_empty() {
        Ok(rows)
    } else {
        Err(errors)
    }
}

async fn upsert(pool: &PgPool, row: &CatalogRow<'_>) -> Result<(), sqlx::Error> {
    sqlx::query(
        r"
        INSERT INTO storefront.product
            (id, handle, title, vendor, price, compare_at_price, currency_code,
             image_url, image_alt, active)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        ON CONFLICT (id) DO UPDATE SET
            handle = EXCLUDED.handle,
            title = EXCLUDED.title,
            vendor = EXCLUDED.vendor,
            price = EXCLUDED.price,
            compare_at_price = EXCLUDED.compare_at_price,
            currency_code = EXCLUDED.currency_code,
            image_url = EXCLUDED.image_url,
            image_alt = EXCLUDED.image_alt,
            active = EXCLUDED.active
        ",
    )
    .bind(row.entry.id.trim())
    .bind(&row.entry.handle)
    .bind(&row.entry.title)
    .bind(&row.entry.vendor)
    .bind(row.price)
    .bind(row.compare_at_price)
    .bind(row.currency.code())
    .bind(&row.entry.image_url)
    .bind(&row.entry.image_alt)
    .bind(row.entry.active)
    .execute(pool)
    .await?;
    Ok(())
}

/// Seed catalog products from a YAML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or fails validation, or if a
/// database operation fails.
pub async fn catalog(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading catalog from file");

    // Validate before connecting to the database
    let content = tokio::fs::read_to_string(path).await?;
    let file: CatalogFile = serde_yaml::from_str(&content)?;

    let rows = match validate(&file) {
        Ok(rows) => rows,
        Err(errors) => {
            error!("Catalog validation failed:");
            for err in &errors {
                error!("  - {err}");
            }
            return Err(format!("{} validation errors found", errors.len()).into());
        }
    };

    info!(products = rows.len(), "Catalog validated");

    let database_url = storefront_database_url()?;
    let pool = db::create_pool(&database_url).await?;
    info!("Connected to database");

    for row in &rows {
        upsert(&pool, row).await?;
    }

    info!("Seeding complete! {} products upserted", rows.len());
    Ok(())
}
