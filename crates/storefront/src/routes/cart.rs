//! Cart route handlers.
//!
//! The cart lives in the visitor's session. Every handler opens a
//! `CartStore` over the session, runs one operation, and writes the
//! snapshot back before responding. Mutations answer with an
//! `HX-Trigger: cart-updated` header so other page fragments can refresh.

use axum::{
    Form, Json,
    extract::State,
    response::{AppendHeaders, IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use hearthloom_core::cart::{Cart, LineItem};
use hearthloom_core::{CurrencyCode, Price, ProductId, VariantId};

use crate::db::ProductRepository;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::services::cart::{load_cart, save_cart};
use crate::state::AppState;

const CART_UPDATED: (&str, &str) = ("HX-Trigger", "cart-updated");

/// One cart line as rendered for the client.
#[derive(Debug, Clone, Serialize)]
pub struct CartItemView {
    pub product_id: String,
    pub variant_id: Option<String>,
    pub handle: String,
    pub title: String,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
    pub image_url: Option<String>,
}

/// Cart display data.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub item_count: u32,
}

/// Cart count badge.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CartCount {
    pub count: u32,
}

impl From<&LineItem> for CartItemView {
    fn from(line: &LineItem) -> Self {
        let product = line.product();
        Self {
            product_id: line.product_id().to_string(),
            variant_id: line.variant_id().map(ToString::to_string),
            handle: product.handle.clone(),
            title: product.title.clone(),
            quantity: line.quantity(),
            price: product.price.to_string(),
            line_price: product.price.times(line.quantity()).to_string(),
            image_url: product.image.as_ref().map(|img| img.url.clone()),
        }
    }
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            items: cart.iter().map(CartItemView::from).collect(),
            subtotal: subtotal(cart).to_string(),
            item_count: item_count(cart),
        }
    }
}

/// Sum of line totals, in the currency of the first line.
///
/// Lines priced in another currency are left out and logged.
fn subtotal(cart: &Cart) -> Price {
    let currency = cart
        .iter()
        .next()
        .map_or_else(CurrencyCode::default, |line| line.product().price.currency_code);

    cart.iter().fold(Price::zero(currency), |total, line| {
        let line_total = line.product().price.times(line.quantity());
        total.checked_add(&line_total).unwrap_or_else(|| {
            tracing::warn!(
                product_id = %line.product_id(),
                currency = %line_total.currency_code,
                "Skipping cart line with mismatched currency"
            );
            total
        })
    })
}

/// Total units across all lines.
fn item_count(cart: &Cart) -> u32 {
    cart.iter()
        .fold(0_u32, |count, line| count.saturating_add(line.quantity()))
}

/// Treat an empty form field as "no variant".
fn variant_from_form(raw: Option<String>) -> Option<VariantId> {
    raw.filter(|v| !v.trim().is_empty()).map(VariantId::new)
}

/// Parse the add-to-cart quantity; a missing or empty field means 1.
fn quantity_from_form(raw: Option<&str>) -> Result<u32> {
    let Some(raw) = raw.map(str::trim).filter(|q| !q.is_empty()) else {
        return Ok(1);
    };
    match raw.parse::<u32>() {
        Ok(0) => Err(AppError::BadRequest("quantity must be at least 1".to_string())),
        Ok(quantity) => Ok(quantity),
        Err(_) => Err(AppError::BadRequest(format!("invalid quantity {raw:?}"))),
    }
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
    pub variant_id: Option<String>,
    pub quantity: Option<String>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: String,
    pub variant_id: Option<String>,
    pub quantity: i64,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: String,
    pub variant_id: Option<String>,
}

/// Display the cart.
///
/// Saves on the way out so an unreadable snapshot replaced during loading
/// does not linger in the session.
#[instrument(skip(session))]
pub async fn show(session: Session) -> Result<Json<CartView>> {
    let store = load_cart(&session).await?;
    let cart = CartView::from(store.cart());
    save_cart(store).await?;
    Ok(Json(cart))
}

/// Add a product to the cart.
///
/// The product is looked up in the catalog and its current display data is
/// copied into the line. Returns the updated count badge.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let quantity = quantity_from_form(form.quantity.as_deref())?;
    let variant_id = variant_from_form(form.variant_id);

    let product_id = ProductId::new(form.product_id);
    let product = ProductRepository::new(state.pool())
        .get_active_by_id(&product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {product_id}")))?;

    let mut store = load_cart(&session).await?;
    store.add_item(product.snapshot(), variant_id, quantity);
    let count = item_count(store.cart());
    save_cart(store).await?;

    add_breadcrumb("cart", "Added to cart", &[("product_id", product_id.as_str())]);

    Ok((AppendHeaders([CART_UPDATED]), Json(CartCount { count })).into_response())
}

/// Set a line's quantity; zero or less removes it.
#[instrument(skip(session))]
pub async fn update(session: Session, Form(form): Form<UpdateCartForm>) -> Result<Response> {
    let product_id = ProductId::new(form.product_id);
    let variant_id = variant_from_form(form.variant_id);

    let mut store = load_cart(&session).await?;
    store.update_quantity(&product_id, variant_id.as_ref(), form.quantity);
    let cart = CartView::from(store.cart());
    save_cart(store).await?;

    Ok((AppendHeaders([CART_UPDATED]), Json(cart)).into_response())
}

/// Remove a line from the cart.
#[instrument(skip(session))]
pub async fn remove(session: Session, Form(form): Form<RemoveFromCartForm>) -> Result<Response> {
    let product_id = ProductId::new(form.product_id);
    let variant_id = variant_from_form(form.variant_id);

    let mut store = load_cart(&session).await?;
    store.remove_item(&product_id, variant_id.as_ref());
    let cart = CartView::from(store.cart());
    save_cart(store).await?;

    Ok((AppendHeaders([CART_UPDATED]), Json(cart)).into_response())
}

/// Empty the cart.
#[instrument(skip(session))]
pub async fn clear(session: Session) -> Result<Response> {
    let mut store = load_cart(&session).await?;
    store.clear_cart();
    let cart = CartView::from(store.cart());
    save_cart(store).await?;

    Ok((AppendHeaders([CART_UPDATED]), Json(cart)).into_response())
}

/// Cart count badge.
#[instrument(skip(session))]
pub async fn count(session: Session) -> Result<Json<CartCount>> {
    let store = load_cart(&session).await?;
    let count = item_count(store.cart());
    save_cart(store).await?;
    Ok(Json(CartCount { count }))
}
