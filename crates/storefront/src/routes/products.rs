//! Product route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::models::Product;
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: i64 = 48;
const MAX_PAGE_SIZE: i64 = 200;

/// Listing query parameters.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
}

impl ListQuery {
    fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }
}

/// Active catalog products, by title.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Product>>> {
    let products = ProductRepository::new(state.pool())
        .list_active(query.limit())
        .await?;
    Ok(Json(products))
}

/// Product detail by handle.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> Result<Json<Product>> {
    ProductRepository::new(state.pool())
        .get_active_by_handle(&handle)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("product {handle}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_limit_bounds() {
        assert_eq!(ListQuery { limit: None }.limit(), DEFAULT_PAGE_SIZE);
        assert_eq!(ListQuery { limit: Some(0) }.limit(), 1);
        assert_eq!(ListQuery { limit: Some(-5) }.limit(), 1);
        assert_eq!(ListQuery { limit: Some(10) }.limit(), 10);
        assert_eq!(ListQuery { limit: Some(10_000) }.limit(), MAX_PAGE_SIZE);
    }
}
