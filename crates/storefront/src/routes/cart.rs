//! Cart route handlers.
//!
//! Identifiers come from query parameters. A missing or blank parameter is
//! rejected here; parsing and everything after it happens in the services.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::Result;
use crate::models::CartItem;
use crate::routes::{MessageResponse, required};
use crate::state::AppState;

/// Query for add-to-cart and remove-item.
#[derive(Debug, Deserialize)]
pub struct CartItemQuery {
    /// Product ID.
    pub id: Option<String>,
    #[serde(rename = "userID")]
    pub user_id: Option<String>,
}

/// Query for the cart summary.
#[derive(Debug, Deserialize)]
pub struct CartQuery {
    /// User ID.
    pub id: Option<String>,
}

/// Cart summary response.
#[derive(Debug, Serialize)]
pub struct CartResponse {
    /// Two-decimal total, e.g. `"10.00"`.
    pub total: String,
    pub items: Vec<CartItem>,
}

/// Add a product to a user's cart.
#[instrument(skip(state))]
pub async fn add(
    State(state): State<AppState>,
    Query(query): Query<CartItemQuery>,
) -> Result<Json<MessageResponse>> {
    let product_id = required(query.id, "id", StatusCode::BAD_REQUEST)?;
    let user_id = required(query.user_id, "userID", StatusCode::BAD_REQUEST)?;

    state
        .cart_service()
        .add_to_cart(&product_id, &user_id)
        .await?;

    Ok(Json(MessageResponse::new("Successfully added to the cart")))
}

/// Remove a product from a user's cart.
#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    Query(query): Query<CartItemQuery>,
) -> Result<Json<MessageResponse>> {
    let product_id = required(query.id, "id", StatusCode::BAD_REQUEST)?;
    let user_id = required(query.user_id, "userID", StatusCode::BAD_REQUEST)?;

    state
        .cart_service()
        .remove_item(&product_id, &user_id)
        .await?;

    Ok(Json(MessageResponse::new("Successfully removed item from cart")))
}

/// Show a user's cart with its total.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Query(query): Query<CartQuery>,
) -> Result<Json<CartResponse>> {
    let user_id = required(query.id, "id", StatusCode::NOT_FOUND)?;

    let summary = state
        .aggregator()
        .get_cart_summary(&user_id)
        .await?;

    Ok(Json(CartResponse {
        total: summary.total.to_string(),
        items: summary.items,
    }))
}
