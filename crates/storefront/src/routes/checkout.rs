//! Checkout route handlers.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use emporium_core::OrderId;

use crate::error::Result;
use crate::models::Order;
use crate::routes::required;
use crate::state::AppState;

/// Query for cart checkout.
#[derive(Debug, Deserialize)]
pub struct CheckoutQuery {
    /// User ID.
    pub id: Option<String>,
}

/// Query for instant buy.
#[derive(Debug, Deserialize)]
pub struct InstantBuyQuery {
    #[serde(rename = "userid")]
    pub user_id: Option<String>,
    #[serde(rename = "pid")]
    pub product_id: Option<String>,
}

/// Confirmation of a placed order.
#[derive(Debug, Serialize)]
pub struct OrderPlaced {
    pub message: &'static str,
    pub order_id: OrderId,
    pub total: String,
    pub items: usize,
}

impl OrderPlaced {
    fn new(order: &Order) -> Self {
        Self {
            message: "Successfully placed the order",
            order_id: order.order_id,
            total: order.total.to_string(),
            items: order.items.len(),
        }
    }
}

/// Check out the user's cart.
#[instrument(skip(state))]
pub async fn checkout(
    State(state): State<AppState>,
    Query(query): Query<CheckoutQuery>,
) -> Result<Json<OrderPlaced>> {
    let user_id = required(query.id, "id", StatusCode::BAD_REQUEST)?;

    let order = state.cart_service().buy_from_cart(&user_id).await?;

    Ok(Json(OrderPlaced::new(&order)))
}

/// Order one product without touching the cart.
#[instrument(skip(state))]
pub async fn instant_buy(
    State(state): State<AppState>,
    Query(query): Query<InstantBuyQuery>,
) -> Result<Json<OrderPlaced>> {
    let user_id = required(query.user_id, "userid", StatusCode::BAD_REQUEST)?;
    let product_id = required(query.product_id, "pid", StatusCode::BAD_REQUEST)?;

    let order = state
        .cart_service()
        .instant_buy(&user_id, &product_id)
        .await?;

    Ok(Json(OrderPlaced::new(&order)))
}
