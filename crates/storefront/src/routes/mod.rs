//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                      - Liveness check
//! GET  /health/ready                - Readiness check (store ping)
//!
//! # Cart
//! POST /add-to-cart?id=&userID=     - Append a product to the cart
//! POST /remove-item?id=&userID=     - Remove a product from the cart
//! GET  /cart?id=                    - Cart items and total
//!
//! # Checkout
//! POST /checkout?id=                - Turn the cart into an order
//! POST /instant-buy?userid=&pid=    - Order one product directly
//!
//! # Users
//! POST /users/signup                - Register (JSON body)
//! ```

pub mod cart;
pub mod checkout;
pub mod health;
pub mod users;

use axum::{
    Router,
    http::StatusCode,
    routing::{get, post},
};
use serde::Serialize;

use crate::error::AppError;
use crate::state::AppState;

/// Plain confirmation body.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

impl MessageResponse {
    #[must_use]
    pub const fn new(message: &'static str) -> Self {
        Self { message }
    }
}

/// Require a non-blank query parameter, answering `status` when it is absent.
pub(crate) fn required(
    value: Option<String>,
    name: &'static str,
    status: StatusCode,
) -> Result<String, AppError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(AppError::MissingParameter { name, status })
}

/// Create the cart and checkout routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/add-to-cart", post(cart::add))
        .route("/remove-item", post(cart::remove))
        .route("/cart", get(cart::show))
        .route("/checkout", post(checkout::checkout))
        .route("/instant-buy", post(checkout::instant_buy))
}

/// Create the user routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new().route("/signup", post(users::signup))
}

/// Create all routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .merge(cart_routes())
        .nest("/users", user_routes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_rejects_blank() {
        assert!(required(None, "id", StatusCode::BAD_REQUEST).is_err());
        assert!(required(Some("  ".to_string()), "id", StatusCode::BAD_REQUEST).is_err());
        assert!(matches!(
            required(Some("abc".to_string()), "id", StatusCode::BAD_REQUEST).as_deref(),
            Ok("abc")
        ));
    }
}
