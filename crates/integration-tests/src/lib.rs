//! Integration tests for Emporium.
//!
//! # Running Tests
//!
//! ```bash
//! # In-process HTTP tests over the memory store
//! cargo test -p emporium-integration-tests
//!
//! # PostgreSQL store tests (migrates the target database first)
//! EMPORIUM_TEST_DATABASE_URL=postgres://... \
//!     cargo test -p emporium-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `cart_lifecycle` - HTTP API driven through the full router
//! - `postgres_store` - `PostgreSQL` document store behaviour

#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
    response::Response,
};
use chrono::Utc;
use serde_json::Value;
use tower::ServiceExt;

use emporium_core::{Price, ProductId, UserId};
use emporium_storefront::build_router;
use emporium_storefront::config::StorefrontConfig;
use emporium_storefront::db::{MemoryProductStore, MemoryUserStore, UserStore};
use emporium_storefront::models::{Product, User};
use emporium_storefront::state::AppState;

/// A storefront router over in-memory stores, plus handles for seeding.
pub struct TestApp {
    pub router: Router,
    pub products: Arc<MemoryProductStore>,
    pub users: Arc<MemoryUserStore>,
}

impl TestApp {
    /// Build an app with default configuration and the memory backend.
    pub fn new() -> Self {
        let env = HashMap::from([("EMPORIUM_STORE", "memory")]);
        let config =
            StorefrontConfig::from_lookup(|key| env.get(key).map(ToString::to_string)).unwrap();

        let products = Arc::new(MemoryProductStore::new());
        let users = Arc::new(MemoryUserStore::new());
        let state = AppState::new(config, products.clone(), users.clone());

        Self {
            router: build_router(state),
            products,
            users,
        }
    }

    /// Insert a product priced at `cents`.
    pub async fn seed_product(&self, name: &str, cents: i64) -> ProductId {
        let product = Product {
            id: ProductId::generate(),
            name: name.to_string(),
            price: Price::from_cents(cents).unwrap(),
            rating: Some(4),
            image: format!("{}.png", name.to_lowercase()),
        };
        let id = product.id;
        self.products.insert(product).await.unwrap();
        id
    }

    /// Insert a user with an empty cart.
    pub async fn seed_user(&self, email: &str) -> UserId {
        let user = test_user(email);
        let id = user.id;
        self.users.insert(&user).await.unwrap();
        id
    }

    /// Load a user document straight from the store.
    pub async fn user(&self, id: UserId) -> User {
        self.users.find_by_id(id).await.unwrap().unwrap()
    }

    /// Send a request with an optional JSON body.
    pub async fn send(&self, method: Method, uri: &str, body: Option<&Value>) -> Response {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Send a request and decode the JSON response body.
    pub async fn json(&self, method: Method, uri: &str, body: Option<&Value>) -> (StatusCode, Value) {
        let response = self.send(method, uri, body).await;
        let status = response.status();
        (status, body_json(response).await)
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// A user document with placeholder credentials and an empty cart.
pub fn test_user(email: &str) -> User {
    let now = Utc::now();
    User {
        id: UserId::generate(),
        first_name: "Test".to_string(),
        last_name: "Shopper".to_string(),
        password: "not-a-real-hash".to_string(),
        email: email.to_string(),
        phone: format!("phone-{email}"),
        token: "token".to_string(),
        refresh_token: "refresh".to_string(),
        token_expires_at: None,
        refresh_token_expires_at: None,
        created_at: now,
        updated_at: now,
        cart: Vec::new(),
        addresses: Vec::new(),
        orders: Vec::new(),
    }
}

/// Decode a response body as JSON.
pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
