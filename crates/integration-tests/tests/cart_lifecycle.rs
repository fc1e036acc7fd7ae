//! Integration tests for the cart and checkout HTTP API.
//!
//! Each test drives the full router (request ID and trace layers included)
//! in-process over the memory document store.

#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode};
use serde_json::json;

use emporium_core::{ProductId, UserId};
use emporium_integration_tests::{TestApp, body_json};

// =============================================================================
// Cart Lifecycle
// =============================================================================

#[tokio::test]
async fn test_add_view_checkout_round_trip() {
    let app = TestApp::new();
    let product = app.seed_product("Mug", 1000).await;
    let user = app.seed_user("buyer@example.com").await;

    let (status, body) = app
        .json(Method::POST, &format!("/add-to-cart?id={product}&userID={user}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Successfully added to the cart");

    let (status, body) = app.json(Method::GET, &format!("/cart?id={user}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], "10.00");
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["items"][0]["product_name"], "Mug");

    let (status, body) = app.json(Method::POST, &format!("/checkout?id={user}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], "10.00");
    assert_eq!(body["items"], 1);

    let (_, body) = app.json(Method::GET, &format!("/cart?id={user}"), None).await;
    assert_eq!(body["total"], "0.00");
    assert!(body["items"].as_array().unwrap().is_empty());

    let stored = app.user(user).await;
    assert!(stored.cart.is_empty());
    assert_eq!(stored.orders.len(), 1);
    assert_eq!(stored.orders[0].total.to_string(), "10.00");
    assert_eq!(stored.orders[0].order_id.to_string().len(), 24);
}

#[tokio::test]
async fn test_same_product_twice_is_two_entries() {
    let app = TestApp::new();
    let product = app.seed_product("Tent", 12_999).await;
    let user = app.seed_user("camper@example.com").await;

    for _ in 0..2 {
        let response = app
            .send(Method::POST, &format!("/add-to-cart?id={product}&userID={user}"), None)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let (_, body) = app.json(Method::GET, &format!("/cart?id={user}"), None).await;
    assert_eq!(body["total"], "259.98");
    assert_eq!(body["items"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_remove_item_drops_every_entry_for_product() {
    let app = TestApp::new();
    let mug = app.seed_product("Mug", 1000).await;
    let lamp = app.seed_product("Lamp", 2550).await;
    let user = app.seed_user("tidy@example.com").await;

    for product in [mug, lamp, mug] {
        app.send(Method::POST, &format!("/add-to-cart?id={product}&userID={user}"), None)
            .await;
    }

    let (status, body) = app
        .json(Method::POST, &format!("/remove-item?id={mug}&userID={user}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Successfully removed item from cart");

    let (_, body) = app.json(Method::GET, &format!("/cart?id={user}"), None).await;
    assert_eq!(body["total"], "25.50");
    assert_eq!(body["items"].as_array().unwrap().len(), 1);

    // Removing something no longer in the cart still succeeds
    let response = app
        .send(Method::POST, &format!("/remove-item?id={mug}&userID={user}"), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_checkout_empty_cart_places_zero_order() {
    let app = TestApp::new();
    let user = app.seed_user("empty@example.com").await;

    let (status, body) = app.json(Method::POST, &format!("/checkout?id={user}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], "0.00");
    assert_eq!(body["items"], 0);
    assert_eq!(app.user(user).await.orders.len(), 1);
}

#[tokio::test]
async fn test_instant_buy_leaves_cart_alone() {
    let app = TestApp::new();
    let mug = app.seed_product("Mug", 1000).await;
    let lamp = app.seed_product("Lamp", 2550).await;
    let user = app.seed_user("impulse@example.com").await;

    app.send(Method::POST, &format!("/add-to-cart?id={mug}&userID={user}"), None)
        .await;

    let (status, body) = app
        .json(Method::POST, &format!("/instant-buy?userid={user}&pid={lamp}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Successfully placed the order");
    assert_eq!(body["total"], "25.50");
    assert_eq!(body["items"], 1);

    let stored = app.user(user).await;
    assert_eq!(stored.cart.len(), 1);
    assert_eq!(stored.cart[0].product_id, mug);
    assert_eq!(stored.orders.len(), 1);
    assert_eq!(stored.orders[0].items[0].product_id, lamp);
}

// =============================================================================
// Validation and Not Found
// =============================================================================

#[tokio::test]
async fn test_missing_parameters_are_bad_requests() {
    let app = TestApp::new();
    let user = UserId::generate();
    let product = ProductId::generate();

    for uri in [
        format!("/add-to-cart?userID={user}"),
        format!("/add-to-cart?id={product}"),
        format!("/remove-item?id={product}&userID="),
        "/checkout".to_string(),
        format!("/instant-buy?userid={user}"),
        format!("/instant-buy?pid={product}"),
    ] {
        let (status, body) = app.json(Method::POST, &uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["error"]["kind"], "invalid_input", "{uri}");
    }
}

#[tokio::test]
async fn test_cart_without_id_is_not_found() {
    let app = TestApp::new();

    let (status, body) = app.json(Method::GET, "/cart", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["message"], "id is required");
}

#[tokio::test]
async fn test_malformed_ids_are_rejected() {
    let app = TestApp::new();
    let user = app.seed_user("typo@example.com").await;

    let (status, body) = app
        .json(Method::POST, &format!("/add-to-cart?id=nope&userID={user}"), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["kind"], "invalid_input");

    let (status, _) = app.json(Method::GET, "/cart?id=xyz", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_product_is_not_found() {
    let app = TestApp::new();
    let user = app.seed_user("ghost@example.com").await;
    let missing = ProductId::generate();

    let (status, body) = app
        .json(Method::POST, &format!("/add-to-cart?id={missing}&userID={user}"), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["message"], "product not found");
    assert!(app.user(user).await.cart.is_empty());

    let (status, _) = app
        .json(Method::POST, &format!("/instant-buy?userid={user}&pid={missing}"), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(app.user(user).await.orders.is_empty());
}

#[tokio::test]
async fn test_unknown_user_is_not_found() {
    let app = TestApp::new();
    let product = app.seed_product("Mug", 1000).await;
    let stranger = UserId::generate();

    for (method, uri) in [
        (Method::POST, format!("/add-to-cart?id={product}&userID={stranger}")),
        (Method::POST, format!("/remove-item?id={product}&userID={stranger}")),
        (Method::GET, format!("/cart?id={stranger}")),
        (Method::POST, format!("/checkout?id={stranger}")),
    ] {
        let (status, body) = app.json(method, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body["error"]["message"], "user not found", "{uri}");
    }
}

// =============================================================================
// Signup
// =============================================================================

#[tokio::test]
async fn test_signup_then_duplicate_email_conflicts() {
    let app = TestApp::new();
    let request = json!({
        "first_name": "Ada",
        "last_name": "Lovelace",
        "password": "analytical",
        "email": "ada@example.com",
        "phone": "555-0100"
    });

    let (status, body) = app.json(Method::POST, "/users/signup", Some(&request)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["token"].as_str().unwrap().len(), 43);

    let user_id: UserId = body["user_id"].as_str().unwrap().parse().unwrap();
    let stored = app.user(user_id).await;
    assert_ne!(stored.password, "analytical");
    assert!(stored.cart.is_empty());

    let mut again = request.clone();
    again["phone"] = json!("555-0199");
    let (status, body) = app.json(Method::POST, "/users/signup", Some(&again)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["kind"], "conflict");
}

#[tokio::test]
async fn test_signup_rejects_invalid_body() {
    let app = TestApp::new();

    let (status, body) = app
        .json(Method::POST, "/users/signup", Some(&json!({"email": "x"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["kind"], "invalid_input");

    let short_password = json!({
        "first_name": "Ada",
        "last_name": "Lovelace",
        "password": "abc",
        "email": "ada@example.com",
        "phone": "555-0100"
    });
    let (status, _) = app
        .json(Method::POST, "/users/signup", Some(&short_password))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Health and Request IDs
// =============================================================================

#[tokio::test]
async fn test_health_endpoints() {
    let app = TestApp::new();

    let response = app.send(Method::GET, "/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.send(Method::GET, "/health/ready", None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_every_response_carries_request_id() {
    let app = TestApp::new();

    let response = app.send(Method::GET, "/cart", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response.headers().contains_key("x-request-id"));

    let body = body_json(response).await;
    assert_eq!(body["error"]["kind"], "not_found");
}
