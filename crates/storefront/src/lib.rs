//! Emporium storefront library.
//!
//! Cart, checkout and signup over a document store, served with axum. The
//! binary in `main.rs` wires configuration into [`state::AppState`] and serves
//! [`build_router`]; integration tests drive the same router in-process.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalogue;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::Router;
use tower_http::trace::TraceLayer;

use state::AppState;

/// Build the application router with its middleware stack.
///
/// Sentry layers are added by the binary, outermost, so tests can run
/// without a Sentry client.
pub fn build_router(state: AppState) -> Router {
    routes::routes()
        .with_state(state)
        .layer(axum::middleware::from_fn(
            middleware::request_id_middleware,
        ))
        .layer(TraceLayer::new_for_http().make_span_with(middleware::request_id::make_span))
}
