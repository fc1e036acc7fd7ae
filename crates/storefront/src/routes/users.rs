//! User route handlers.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::Serialize;
use tracing::instrument;

use emporium_core::UserId;

use crate::error::{AppError, Result};
use crate::services::accounts::SignupRequest;
use crate::state::AppState;

/// Signup response.
#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub message: &'static str,
    pub user_id: UserId,
    pub token: String,
    pub refresh_token: String,
}

/// Register a new user.
#[instrument(skip_all)]
pub async fn signup(
    State(state): State<AppState>,
    body: std::result::Result<Json<SignupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SignupResponse>)> {
    let Json(request) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let user = state.accounts().signup(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "Successfully signed up",
            user_id: user.id,
            token: user.token,
            refresh_token: user.refresh_token,
        }),
    ))
}
