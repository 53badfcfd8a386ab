//! Session request handlers.

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::extract::ApiJson;
use crate::middleware::auth::bearer_token;
use crate::models::{LoginRequest, MessageResponse, TokenResponse};
use crate::services::auth;

/// `POST /auth/login`: exchange username + password for an access token.
pub async fn login_handler(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    let resp = auth::login(&state, body.username.as_deref(), body.password.as_deref()).await?;
    Ok(Json(resp))
}

/// `POST /auth/logout`: revoke the presented bearer token.
pub async fn logout_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Json<MessageResponse>> {
    let token = bearer_token(&headers).ok_or_else(|| AppError::Validation("Missing or malformed Authorization header".into()))?;
    Ok(Json(auth::logout(&state, token)?))
}
