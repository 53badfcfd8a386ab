//! Account registration handlers.

use axum::Json;
use axum::extract::State;

use crate::AppState;
use crate::error::AppResult;
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::auth::CurrentUser;
use crate::models::{MessageResponse, RegisterRequest};
use crate::services::auth;

/// `POST /register`: create a `USER` account.
pub async fn register_handler(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> AppResult<Json<MessageResponse>> {
    let resp = auth::register(&state, body.username.as_deref(), body.password.as_deref()).await?;
    Ok(Json(resp))
}

/// `DELETE /register/{id}`: delete an account (own account, or any as admin).
pub async fn delete_user_handler(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<MessageResponse>> {
    Ok(Json(auth::delete_user(&state, &caller, id).await?))
}
