//! Per-user rating handlers. All routes act on the caller's own rating.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use cinerate_core::models::catalog::Rating;

use crate::AppState;
use crate::error::AppResult;
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::auth::CurrentUser;
use crate::models::RatingRequest;
use crate::services::catalog;

/// `GET /movies/{id}/ratings`
pub async fn get_rating_handler(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    ApiPath(movie_id): ApiPath<i64>,
) -> AppResult<Json<Rating>> {
    Ok(Json(catalog::get_rating(&state, &caller, movie_id).await?))
}

/// `POST /movies/{id}/ratings`: 201 for a new rating, 200 when replacing one.
pub async fn rate_movie_handler(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    ApiPath(movie_id): ApiPath<i64>,
    ApiJson(body): ApiJson<RatingRequest>,
) -> AppResult<(StatusCode, Json<Rating>)> {
    let (rating, created) = catalog::rate_movie(&state, &caller, movie_id, body.score).await?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(rating)))
}

/// `DELETE /movies/{id}/ratings`
pub async fn delete_rating_handler(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    ApiPath(movie_id): ApiPath<i64>,
) -> AppResult<StatusCode> {
    catalog::delete_rating(&state, &caller, movie_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
