//! Movie catalog handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use cinerate_core::models::catalog::{Movie, TopRatedMovie};

use crate::AppState;
use crate::error::AppResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::models::{MovieListQuery, MoviePageResponse, SaveMovieRequest};
use crate::services::catalog;

/// `GET /movies`: filtered, paged listing.
pub async fn list_movies_handler(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<MovieListQuery>,
) -> AppResult<Json<MoviePageResponse>> {
    let page = catalog::list_movies(&state, query).await?;
    Ok(Json(page.into()))
}

/// `GET /movies/top-rated`
pub async fn top_rated_handler(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<TopRatedMovie>>> {
    Ok(Json(catalog::top_rated(&state).await?))
}

/// `GET /movies/{id}`
pub async fn get_movie_handler(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<Movie>> {
    Ok(Json(catalog::get_movie(&state, id).await?))
}

/// `POST /movies`: create, or update when the body carries an id.
pub async fn save_movie_handler(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<SaveMovieRequest>,
) -> AppResult<Json<Movie>> {
    Ok(Json(catalog::save_movie(&state, body).await?))
}

/// `DELETE /movies/{id}`
pub async fn delete_movie_handler(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<StatusCode> {
    catalog::delete_movie(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
