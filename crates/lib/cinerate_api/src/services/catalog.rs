//! Movie catalog and rating service.

use cinerate_core::models::auth::AuthenticatedIdentity;
use cinerate_core::models::catalog::{
    MAX_SCORE, MIN_SCORE, Movie, MovieFilter, NewMovie, Page, PageRequest, Rating, TopRatedMovie,
};
use tracing::{debug, info};

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{MovieListQuery, SaveMovieRequest};

fn movie_not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Movie with ID {id} not found"))
}

// ---------------------------------------------------------------------------
// Movies
// ---------------------------------------------------------------------------

/// Validate paging parameters from the query string.
pub fn page_request(page: i64, size: i64) -> AppResult<PageRequest> {
    let number = u32::try_from(page)
        .map_err(|_| AppError::Validation("Page index must not be negative".into()))?;
    let size = u32::try_from(size)
        .ok()
        .filter(|s| *s > 0)
        .ok_or_else(|| AppError::Validation("Page size must be greater than zero".into()))?;
    Ok(PageRequest { number, size })
}

/// Filtered, paged catalog listing. An empty page is a 404.
pub async fn list_movies(state: &AppState, query: MovieListQuery) -> AppResult<Page<Movie>> {
    let request = page_request(query.page, query.size)?;
    let filter = MovieFilter {
        title: query.title,
        genre: query.genre,
        release_year: query.release_year,
    };

    let page = state.stores.movies.list(&filter, request).await?;
    debug!(
        page = page.number,
        returned = page.items.len(),
        total = page.total_elements,
        "listed movies"
    );
    if page.is_empty() {
        return Err(AppError::NotFound("No movies found".into()));
    }
    Ok(page)
}

pub async fn get_movie(state: &AppState, id: i64) -> AppResult<Movie> {
    state
        .stores
        .movies
        .get(id)
        .await?
        .ok_or_else(|| movie_not_found(id))
}

/// Create a movie, or replace it when the request carries an id.
pub async fn save_movie(state: &AppState, request: SaveMovieRequest) -> AppResult<Movie> {
    let Some(title) = request.title.as_deref().map(str::trim).filter(|t| !t.is_empty()) else {
        return Err(AppError::Validation("Movie title is required".into()));
    };
    let fields = NewMovie {
        title: title.to_string(),
        genre: request.genre,
        release_year: request.release_year,
    };

    match request.id {
        Some(id) => {
            let movie = state
                .stores
                .movies
                .update(&fields.with_id(id))
                .await?
                .ok_or_else(|| movie_not_found(id))?;
            info!(id, title = %movie.title, "movie updated");
            Ok(movie)
        }
        None => {
            let movie = state.stores.movies.insert(&fields).await?;
            info!(id = movie.id, title = %movie.title, "movie created");
            Ok(movie)
        }
    }
}

pub async fn delete_movie(state: &AppState, id: i64) -> AppResult<()> {
    if !state.stores.movies.delete(id).await? {
        return Err(movie_not_found(id));
    }
    info!(id, "movie deleted");
    Ok(())
}

/// Rated movies by average score. No ratings at all is a 404.
pub async fn top_rated(state: &AppState) -> AppResult<Vec<TopRatedMovie>> {
    let movies = state.stores.movies.top_rated().await?;
    if movies.is_empty() {
        return Err(AppError::NotFound("No rated movies found".into()));
    }
    Ok(movies)
}

// ---------------------------------------------------------------------------
// Ratings
// ---------------------------------------------------------------------------

/// The caller's rating of movie `movie_id`.
pub async fn get_rating(
    state: &AppState,
    caller: &AuthenticatedIdentity,
    movie_id: i64,
) -> AppResult<Rating> {
    state
        .stores
        .ratings
        .find(movie_id, &caller.username)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "Rating for movie {movie_id} by {} not found",
                caller.username
            ))
        })
}

/// Rate a movie, replacing any earlier score. The flag is `true` for a new rating.
pub async fn rate_movie(
    state: &AppState,
    caller: &AuthenticatedIdentity,
    movie_id: i64,
    score: Option<i32>,
) -> AppResult<(Rating, bool)> {
    let Some(score) = score.filter(|s| (MIN_SCORE..=MAX_SCORE).contains(s)) else {
        return Err(AppError::Validation(format!(
            "Score must be between {MIN_SCORE} and {MAX_SCORE}"
        )));
    };

    let (rating, created) = state
        .stores
        .ratings
        .upsert(movie_id, &caller.username, score)
        .await?;
    info!(movie_id, username = %caller.username, score, created, "movie rated");
    Ok((rating, created))
}

pub async fn delete_rating(
    state: &AppState,
    caller: &AuthenticatedIdentity,
    movie_id: i64,
) -> AppResult<()> {
    if !state
        .stores
        .ratings
        .delete(movie_id, &caller.username)
        .await?
    {
        return Err(AppError::NotFound(format!(
            "Rating for movie {movie_id} by {} not found",
            caller.username
        )));
    }
    info!(movie_id, username = %caller.username, "rating deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_request_bounds() {
        assert_eq!(page_request(0, 10).unwrap(), PageRequest { number: 0, size: 10 });
        assert_eq!(page_request(3, 1).unwrap(), PageRequest { number: 3, size: 1 });
        assert!(matches!(page_request(-1, 10), Err(AppError::Validation(_))));
        assert!(matches!(page_request(0, 0), Err(AppError::Validation(_))));
        assert!(matches!(page_request(0, -5), Err(AppError::Validation(_))));
    }
}
