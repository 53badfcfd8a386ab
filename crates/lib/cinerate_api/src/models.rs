//! Request and response bodies.

use cinerate_core::models::catalog::{Movie, Page};
use serde::{Deserialize, Serialize};

/// Uniform error payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: u16,
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// `POST /auth/login` body. Fields are optional so a missing one is a 400, not a parse failure.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// `POST /register` body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Plain acknowledgement.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// `POST /movies` body. With an `id` it updates that movie, otherwise it creates one.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveMovieRequest {
    pub id: Option<i64>,
    pub title: Option<String>,
    pub genre: Option<String>,
    pub release_year: Option<i32>,
}

/// `GET /movies` query string.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieListQuery {
    #[serde(default)]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub size: i64,
    pub title: Option<String>,
    pub genre: Option<String>,
    pub release_year: Option<i32>,
}

fn default_page_size() -> i64 {
    10
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    pub size: u32,
    pub number: u32,
    pub total_elements: u64,
    pub total_pages: u64,
}

#[derive(Debug, Serialize)]
pub struct MoviePageResponse {
    pub items: Vec<Movie>,
    pub page: PageMetadata,
}

impl From<Page<Movie>> for MoviePageResponse {
    fn from(page: Page<Movie>) -> Self {
        Self {
            page: PageMetadata {
                size: page.size,
                number: page.number,
                total_elements: page.total_elements,
                total_pages: page.total_pages,
            },
            items: page.items,
        }
    }
}

/// `POST /movies/{id}/ratings` body.
#[derive(Debug, Deserialize)]
pub struct RatingRequest {
    pub score: Option<i32>,
}

/// `GET /health` response.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub store_connected: bool,
}
