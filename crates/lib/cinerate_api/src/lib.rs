//! # cinerate_api
//!
//! HTTP API library for Cinerate: login/logout, account registration, the
//! movie catalog and per-user ratings behind a stateless bearer-token filter.

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod policy;
pub mod services;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post};
use chrono::Duration;
use cinerate_core::auth::{Authenticator, TokenBlacklist, TokenCodec};
use cinerate_core::store::Stores;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::handlers::{auth, health, movies, ratings, registration};
use crate::policy::AccessPolicy;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// API configuration.
    pub config: ApiConfig,
    /// Storage collaborators.
    pub stores: Stores,
    /// Access token signer/verifier.
    pub tokens: Arc<TokenCodec>,
    /// Tokens revoked by logout.
    pub blacklist: Arc<TokenBlacklist>,
    /// Route access rules.
    pub policy: Arc<AccessPolicy>,
    pub authenticator: Authenticator,
}

impl AppState {
    /// State with the service's access policy and an empty blacklist.
    pub fn new(config: ApiConfig, stores: Stores) -> Self {
        let tokens = TokenCodec::new(
            config.jwt_secret.as_bytes(),
            Duration::minutes(config.token_validity_mins),
        );
        Self {
            authenticator: Authenticator::new(stores.users.clone()),
            tokens: Arc::new(tokens),
            blacklist: Arc::new(TokenBlacklist::new()),
            policy: Arc::new(AccessPolicy::reference()),
            stores,
            config,
        }
    }
}

/// Builds the Axum router with all routes and shared state.
///
/// Every request passes the authentication filter; the access policy, not
/// route grouping, decides which routes are public.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .route("/register", post(registration::register_handler))
        .route("/register/{id}", delete(registration::delete_user_handler))
        .route(
            "/movies",
            get(movies::list_movies_handler).post(movies::save_movie_handler),
        )
        .route("/movies/top-rated", get(movies::top_rated_handler))
        .route(
            "/movies/{id}",
            get(movies::get_movie_handler).delete(movies::delete_movie_handler),
        )
        .route(
            "/movies/{id}/ratings",
            get(ratings::get_rating_handler)
                .post(ratings::rate_movie_handler)
                .delete(ratings::delete_rating_handler),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::authenticate_request,
        ))
        .layer(axum::middleware::from_fn(
            middleware::error_path::attach_error_path,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
