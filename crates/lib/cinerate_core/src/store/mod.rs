//! Storage collaborators: users, movies and ratings.
//!
//! Each concern is a trait so the API can run against PostgreSQL in
//! production and against [`memory::MemoryStore`] in tests and demo mode.

pub mod memory;
pub mod postgres;

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::auth::Role;
use crate::models::auth::Credential;
use crate::models::catalog::{Movie, MovieFilter, NewMovie, Page, PageRequest, Rating, TopRatedMovie};

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    DbError(#[from] sqlx::Error),
}

/// Credential storage.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<Credential>, StoreError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Credential>, StoreError>;

    /// Persist a new credential, returning its id. `Conflict` if the username is taken.
    async fn create(
        &self,
        username: &str,
        password_hash: &str,
        roles: &BTreeSet<Role>,
    ) -> Result<i64, StoreError>;

    /// Delete a user and their ratings. Returns `false` if no such user.
    async fn delete(&self, id: i64) -> Result<bool, StoreError>;

    async fn username_exists(&self, username: &str) -> Result<bool, StoreError> {
        Ok(self.find_by_username(username).await?.is_some())
    }

    /// Backend liveness check.
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Movie catalog storage.
#[async_trait]
pub trait MovieStore: Send + Sync {
    /// Filtered page of movies ordered by id.
    async fn list(&self, filter: &MovieFilter, page: PageRequest)
    -> Result<Page<Movie>, StoreError>;

    async fn get(&self, id: i64) -> Result<Option<Movie>, StoreError>;

    async fn insert(&self, movie: &NewMovie) -> Result<Movie, StoreError>;

    /// Replace an existing movie. Returns `None` if the id is unknown.
    async fn update(&self, movie: &Movie) -> Result<Option<Movie>, StoreError>;

    /// Delete a movie and its ratings. Returns `false` if no such movie.
    async fn delete(&self, id: i64) -> Result<bool, StoreError>;

    /// Rated movies by average score, best first.
    async fn top_rated(&self) -> Result<Vec<TopRatedMovie>, StoreError>;
}

/// Rating storage; at most one rating per (movie, user).
#[async_trait]
pub trait RatingStore: Send + Sync {
    async fn find(&self, movie_id: i64, username: &str) -> Result<Option<Rating>, StoreError>;

    /// Insert or replace the user's score. The flag is `true` when a new rating was created.
    async fn upsert(
        &self,
        movie_id: i64,
        username: &str,
        score: i32,
    ) -> Result<(Rating, bool), StoreError>;

    /// Returns `false` if the user had not rated the movie.
    async fn delete(&self, movie_id: i64, username: &str) -> Result<bool, StoreError>;
}

/// The full set of storage collaborators, shared across request handlers.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub movies: Arc<dyn MovieStore>,
    pub ratings: Arc<dyn RatingStore>,
}

impl Stores {
    /// Use one backend for every concern.
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: UserStore + MovieStore + RatingStore + 'static,
    {
        Self {
            users: backend.clone(),
            movies: backend.clone(),
            ratings: backend,
        }
    }

    pub fn postgres(pool: sqlx::PgPool) -> Self {
        Self::from_backend(Arc::new(postgres::PgStore::new(pool)))
    }

    pub fn in_memory() -> Self {
        Self::from_backend(Arc::new(memory::MemoryStore::new()))
    }
}
