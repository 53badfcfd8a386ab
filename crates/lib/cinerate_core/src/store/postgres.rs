//! PostgreSQL-backed store.

use std::collections::BTreeSet;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::{MovieStore, RatingStore, StoreError, UserStore};
use crate::auth::Role;
use crate::auth::roles::{format_role_list, parse_role_list};
use crate::models::auth::Credential;
use crate::models::catalog::{Movie, MovieFilter, NewMovie, Page, PageRequest, Rating, TopRatedMovie};

/// Row shape shared by the user lookups: (id, username, password_hash, roles).
type UserRow = (i64, String, String, String);

/// Row shape shared by the movie queries: (id, title, genre, release_year).
type MovieRow = (i64, String, Option<String>, Option<i32>);

fn credential_from_row((id, username, password_hash, roles): UserRow) -> Credential {
    Credential {
        id,
        username,
        password_hash,
        roles: parse_role_list(&roles),
    }
}

fn movie_from_row((id, title, genre, release_year): MovieRow) -> Movie {
    Movie {
        id,
        title,
        genre,
        release_year,
    }
}

/// Store over a PostgreSQL pool. Schema lives in `migrations/`.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Append the filter's `WHERE` clause to `builder`.
    fn push_filter<'a>(builder: &mut QueryBuilder<'a, Postgres>, filter: &'a MovieFilter) {
        builder.push(" WHERE TRUE");
        if let Some(title) = filter.title() {
            builder
                .push(" AND title ILIKE '%' || ")
                .push_bind(title)
                .push(" || '%'");
        }
        if let Some(genre) = filter.genre() {
            builder.push(" AND genre = ").push_bind(genre);
        }
        if let Some(year) = filter.release_year {
            builder.push(" AND release_year = ").push_bind(year);
        }
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<Credential>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, password_hash, roles FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(credential_from_row))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Credential>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, password_hash, roles FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(credential_from_row))
    }

    async fn create(
        &self,
        username: &str,
        password_hash: &str,
        roles: &BTreeSet<Role>,
    ) -> Result<i64, StoreError> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO users (username, password_hash, roles) VALUES ($1, $2, $3) \
             ON CONFLICT (username) DO NOTHING \
             RETURNING id",
        )
        .bind(username)
        .bind(password_hash)
        .bind(format_role_list(roles))
        .fetch_optional(&self.pool)
        .await?;
        id.ok_or_else(|| StoreError::Conflict(format!("username '{username}' already exists")))
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn username_exists(&self, username: &str) -> Result<bool, StoreError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)",
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl MovieStore for PgStore {
    async fn list(
        &self,
        filter: &MovieFilter,
        page: PageRequest,
    ) -> Result<Page<Movie>, StoreError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM movies");
        Self::push_filter(&mut count, filter);
        let total: i64 = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut select =
            QueryBuilder::<Postgres>::new("SELECT id, title, genre, release_year FROM movies");
        Self::push_filter(&mut select, filter);
        select
            .push(" ORDER BY id LIMIT ")
            .push_bind(i64::from(page.size))
            .push(" OFFSET ")
            .push_bind(i64::try_from(page.offset()).unwrap_or(i64::MAX));
        let rows: Vec<MovieRow> = select.build_query_as::<MovieRow>().fetch_all(&self.pool).await?;

        Ok(Page::new(
            rows.into_iter().map(movie_from_row).collect(),
            page,
            u64::try_from(total).unwrap_or_default(),
        ))
    }

    async fn get(&self, id: i64) -> Result<Option<Movie>, StoreError> {
        let row = sqlx::query_as::<_, MovieRow>(
            "SELECT id, title, genre, release_year FROM movies WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(movie_from_row))
    }

    async fn insert(&self, movie: &NewMovie) -> Result<Movie, StoreError> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO movies (title, genre, release_year) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(&movie.title)
        .bind(&movie.genre)
        .bind(movie.release_year)
        .fetch_one(&self.pool)
        .await?;
        Ok(movie.clone().with_id(id))
    }

    async fn update(&self, movie: &Movie) -> Result<Option<Movie>, StoreError> {
        let result = sqlx::query(
            "UPDATE movies SET title = $2, genre = $3, release_year = $4 WHERE id = $1",
        )
        .bind(movie.id)
        .bind(&movie.title)
        .bind(&movie.genre)
        .bind(movie.release_year)
        .execute(&self.pool)
        .await?;
        Ok((result.rows_affected() > 0).then(|| movie.clone()))
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM movies WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn top_rated(&self) -> Result<Vec<TopRatedMovie>, StoreError> {
        let rows = sqlx::query_as::<_, (String, f64)>(
            "SELECT m.title, AVG(r.score)::float8 \
             FROM movies m JOIN ratings r ON r.movie_id = m.id \
             GROUP BY m.id, m.title \
             ORDER BY 2 DESC, m.id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(title, average_rating)| TopRatedMovie {
                title,
                average_rating,
            })
            .collect())
    }
}

#[async_trait]
impl RatingStore for PgStore {
    async fn find(&self, movie_id: i64, username: &str) -> Result<Option<Rating>, StoreError> {
        let row = sqlx::query_as::<_, (i64, i32)>(
            "SELECT r.id, r.score FROM ratings r \
             JOIN users u ON u.id = r.user_id \
             WHERE r.movie_id = $1 AND u.username = $2",
        )
        .bind(movie_id)
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(id, score)| Rating {
            id,
            movie_id,
            username: username.to_string(),
            score,
        }))
    }

    async fn upsert(
        &self,
        movie_id: i64,
        username: &str,
        score: i32,
    ) -> Result<(Rating, bool), StoreError> {
        let movie_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM movies WHERE id = $1)")
                .bind(movie_id)
                .fetch_one(&self.pool)
                .await?;
        if !movie_exists {
            return Err(StoreError::NotFound(format!("Movie with ID {movie_id} not found")));
        }

        // `xmax = 0` only holds for a freshly inserted row version.
        let row = sqlx::query_as::<_, (i64, bool)>(
            "INSERT INTO ratings (movie_id, user_id, score) \
             SELECT $1, u.id, $3 FROM users u WHERE u.username = $2 \
             ON CONFLICT (movie_id, user_id) DO UPDATE SET score = EXCLUDED.score \
             RETURNING id, (xmax = 0)",
        )
        .bind(movie_id)
        .bind(username)
        .bind(score)
        .fetch_optional(&self.pool)
        .await?;

        let (id, created) =
            row.ok_or_else(|| StoreError::NotFound(format!("User {username} not found")))?;
        Ok((
            Rating {
                id,
                movie_id,
                username: username.to_string(),
                score,
            },
            created,
        ))
    }

    async fn delete(&self, movie_id: i64, username: &str) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "DELETE FROM ratings r USING users u \
             WHERE r.user_id = u.id AND r.movie_id = $1 AND u.username = $2",
        )
        .bind(movie_id)
        .bind(username)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
