//! In-memory store used by tests and `--in-memory` server mode.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{MovieStore, RatingStore, StoreError, UserStore};
use crate::auth::Role;
use crate::models::auth::Credential;
use crate::models::catalog::{Movie, MovieFilter, NewMovie, Page, PageRequest, Rating, TopRatedMovie};

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<i64, Credential>,
    movies: BTreeMap<i64, Movie>,
    ratings: BTreeMap<i64, Rating>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Users, movies and ratings behind a single lock so cascades stay consistent.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<Credential>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Credential>, StoreError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn create(
        &self,
        username: &str,
        password_hash: &str,
        roles: &BTreeSet<Role>,
    ) -> Result<i64, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.username == username) {
            return Err(StoreError::Conflict(format!(
                "username '{username}' already exists"
            )));
        }
        let id = tables.next_id();
        tables.users.insert(
            id,
            Credential {
                id,
                username: username.to_string(),
                password_hash: password_hash.to_string(),
                roles: roles.clone(),
            },
        );
        Ok(id)
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(user) = tables.users.remove(&id) else {
            return Ok(false);
        };
        tables.ratings.retain(|_, r| r.username != user.username);
        Ok(true)
    }
}

#[async_trait]
impl MovieStore for MemoryStore {
    async fn list(
        &self,
        filter: &MovieFilter,
        page: PageRequest,
    ) -> Result<Page<Movie>, StoreError> {
        let tables = self.tables.read().await;
        let matching: Vec<&Movie> = tables.movies.values().filter(|m| filter.matches(m)).collect();
        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
            .take(page.size as usize)
            .cloned()
            .collect();
        Ok(Page::new(items, page, total))
    }

    async fn get(&self, id: i64) -> Result<Option<Movie>, StoreError> {
        Ok(self.tables.read().await.movies.get(&id).cloned())
    }

    async fn insert(&self, movie: &NewMovie) -> Result<Movie, StoreError> {
        let mut tables = self.tables.write().await;
        let id = tables.next_id();
        let movie = movie.clone().with_id(id);
        tables.movies.insert(id, movie.clone());
        Ok(movie)
    }

    async fn update(&self, movie: &Movie) -> Result<Option<Movie>, StoreError> {
        let mut tables = self.tables.write().await;
        match tables.movies.get_mut(&movie.id) {
            Some(existing) => {
                *existing = movie.clone();
                Ok(Some(movie.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.movies.remove(&id).is_none() {
            return Ok(false);
        }
        tables.ratings.retain(|_, r| r.movie_id != id);
        Ok(true)
    }

    async fn top_rated(&self) -> Result<Vec<TopRatedMovie>, StoreError> {
        let tables = self.tables.read().await;
        let mut sums: BTreeMap<i64, (i64, i64)> = BTreeMap::new();
        for rating in tables.ratings.values() {
            let entry = sums.entry(rating.movie_id).or_default();
            entry.0 += i64::from(rating.score);
            entry.1 += 1;
        }
        let mut ranked: Vec<(i64, TopRatedMovie)> = sums
            .into_iter()
            .filter_map(|(movie_id, (sum, count))| {
                tables.movies.get(&movie_id).map(|m| {
                    (
                        movie_id,
                        TopRatedMovie {
                            title: m.title.clone(),
                            average_rating: sum as f64 / count as f64,
                        },
                    )
                })
            })
            .collect();
        ranked.sort_by(|(a_id, a), (b_id, b)| {
            b.average_rating
                .total_cmp(&a.average_rating)
                .then(a_id.cmp(b_id))
        });
        Ok(ranked.into_iter().map(|(_, m)| m).collect())
    }
}

#[async_trait]
impl RatingStore for MemoryStore {
    async fn find(&self, movie_id: i64, username: &str) -> Result<Option<Rating>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .ratings
            .values()
            .find(|r| r.movie_id == movie_id && r.username == username)
            .cloned())
    }

    async fn upsert(
        &self,
        movie_id: i64,
        username: &str,
        score: i32,
    ) -> Result<(Rating, bool), StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.movies.contains_key(&movie_id) {
            return Err(StoreError::NotFound(format!("Movie with ID {movie_id} not found")));
        }
        if !tables.users.values().any(|u| u.username == username) {
            return Err(StoreError::NotFound(format!("User {username} not found")));
        }
        if let Some(existing) = tables
            .ratings
            .values_mut()
            .find(|r| r.movie_id == movie_id && r.username == username)
        {
            existing.score = score;
            return Ok((existing.clone(), false));
        }
        let id = tables.next_id();
        let rating = Rating {
            id,
            movie_id,
            username: username.to_string(),
            score,
        };
        tables.ratings.insert(id, rating.clone());
        Ok((rating, true))
    }

    async fn delete(&self, movie_id: i64, username: &str) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let before = tables.ratings.len();
        tables
            .ratings
            .retain(|_, r| !(r.movie_id == movie_id && r.username == username));
        Ok(tables.ratings.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_movie(title: &str, genre: &str, year: i32) -> NewMovie {
        NewMovie {
            title: title.into(),
            genre: Some(genre.into()),
            release_year: Some(year),
        }
    }

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        for (title, genre, year) in [
            ("Alien", "Horror", 1979),
            ("Aliens", "Action", 1986),
            ("The Matrix", "Sci-Fi", 1999),
            ("Heat", "Crime", 1995),
        ] {
            MovieStore::insert(&store, &new_movie(title, genre, year))
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn duplicate_username_is_conflict() {
        let store = MemoryStore::new();
        let roles = BTreeSet::from([Role::User]);
        store.create("user", "hash", &roles).await.unwrap();
        assert!(matches!(
            store.create("user", "hash2", &roles).await,
            Err(StoreError::Conflict(_))
        ));
        assert!(store.username_exists("user").await.unwrap());
    }

    #[tokio::test]
    async fn list_filters_and_paginates() {
        let store = seeded().await;
        let filter = MovieFilter {
            title: Some("alien".into()),
            ..Default::default()
        };
        let page = store
            .list(&filter, PageRequest { number: 0, size: 1 })
            .await
            .unwrap();
        assert_eq!(page.total_elements, 2);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.items[0].title, "Alien");

        let second = store
            .list(&filter, PageRequest { number: 1, size: 1 })
            .await
            .unwrap();
        assert_eq!(second.items[0].title, "Aliens");

        let beyond = store
            .list(&filter, PageRequest { number: 5, size: 1 })
            .await
            .unwrap();
        assert!(beyond.is_empty());
    }

    #[tokio::test]
    async fn upsert_creates_then_updates() {
        let store = seeded().await;
        store
            .create("user", "hash", &BTreeSet::from([Role::User]))
            .await
            .unwrap();
        let movie_id = store.list(&MovieFilter::default(), PageRequest { number: 0, size: 1 })
            .await
            .unwrap()
            .items[0]
            .id;

        let (rating, created) = store.upsert(movie_id, "user", 7).await.unwrap();
        assert!(created);
        assert_eq!(rating.score, 7);

        let (rating, created) = store.upsert(movie_id, "user", 9).await.unwrap();
        assert!(!created);
        assert_eq!(rating.score, 9);
        assert_eq!(store.find(movie_id, "user").await.unwrap().unwrap().score, 9);
    }

    #[tokio::test]
    async fn upsert_for_unknown_movie_is_not_found() {
        let store = MemoryStore::new();
        store
            .create("user", "hash", &BTreeSet::from([Role::User]))
            .await
            .unwrap();
        assert!(matches!(
            store.upsert(42, "user", 5).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn top_rated_orders_by_average_and_cascades_deletes() {
        let store = seeded().await;
        let roles = BTreeSet::from([Role::User]);
        let alice = store.create("alice", "h", &roles).await.unwrap();
        store.create("bob", "h", &roles).await.unwrap();
        let ids: Vec<i64> = store
            .list(&MovieFilter::default(), PageRequest { number: 0, size: 10 })
            .await
            .unwrap()
            .items
            .iter()
            .map(|m| m.id)
            .collect();

        store.upsert(ids[0], "alice", 4).await.unwrap();
        store.upsert(ids[0], "bob", 6).await.unwrap();
        store.upsert(ids[2], "alice", 9).await.unwrap();

        let top = store.top_rated().await.unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].title, "The Matrix");
        assert_eq!(top[1].average_rating, 5.0);

        assert!(MovieStore::delete(&store, ids[2]).await.unwrap());
        assert!(UserStore::delete(&store, alice).await.unwrap());
        let top = store.top_rated().await.unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].average_rating, 6.0);
    }
}
