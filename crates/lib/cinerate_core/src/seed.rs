//! Demo data for `--in-memory` runs.

use std::collections::BTreeSet;

use tracing::info;

use crate::auth::password::hash_password;
use crate::auth::{AuthError, Role};
use crate::models::catalog::NewMovie;
use crate::store::Stores;

/// Demo accounts: (username, password, roles).
const DEMO_USERS: &[(&str, &str, &[Role])] = &[
    ("admin", "admin", &[Role::Admin, Role::User]),
    ("user", "admin", &[Role::User]),
];

const DEMO_MOVIES: &[(&str, &str, i32)] = &[
    ("The Shawshank Redemption", "Drama", 1994),
    ("The Matrix", "Sci-Fi", 1999),
    ("Alien", "Horror", 1979),
    ("Spirited Away", "Animation", 2001),
    ("Heat", "Crime", 1995),
];

/// Insert the demo users, movies and a handful of ratings. Existing users are left alone.
pub async fn seed_demo_data(stores: &Stores) -> Result<(), AuthError> {
    for (username, password, roles) in DEMO_USERS {
        if stores.users.username_exists(username).await? {
            continue;
        }
        let roles: BTreeSet<Role> = roles.iter().copied().collect();
        stores
            .users
            .create(username, &hash_password(password)?, &roles)
            .await?;
        info!(username, "seeded demo user");
    }

    let mut movie_ids = Vec::with_capacity(DEMO_MOVIES.len());
    for (title, genre, year) in DEMO_MOVIES {
        let movie = stores
            .movies
            .insert(&NewMovie {
                title: (*title).to_string(),
                genre: Some((*genre).to_string()),
                release_year: Some(*year),
            })
            .await?;
        movie_ids.push(movie.id);
    }

    for (movie_id, score) in movie_ids.iter().zip([9, 8, 7]) {
        stores.ratings.upsert(*movie_id, "user", score).await?;
    }
    info!(movies = movie_ids.len(), "seeded demo catalog");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::catalog::{MovieFilter, PageRequest};

    #[tokio::test]
    async fn seeds_users_movies_and_ratings() {
        let stores = Stores::in_memory();
        seed_demo_data(&stores).await.unwrap();

        let admin = stores.users.find_by_username("admin").await.unwrap().unwrap();
        assert!(admin.roles.contains(&Role::Admin));

        let page = stores
            .movies
            .list(&MovieFilter::default(), PageRequest { number: 0, size: 10 })
            .await
            .unwrap();
        assert_eq!(page.total_elements, DEMO_MOVIES.len() as u64);

        let top = stores.movies.top_rated().await.unwrap();
        assert_eq!(top[0].title, "The Shawshank Redemption");
    }
}
