//! Movie catalog and rating models.

use serde::{Deserialize, Serialize};

/// Lowest accepted rating score.
pub const MIN_SCORE: i32 = 1;
/// Highest accepted rating score.
pub const MAX_SCORE: i32 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub genre: Option<String>,
    pub release_year: Option<i32>,
}

/// Movie fields before an id is assigned.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMovie {
    pub title: String,
    pub genre: Option<String>,
    pub release_year: Option<i32>,
}

impl NewMovie {
    pub fn with_id(self, id: i64) -> Movie {
        Movie {
            id,
            title: self.title,
            genre: self.genre,
            release_year: self.release_year,
        }
    }
}

/// A user's score for a movie. One per (movie, user).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub id: i64,
    pub movie_id: i64,
    pub username: String,
    pub score: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopRatedMovie {
    pub title: String,
    pub average_rating: f64,
}

/// Optional catalog filters. Blank strings are treated as absent.
#[derive(Debug, Clone, Default)]
pub struct MovieFilter {
    /// Case-insensitive substring match on the title.
    pub title: Option<String>,
    /// Exact genre match.
    pub genre: Option<String>,
    pub release_year: Option<i32>,
}

impl MovieFilter {
    pub fn title(&self) -> Option<&str> {
        non_blank(self.title.as_deref())
    }

    pub fn genre(&self) -> Option<&str> {
        non_blank(self.genre.as_deref())
    }

    pub fn matches(&self, movie: &Movie) -> bool {
        if let Some(title) = self.title()
            && !movie.title.to_lowercase().contains(&title.to_lowercase())
        {
            return false;
        }
        if let Some(genre) = self.genre()
            && movie.genre.as_deref() != Some(genre)
        {
            return false;
        }
        if let Some(year) = self.release_year
            && movie.release_year != Some(year)
        {
            return false;
        }
        true
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

/// Zero-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub number: u32,
    pub size: u32,
}

impl PageRequest {
    pub fn offset(&self) -> u64 {
        u64::from(self.number) * u64::from(self.size)
    }
}

/// One page of results plus paging metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u32,
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total_elements: u64) -> Self {
        let size = u64::from(request.size.max(1));
        Self {
            items,
            number: request.number,
            size: request.size,
            total_elements,
            total_pages: total_elements.div_ceil(size),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
