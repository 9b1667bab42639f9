//! Core domain types for the MovieLens CSV dataset.
//!
//! These are the cleaned, fixed-schema records produced by the preprocessor.
//! The raw, all-optional rows read straight from the CSV files live in
//! [`crate::parser`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

// =============================================================================
// Type Aliases
// =============================================================================

/// Unique identifier for a user
pub type UserId = u32;

/// Unique identifier for a movie
pub type MovieId = u32;

// =============================================================================
// Genre
// =============================================================================

/// Placeholder genre for movies without any genre label
pub const NO_GENRES_LISTED: &str = "(no genres listed)";

/// A single genre tag, e.g. `"Sci-Fi"`.
///
/// Genres are not a closed enum: the vocabulary is whatever the movie table
/// contains (MovieLens 20M adds `IMAX` and the placeholder, for example).
/// Ordering is lexicographic on the tag text, which is the column order of
/// the one-hot matrix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Genre(String);

impl Genre {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The "(no genres listed)" placeholder
    pub fn placeholder() -> Self {
        Self(NO_GENRES_LISTED.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_placeholder(&self) -> bool {
        self.0 == NO_GENRES_LISTED
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Genre {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Join genre names with ", " for display
pub fn join_genres<'a>(genres: impl IntoIterator<Item = &'a Genre>) -> String {
    genres
        .into_iter()
        .map(Genre::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

// =============================================================================
// Cleaned records
// =============================================================================

/// Represents a movie in the dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: MovieId,
    pub title: String,
    /// Year extracted from title (e.g., "Toy Story (1995)")
    pub year: Option<u16>,
    /// Sorted genre set; holds the placeholder when the source had none
    pub genres: BTreeSet<Genre>,
}

/// A single rating from a user for a movie
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub user_id: UserId,
    pub movie_id: MovieId,
    /// Rating value from 0.5 to 5.0 in half-star steps
    pub rating: f32,
    /// Unix timestamp when rating was made
    pub timestamp: i64,
    /// Calendar date (UTC) of `timestamp`
    pub date: NaiveDate,
}

/// A free-text tag a user attached to a movie
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub user_id: UserId,
    pub movie_id: MovieId,
    pub tag: String,
    pub timestamp: i64,
    pub date: NaiveDate,
}

/// External identifiers for a movie
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub movie_id: MovieId,
    pub imdb_id: u32,
    pub tmdb_id: u32,
}

// =============================================================================
// Statistics Types
// =============================================================================

/// Precomputed statistics for a movie
///
/// These are computed once when loading data for fast lookups later
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MovieStats {
    pub avg_rating: f32,
    pub rating_count: u32,
}

// =============================================================================
// DataIndex - The cleaned, in-memory dataset
// =============================================================================

/// Main data structure holding the cleaned tables and their indices.
///
/// Built by [`crate::preprocess::preprocess`]; read-only afterwards, so it
/// is shared behind an `Arc` by everything downstream.
#[derive(Debug)]
pub struct DataIndex {
    // Primary data stores
    pub(crate) movies: HashMap<MovieId, Movie>,
    pub(crate) ratings: Vec<Rating>,
    pub(crate) tags: Vec<Tag>,
    pub(crate) links: HashMap<MovieId, Link>,

    /// Positions in `ratings` per movie
    pub(crate) movie_ratings: HashMap<MovieId, Vec<usize>>,
    /// Movies grouped by genre, ids ascending
    pub(crate) genre_index: HashMap<Genre, Vec<MovieId>>,

    // Precomputed statistics
    pub(crate) movie_stats: HashMap<MovieId, MovieStats>,
}

impl DataIndex {
    /// Creates a new, empty DataIndex
    pub fn new() -> Self {
        Self {
            movies: HashMap::new(),
            ratings: Vec::new(),
            tags: Vec::new(),
            links: HashMap::new(),
            movie_ratings: HashMap::new(),
            genre_index: HashMap::new(),
            movie_stats: HashMap::new(),
        }
    }

    /// Get a movie by ID
    pub fn get_movie(&self, id: MovieId) -> Option<&Movie> {
        self.movies.get(&id)
    }

    /// Iterate over all movies in arbitrary order
    pub fn movies(&self) -> impl Iterator<Item = &Movie> {
        self.movies.values()
    }

    /// All movie ids, ascending
    pub fn all_movie_ids(&self) -> Vec<MovieId> {
        let mut ids: Vec<MovieId> = self.movies.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// All ratings, in file order
    pub fn ratings(&self) -> &[Rating] {
        &self.ratings
    }

    /// Ratings of one movie, in file order
    pub fn get_movie_ratings(&self, movie_id: MovieId) -> impl Iterator<Item = &Rating> {
        self.movie_ratings
            .get(&movie_id)
            .into_iter()
            .flatten()
            .filter_map(|&i| self.ratings.get(i))
    }

    /// All tags, in file order
    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn get_link(&self, movie_id: MovieId) -> Option<&Link> {
        self.links.get(&movie_id)
    }

    /// Get all movies in a specific genre
    pub fn get_movies_by_genre(&self, genre: &Genre) -> &[MovieId] {
        self.genre_index
            .get(genre)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Every genre that labels at least one movie, sorted
    pub fn genres(&self) -> BTreeSet<Genre> {
        self.genre_index.keys().cloned().collect()
    }

    /// Get precomputed statistics for a movie
    pub fn get_movie_stats(&self, movie_id: MovieId) -> Option<&MovieStats> {
        self.movie_stats.get(&movie_id)
    }

    /// Insert a movie; returns false and keeps the existing one on a duplicate id
    pub fn insert_movie(&mut self, movie: Movie) -> bool {
        if self.movies.contains_key(&movie.id) {
            return false;
        }
        self.movies.insert(movie.id, movie);
        true
    }

    pub fn insert_rating(&mut self, rating: Rating) {
        self.ratings.push(rating);
    }

    pub fn insert_tag(&mut self, tag: Tag) {
        self.tags.push(tag);
    }

    /// Insert a link; like `insert_movie`, the first link for an id wins
    pub fn insert_link(&mut self, link: Link) -> bool {
        if self.links.contains_key(&link.movie_id) {
            return false;
        }
        self.links.insert(link.movie_id, link);
        true
    }

    /// Get counts (movies, ratings, tags) for debugging/validation
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.movies.len(), self.ratings.len(), self.tags.len())
    }
}

// Implement Default trait for convenience
impl Default for DataIndex {
    fn default() -> Self {
        Self::new()
    }
}
