//! Candidates flowing through the filter pipeline, and the query that
//! produced them.

use data_loader::{Genre, MovieId};
use std::collections::BTreeSet;

/// What a recommendation request is about
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationQuery {
    /// The movie being asked about; `None` for a bare genre query
    pub movie_id: Option<MovieId>,
    /// Genres of the query movie (G)
    pub genres: BTreeSet<Genre>,
    /// Consequent genres collected from the matching rules
    pub consequent_genres: BTreeSet<Genre>,
}

/// A movie sharing at least one consequent genre with the query
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub movie_id: MovieId,
    /// Intersection of the movie's genres with the consequent genres
    pub matched_genres: BTreeSet<Genre>,
    /// 0.0 for a movie with no ratings
    pub avg_rating: f32,
    pub rating_count: u32,
}

impl Candidate {
    pub fn new(movie_id: MovieId, matched_genres: BTreeSet<Genre>) -> Self {
        Self {
            movie_id,
            matched_genres,
            avg_rating: 0.0,
            rating_count: 0,
        }
    }

    pub fn with_stats(mut self, avg_rating: f32, rating_count: u32) -> Self {
        self.avg_rating = avg_rating;
        self.rating_count = rating_count;
        self
    }
}
