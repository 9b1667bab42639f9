//! Filter to drop thinly rated movies.
//!
//! A movie with a handful of ratings can top an average-rating ranking by
//! accident; a minimum rating count keeps those out.

use crate::candidate::{Candidate, RecommendationQuery};
use crate::traits::Filter;
use anyhow::Result;

/// Removes candidates with fewer than `min_count` ratings.
///
/// A `min_count` of 0 keeps every candidate, including unrated ones.
pub struct MinimumRatingFilter {
    min_count: u32,
}

impl MinimumRatingFilter {
    pub fn new(min_count: u32) -> Self {
        Self { min_count }
    }
}

impl Filter for MinimumRatingFilter {
    fn name(&self) -> &str {
        "MinimumRatingFilter"
    }

    fn apply(
        &self,
        candidates: Vec<Candidate>,
        _query: &RecommendationQuery,
    ) -> Result<Vec<Candidate>> {
        Ok(candidates
            .into_iter()
            .filter(|candidate| candidate.rating_count >= self.min_count)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn query() -> RecommendationQuery {
        RecommendationQuery {
            movie_id: Some(1),
            genres: BTreeSet::new(),
            consequent_genres: BTreeSet::new(),
        }
    }

    #[test]
    fn test_minimum_rating_filter() {
        let candidates = vec![
            Candidate::new(1, BTreeSet::new()).with_stats(4.5, 20),
            Candidate::new(2, BTreeSet::new()).with_stats(2.0, 10),
            Candidate::new(3, BTreeSet::new()).with_stats(5.0, 5),
        ];

        let filtered = MinimumRatingFilter::new(10).apply(candidates, &query()).unwrap();
        let ids: Vec<u32> = filtered.iter().map(|c| c.movie_id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_zero_keeps_unrated_movies() {
        let candidates = vec![Candidate::new(7, BTreeSet::new())];
        let filtered = MinimumRatingFilter::new(0).apply(candidates, &query()).unwrap();
        assert_eq!(filtered.len(), 1);
    }
}
