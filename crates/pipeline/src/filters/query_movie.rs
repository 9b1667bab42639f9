//! Filter to remove the query movie from its own recommendations.
//!
//! The query movie always shares genres with the consequents it produced,
//! so this is the first filter in the pipeline.

use crate::candidate::{Candidate, RecommendationQuery};
use crate::traits::Filter;
use anyhow::Result;

/// Removes the candidate whose id is the query movie's id.
///
/// A genre-only query (no movie id) passes everything through.
pub struct QueryMovieFilter;

impl Filter for QueryMovieFilter {
    fn name(&self) -> &str {
        "QueryMovieFilter"
    }

    fn apply(
        &self,
        candidates: Vec<Candidate>,
        query: &RecommendationQuery,
    ) -> Result<Vec<Candidate>> {
        let Some(query_id) = query.movie_id else {
            return Ok(candidates);
        };
        Ok(candidates
            .into_iter()
            .filter(|candidate| candidate.movie_id != query_id)
            .collect())
    }
}
