//! Core traits for the candidate filtering pipeline.
//!
//! This module defines the Filter trait that allows composable,
//! extensible filters to be applied to recommendation candidates.

use crate::candidate::{Candidate, RecommendationQuery};
use anyhow::Result;

/// Core trait for filtering candidates.
///
/// All filters must implement this trait to be used in the FilterPipeline.
///
/// ## Design Note
/// - `Send + Sync` allows filters to be used in concurrent contexts
/// - Filters take ownership of the Vec<Candidate> and return a filtered Vec
pub trait Filter: Send + Sync {
    /// Returns the name of this filter (for logging/debugging)
    fn name(&self) -> &str;

    /// Apply this filter to a set of candidates.
    ///
    /// # Arguments
    /// * `candidates` - The candidates to filter (takes ownership)
    /// * `query` - The query movie and the genres collected from its rules
    fn apply(
        &self,
        candidates: Vec<Candidate>,
        query: &RecommendationQuery,
    ) -> Result<Vec<Candidate>>;
}
