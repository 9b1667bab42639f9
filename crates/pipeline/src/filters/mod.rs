//! Filter implementations for the candidate pipeline.
//!
//! This module contains the concrete filters that can be composed into a
//! FilterPipeline.

pub mod minimum_rating;
pub mod query_movie;

// Re-export for convenience
pub use minimum_rating::MinimumRatingFilter;
pub use query_movie::QueryMovieFilter;
