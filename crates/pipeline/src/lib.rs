//! Pipeline from mined genre rules to ranked movie recommendations.
//!
//! This crate provides:
//! - Filter trait and implementations for candidate filtering
//! - FilterPipeline for composing filters
//! - GenreRecommender, which turns rules into ranked movies
//! - Analyzer, the end-to-end entry point with a memo of the last mining run
//!
//! ## Architecture
//! A request is processed in stages:
//! 1. The genre matrix is mined for itemsets and rules (reused when the
//!    parameters did not change)
//! 2. Rules applicable to the query movie yield consequent genres
//! 3. Movies carrying those genres become candidates
//! 4. Filters remove unwanted candidates (the query movie, thinly rated movies)
//! 5. Survivors are ranked and truncated
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::{Analyzer, PipelineConfig};
//! use miner::MiningParams;
//!
//! let mut analyzer = Analyzer::load(Path::new("data/ml-20m"))?;
//! let config = PipelineConfig::new(MiningParams::new(0.005, 0.3))
//!     .with_recommendation_count(10);
//!
//! for rec in analyzer.recommend(1, &config)? {
//!     println!("{} {:?}", rec.title, rec.matched_genres);
//! }
//! ```

pub mod analyzer;
pub mod candidate;
pub mod config;
pub mod filter_pipeline;
pub mod filters;
pub mod recommender;
pub mod traits;

// Re-export main types
pub use analyzer::{Analysis, Analyzer};
pub use candidate::{Candidate, RecommendationQuery};
pub use config::{DEFAULT_RECOMMENDATION_COUNT, PipelineConfig};
pub use filter_pipeline::FilterPipeline;
pub use recommender::{
    DEFAULT_ASSOCIATION_COUNT, GenreAssociation, GenreRecommender, Recommendation,
    associated_genres, collect_consequent_genres, matching_rules,
};
pub use traits::Filter;
