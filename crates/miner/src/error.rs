//! Error types for the miner crate.

use thiserror::Error;

/// Errors raised by the itemset miner
///
/// An empty result is not an error: thresholds that leave no frequent
/// itemset produce empty itemset and rule lists.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MiningError {
    /// A threshold is outside its recognized range; raised before mining
    #[error("Invalid parameter {name} = {value}: expected {expected}")]
    InvalidParameter {
        name: &'static str,
        value: String,
        expected: &'static str,
    },

    /// Too many genres in one itemset to enumerate its antecedent splits
    #[error("Itemset of {size} genres is too large to split into rules")]
    ItemsetTooLarge { size: usize },
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, MiningError>;
