//! # Miner Crate
//!
//! Frequent genre itemsets and association rules over the one-hot genre
//! matrix built by `data-loader`.
//!
//! ## Components
//!
//! - **apriori**: level-wise frequent-itemset search with subset pruning
//! - **rules**: antecedent => consequent rules with confidence, lift,
//!   leverage and conviction, in a canonical order
//! - **params**: thresholds and their validation
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::{DataIndex, GenreMatrix};
//! use miner::{MiningParams, mine};
//!
//! let matrix = GenreMatrix::from_index(&index);
//! let output = mine(&matrix, &MiningParams::new(0.005, 0.3))?;
//!
//! for rule in output.rules.iter().take(10) {
//!     println!("{:?} => {:?} (lift {:.2})", rule.antecedent, rule.consequent, rule.lift);
//! }
//! ```
//!
//! Same matrix and parameters always give the same itemsets and rules in
//! the same order.

pub mod apriori;
pub mod error;
pub mod params;
pub mod rules;

pub use apriori::{FrequentItemset, FrequentItemsets, frequent_itemsets};
pub use error::{MiningError, Result};
pub use params::MiningParams;
pub use rules::{Rule, RuleSummary, compare_rules, generate_rules};

use data_loader::GenreMatrix;
use tracing::warn;

/// Itemsets and rules of one mining run
#[derive(Debug, Clone, PartialEq)]
pub struct MiningOutput {
    pub params: MiningParams,
    pub itemsets: FrequentItemsets,
    pub rules: Vec<Rule>,
}

impl MiningOutput {
    pub fn summary(&self) -> Option<RuleSummary> {
        RuleSummary::from_rules(&self.rules)
    }
}

/// Validate `params`, then run Apriori and rule generation
///
/// Nothing is mined when a parameter is out of range. Thresholds that
/// leave nothing frequent give an empty output, not an error.
pub fn mine(matrix: &GenreMatrix, params: &MiningParams) -> Result<MiningOutput> {
    params.validate()?;

    let itemsets = frequent_itemsets(matrix, params.min_support, params.max_len)?;
    if itemsets.is_empty() {
        warn!(
            "No frequent itemsets at min_support {}; try a lower threshold",
            params.min_support
        );
    }

    let rules = generate_rules(&itemsets, params.min_confidence, params.min_lift)?;
    if rules.is_empty() && !itemsets.is_empty() {
        warn!(
            "No rules at min_confidence {} / min_lift {}",
            params.min_confidence, params.min_lift
        );
    }

    Ok(MiningOutput {
        params: *params,
        itemsets,
        rules,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::Genre;
    use std::collections::BTreeSet;

    fn matrix(movies: &[&[&str]]) -> GenreMatrix {
        let sets: Vec<BTreeSet<Genre>> = movies
            .iter()
            .map(|genres| genres.iter().map(|&g| Genre::from(g)).collect())
            .collect();
        GenreMatrix::from_genre_sets(sets.iter().enumerate().map(|(i, s)| (i as u32 + 1, s)))
    }

    fn scenario() -> GenreMatrix {
        matrix(&[
            &["Action", "Comedy"],
            &["Action"],
            &["Comedy", "Drama"],
            &["Action", "Comedy"],
        ])
    }

    #[test]
    fn test_mine_scenario() {
        let output = mine(&scenario(), &MiningParams::new(0.5, 0.5)).unwrap();
        assert_eq!(output.itemsets.len(), 3);
        // Action <=> Comedy, both with confidence 2/3
        assert_eq!(output.rules.len(), 2);
        assert!(output.summary().is_some());
    }

    #[test]
    fn test_invalid_params_fail_before_mining() {
        let err = mine(&scenario(), &MiningParams::new(1.1, 0.5)).unwrap_err();
        assert!(matches!(
            err,
            MiningError::InvalidParameter { name: "min_support", .. }
        ));

        // Confidence is checked up front too, even though support is fine
        let err = mine(&scenario(), &MiningParams::new(0.5, 2.0)).unwrap_err();
        assert!(matches!(
            err,
            MiningError::InvalidParameter { name: "min_confidence", .. }
        ));
    }

    #[test]
    fn test_nothing_frequent_is_not_an_error() {
        let output = mine(&scenario(), &MiningParams::new(1.0, 0.5)).unwrap();
        assert!(output.itemsets.is_empty());
        assert!(output.rules.is_empty());
        assert!(output.summary().is_none());
    }

    #[test]
    fn test_mining_is_deterministic() {
        let params = MiningParams::new(0.25, 0.1);
        let first = mine(&scenario(), &params).unwrap();
        let second = mine(&scenario(), &params).unwrap();
        assert_eq!(first, second);
    }
}
