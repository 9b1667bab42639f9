//! Apriori frequent-itemset search over the one-hot genre matrix.
//!
//! ## Algorithm
//! 1. Count single genres; keep those with support >= min_support
//! 2. Join frequent k-itemsets that share their first k-1 genres into
//!    (k+1)-candidates
//! 3. Prune any candidate with an infrequent k-subset (anti-monotonicity)
//! 4. Count the survivors against the matrix; keep the frequent ones
//! 5. Repeat until a level comes back empty or `max_len` is reached
//!
//! Itemsets are handled as ascending column indices. The vocabulary is
//! sorted, so index order is also genre-name order.
//!
//! Low support thresholds make step 2 blow up combinatorially; that level
//! count is logged so slow runs are visible.

use crate::error::Result;
use crate::params::{check_max_len, check_support};
use data_loader::{Genre, GenreMatrix};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, instrument};

/// One frequent genre combination
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequentItemset {
    /// Genre names, sorted
    pub genres: Vec<Genre>,
    /// Fraction of movies containing every genre of the set
    pub support: f64,
    /// Absolute number of such movies
    pub count: usize,
    #[serde(skip)]
    columns: Vec<usize>,
}

impl FrequentItemset {
    /// Matrix column indices, ascending
    pub fn columns(&self) -> &[usize] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Result of one Apriori run
#[derive(Debug, Clone, PartialEq)]
pub struct FrequentItemsets {
    num_transactions: usize,
    vocabulary: Vec<Genre>,
    /// Sorted by support desc, size asc, then genre names
    itemsets: Vec<FrequentItemset>,
    counts: HashMap<Vec<usize>, usize>,
}

impl FrequentItemsets {
    fn empty(matrix: &GenreMatrix) -> Self {
        Self {
            num_transactions: matrix.num_rows(),
            vocabulary: matrix.vocabulary().to_vec(),
            itemsets: Vec::new(),
            counts: HashMap::new(),
        }
    }

    /// Number of movies (matrix rows) mined
    pub fn num_transactions(&self) -> usize {
        self.num_transactions
    }

    pub fn vocabulary(&self) -> &[Genre] {
        &self.vocabulary
    }

    pub fn itemsets(&self) -> &[FrequentItemset] {
        &self.itemsets
    }

    pub fn len(&self) -> usize {
        self.itemsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.itemsets.is_empty()
    }

    /// Absolute count of a frequent itemset given as ascending columns
    pub fn count_of(&self, columns: &[usize]) -> Option<usize> {
        self.counts.get(columns).copied()
    }

    /// Support of a frequent itemset given as ascending columns
    pub fn support_of(&self, columns: &[usize]) -> Option<f64> {
        self.count_of(columns)
            .map(|count| count as f64 / self.num_transactions as f64)
    }

    /// Genre names for ascending column indices
    pub fn genres_for(&self, columns: &[usize]) -> Vec<Genre> {
        columns
            .iter()
            .filter_map(|&c| self.vocabulary.get(c).cloned())
            .collect()
    }
}

/// Find every genre combination with support >= `min_support`
#[instrument(skip(matrix), fields(rows = matrix.num_rows(), columns = matrix.num_columns()))]
pub fn frequent_itemsets(
    matrix: &GenreMatrix,
    min_support: f64,
    max_len: Option<usize>,
) -> Result<FrequentItemsets> {
    check_support(min_support)?;
    check_max_len(max_len)?;

    let num_rows = matrix.num_rows();
    if num_rows == 0 {
        return Ok(FrequentItemsets::empty(matrix));
    }
    let is_frequent = |count: usize| count as f64 / num_rows as f64 >= min_support;

    // Level 1: one pass over the matrix counts every column
    let mut column_counts = vec![0usize; matrix.num_columns()];
    for row in matrix.rows() {
        for column in row.columns() {
            column_counts[column] += 1;
        }
    }
    let mut level: Vec<(Vec<usize>, usize)> = column_counts
        .into_iter()
        .enumerate()
        .filter(|&(_, count)| is_frequent(count))
        .map(|(column, count)| (vec![column], count))
        .collect();

    let mut counts: HashMap<Vec<usize>, usize> = HashMap::new();
    let mut size = 1;

    while !level.is_empty() {
        debug!("Level {}: {} frequent itemsets", size, level.len());
        level.sort();
        let frequent: Vec<Vec<usize>> = level.iter().map(|(items, _)| items.clone()).collect();
        counts.extend(level.drain(..));

        if max_len.is_some_and(|max| size >= max) {
            break;
        }

        let candidates = generate_candidates(&frequent);
        debug!("Level {}: {} candidates after pruning", size + 1, candidates.len());

        level = candidates
            .into_par_iter()
            .map(|candidate| {
                let count = matrix.count_rows_containing(&candidate);
                (candidate, count)
            })
            .filter(|&(_, count)| is_frequent(count))
            .collect();
        size += 1;
    }

    let mut itemsets: Vec<FrequentItemset> = counts
        .iter()
        .map(|(columns, &count)| FrequentItemset {
            genres: matrix.genres_for(columns),
            support: count as f64 / num_rows as f64,
            count,
            columns: columns.clone(),
        })
        .collect();
    itemsets.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.columns.len().cmp(&b.columns.len()))
            .then_with(|| a.columns.cmp(&b.columns))
    });

    info!(
        "Found {} frequent itemsets (min_support {}) over {} movies",
        itemsets.len(),
        min_support,
        num_rows
    );

    Ok(FrequentItemsets {
        num_transactions: num_rows,
        vocabulary: matrix.vocabulary().to_vec(),
        itemsets,
        counts,
    })
}

/// Join and prune step: `frequent` holds the sorted k-itemsets of one level
fn generate_candidates(frequent: &[Vec<usize>]) -> Vec<Vec<usize>> {
    let known: HashSet<&[usize]> = frequent.iter().map(|items| items.as_slice()).collect();
    let mut candidates = Vec::new();

    for (i, a) in frequent.iter().enumerate() {
        let prefix = &a[..a.len() - 1];
        for b in &frequent[i + 1..] {
            // Sorted input: itemsets sharing a prefix are contiguous
            if &b[..b.len() - 1] != prefix {
                break;
            }
            let mut candidate = a.clone();
            candidate.push(b[b.len() - 1]);

            if all_subsets_frequent(&candidate, &known) {
                candidates.push(candidate);
            }
        }
    }
    candidates
}

/// True when every subset with one item removed is in `known`
///
/// The two subsets obtained by dropping either of the last two items are
/// the join parents and are skipped.
fn all_subsets_frequent(candidate: &[usize], known: &HashSet<&[usize]>) -> bool {
    let mut subset = Vec::with_capacity(candidate.len() - 1);
    (0..candidate.len().saturating_sub(2)).all(|skip| {
        subset.clear();
        subset.extend(
            candidate
                .iter()
                .enumerate()
                .filter(|&(i, _)| i != skip)
                .map(|(_, &item)| item),
        );
        known.contains(subset.as_slice())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MiningError;
    use std::collections::BTreeSet;

    fn matrix(movies: &[&[&str]]) -> GenreMatrix {
        let sets: Vec<BTreeSet<Genre>> = movies
            .iter()
            .map(|genres| genres.iter().map(|&g| Genre::from(g)).collect())
            .collect();
        GenreMatrix::from_genre_sets(sets.iter().enumerate().map(|(i, s)| (i as u32 + 1, s)))
    }

    fn names(itemset: &FrequentItemset) -> Vec<&str> {
        itemset.genres.iter().map(Genre::as_str).collect()
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
    fn test_scenario_half_support() {
        let result = frequent_itemsets(&scenario(), 0.5, None).unwrap();
        let found: Vec<Vec<&str>> = result.itemsets().iter().map(names).collect();

        assert_eq!(
            found,
            vec![
                vec!["Action"],
                vec!["Comedy"],
                vec!["Action", "Comedy"],
            ]
        );
        assert_eq!(result.itemsets()[2].support, 0.5);
        // Drama has support 0.25
        assert!(!found.iter().any(|set| set.contains(&"Drama")));
    }

    #[test]
    fn test_support_equal_to_threshold_is_frequent() {
        let result = frequent_itemsets(&scenario(), 0.25, None).unwrap();
        assert!(result.itemsets().iter().any(|s| names(s) == vec!["Drama"]));
        assert!(result.itemsets().iter().any(|s| names(s) == vec!["Comedy", "Drama"]));
        assert_eq!(result.len(), 5);
    }

    #[test]
    fn test_invalid_support_rejected() {
        let err = frequent_itemsets(&scenario(), 1.1, None).unwrap_err();
        assert!(matches!(err, MiningError::InvalidParameter { .. }));
    }

    #[test]
    fn test_threshold_too_high_gives_empty_result() {
        let result = frequent_itemsets(&scenario(), 1.0, None).unwrap();
        assert!(result.is_empty());
        assert_eq!(result.num_transactions(), 4);
    }

    #[test]
    fn test_empty_matrix() {
        let result = frequent_itemsets(&matrix(&[]), 0.5, None).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_max_len_stops_search() {
        let result = frequent_itemsets(&scenario(), 0.25, Some(1)).unwrap();
        assert!(result.itemsets().iter().all(|s| s.len() == 1));
        assert_eq!(result.len(), 3);
    }

    #[test]
    fn test_three_way_itemsets() {
        let m = matrix(&[
            &["Action", "Adventure", "Sci-Fi"],
            &["Action", "Adventure", "Sci-Fi"],
            &["Action", "Adventure"],
            &["Drama"],
        ]);
        let result = frequent_itemsets(&m, 0.5, None).unwrap();
        let triple = result.itemsets().iter().find(|s| s.len() == 3).unwrap();
        assert_eq!(names(triple), vec!["Action", "Adventure", "Sci-Fi"]);
        assert_eq!(triple.count, 2);
        assert_eq!(result.support_of(triple.columns()), Some(0.5));
    }

    #[test]
    fn test_prune_drops_candidates_with_infrequent_subset() {
        // {0,1},{0,2} join to {0,1,2}; {1,2} is missing so it is pruned
        let frequent = vec![vec![0, 1], vec![0, 2]];
        assert!(generate_candidates(&frequent).is_empty());

        let frequent = vec![vec![0, 1], vec![0, 2], vec![1, 2]];
        assert_eq!(generate_candidates(&frequent), vec![vec![0, 1, 2]]);
    }
}
