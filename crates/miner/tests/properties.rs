//! Property checks for the miner against brute-force counting.
//!
//! Matrices are generated from fixed seeds so failures are reproducible.

use data_loader::{Genre, GenreMatrix};
use miner::{MiningParams, mine};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{BTreeSet, HashSet};

const GENRES: [&str; 7] = [
    "Action", "Comedy", "Crime", "Drama", "Horror", "Romance", "Thriller",
];

fn random_matrix(seed: u64, movies: usize) -> GenreMatrix {
    let mut rng = StdRng::seed_from_u64(seed);
    let sets: Vec<BTreeSet<Genre>> = (0..movies)
        .map(|_| {
            let mut set: BTreeSet<Genre> = GENRES
                .iter()
                .filter(|_| rng.random_bool(0.35))
                .map(|&g| Genre::from(g))
                .collect();
            if set.is_empty() {
                set.insert(Genre::from(GENRES[rng.random_range(0..GENRES.len())]));
            }
            set
        })
        .collect();
    GenreMatrix::from_genre_sets(sets.iter().enumerate().map(|(i, s)| (i as u32 + 1, s)))
}

/// Count rows containing all `columns`, without using the matrix helpers
fn brute_count(matrix: &GenreMatrix, columns: &[usize]) -> usize {
    matrix
        .rows()
        .iter()
        .filter(|row| columns.iter().all(|&c| row.flags[c]))
        .count()
}

/// Every non-empty subset of the vocabulary as ascending columns
fn all_subsets(width: usize) -> Vec<Vec<usize>> {
    (1u32..(1 << width))
        .map(|mask| (0..width).filter(|&i| mask & (1 << i) != 0).collect())
        .collect()
}

const SEEDS: [u64; 5] = [1, 7, 42, 1234, 99_999];
const SUPPORTS: [f64; 4] = [0.05, 0.1, 0.2, 0.4];

#[test]
fn every_itemset_meets_min_support() {
    for seed in SEEDS {
        let matrix = random_matrix(seed, 200);
        for min_support in SUPPORTS {
            let output = mine(&matrix, &MiningParams::new(min_support, 0.1)).unwrap();
            for itemset in output.itemsets.itemsets() {
                let count = brute_count(&matrix, itemset.columns());
                assert_eq!(count, itemset.count);
                assert!(count as f64 / matrix.num_rows() as f64 >= min_support);
            }
        }
    }
}

#[test]
fn itemsets_match_brute_force_enumeration() {
    for seed in SEEDS {
        let matrix = random_matrix(seed, 150);
        for min_support in SUPPORTS {
            let output = mine(&matrix, &MiningParams::new(min_support, 0.1)).unwrap();
            let found: HashSet<Vec<usize>> = output
                .itemsets
                .itemsets()
                .iter()
                .map(|s| s.columns().to_vec())
                .collect();

            let expected: HashSet<Vec<usize>> = all_subsets(matrix.num_columns())
                .into_iter()
                .filter(|cols| {
                    brute_count(&matrix, cols) as f64 / matrix.num_rows() as f64 >= min_support
                })
                .collect();

            assert_eq!(found, expected, "seed {seed}, support {min_support}");
        }
    }
}

#[test]
fn no_superset_of_an_infrequent_itemset() {
    for seed in SEEDS {
        let matrix = random_matrix(seed, 120);
        let min_support = 0.15;
        let output = mine(&matrix, &MiningParams::new(min_support, 0.1)).unwrap();
        let found: Vec<&[usize]> = output.itemsets.itemsets().iter().map(|s| s.columns()).collect();

        for subset in all_subsets(matrix.num_columns()) {
            let frequent =
                brute_count(&matrix, &subset) as f64 / matrix.num_rows() as f64 >= min_support;
            if frequent {
                continue;
            }
            assert!(
                !found
                    .iter()
                    .any(|cols| subset.iter().all(|c| cols.contains(c))),
                "superset of infrequent {subset:?} reported"
            );
        }
    }
}

#[test]
fn confidence_is_joint_over_antecedent_support() {
    for seed in SEEDS {
        let matrix = random_matrix(seed, 200);
        let output = mine(&matrix, &MiningParams::new(0.05, 0.2)).unwrap();
        let n = matrix.num_rows() as f64;

        for rule in &output.rules {
            let columns = |genres: &[Genre]| -> Vec<usize> {
                genres.iter().filter_map(|g| matrix.column_index(g)).collect()
            };
            let antecedent = columns(&rule.antecedent);
            let mut joint = antecedent.clone();
            joint.extend(columns(&rule.consequent));
            joint.sort_unstable();

            let sup_a = brute_count(&matrix, &antecedent) as f64 / n;
            let sup_joint = brute_count(&matrix, &joint) as f64 / n;

            assert!((rule.confidence - sup_joint / sup_a).abs() < 1e-9);
            assert!((rule.support - sup_joint).abs() < 1e-9);
            assert!(rule.confidence >= 0.2);
        }
    }
}

#[test]
fn rule_lift_uses_consequent_support() {
    let matrix = random_matrix(3, 250);
    let output = mine(&matrix, &MiningParams::new(0.05, 0.1).with_min_lift(1.0)).unwrap();
    for rule in &output.rules {
        assert!(rule.lift >= 1.0);
        assert!((rule.lift - rule.confidence / rule.consequent_support).abs() < 1e-9);
    }
}

#[test]
fn mining_twice_gives_identical_output() {
    let matrix = random_matrix(42, 300);
    let params = MiningParams::new(0.05, 0.3);
    assert_eq!(mine(&matrix, &params).unwrap(), mine(&matrix, &params).unwrap());
}
