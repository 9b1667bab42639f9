//! Benchmarks for itemset mining
//!
//! Run with: cargo bench --package miner
//!
//! Uses a synthetic matrix shaped like MovieLens 20M (27k movies, 20 genres)
//! so it runs without the dataset.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use data_loader::{Genre, GenreMatrix};
use miner::{MiningParams, frequent_itemsets, generate_rules, mine};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeSet;

const GENRES: [&str; 20] = [
    "Action", "Adventure", "Animation", "Children", "Comedy", "Crime", "Documentary", "Drama",
    "Fantasy", "Film-Noir", "Horror", "IMAX", "Musical", "Mystery", "Romance", "Sci-Fi",
    "Thriller", "War", "Western", "(no genres listed)",
];

fn synthetic_matrix() -> GenreMatrix {
    let mut rng = StdRng::seed_from_u64(20);
    let sets: Vec<BTreeSet<Genre>> = (0..27_000)
        .map(|_| {
            let count = rng.random_range(1..=4);
            (0..count)
                .map(|_| Genre::from(GENRES[rng.random_range(0..GENRES.len() - 1)]))
                .collect()
        })
        .collect();
    GenreMatrix::from_genre_sets(sets.iter().enumerate().map(|(i, s)| (i as u32 + 1, s)))
}

fn bench_frequent_itemsets(c: &mut Criterion) {
    let matrix = synthetic_matrix();

    c.bench_function("frequent_itemsets_0.005", |b| {
        b.iter(|| {
            let itemsets = frequent_itemsets(black_box(&matrix), black_box(0.005), None);
            black_box(itemsets)
        })
    });
}

fn bench_generate_rules(c: &mut Criterion) {
    let matrix = synthetic_matrix();
    let itemsets = frequent_itemsets(&matrix, 0.005, None).expect("Failed to mine itemsets");

    c.bench_function("generate_rules_0.3", |b| {
        b.iter(|| {
            let rules = generate_rules(black_box(&itemsets), black_box(0.3), 0.0);
            black_box(rules)
        })
    });
}

fn bench_full_mining(c: &mut Criterion) {
    let matrix = synthetic_matrix();
    let params = MiningParams::new(0.001, 0.1);

    c.bench_function("mine_low_support", |b| {
        b.iter(|| {
            let output = mine(black_box(&matrix), black_box(&params));
            black_box(output)
        })
    });
}

criterion_group!(
    benches,
    bench_frequent_itemsets,
    bench_generate_rules,
    bench_full_mining
);
criterion_main!(benches);
