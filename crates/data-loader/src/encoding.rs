//! One-hot genre encoding.
//!
//! The vocabulary is the sorted union of every movie's genres; it is fixed
//! for a given movie table and all rows share its column order.

use crate::types::{DataIndex, Genre, MovieId};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::hash::{DefaultHasher, Hash, Hasher};

/// One movie's row of the one-hot matrix
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct GenreRecord {
    pub movie_id: MovieId,
    /// `flags[i]` is true when the movie carries `vocabulary[i]`
    pub flags: Vec<bool>,
}

impl GenreRecord {
    /// Column indices set in this row, ascending
    pub fn columns(&self) -> impl Iterator<Item = usize> + '_ {
        self.flags
            .iter()
            .enumerate()
            .filter_map(|(i, &set)| set.then_some(i))
    }

    /// True when every column in `itemset` is set in this row
    pub fn contains_all(&self, itemset: &[usize]) -> bool {
        itemset.iter().all(|&i| self.flags.get(i).copied().unwrap_or(false))
    }
}

/// Movies x genres boolean matrix, rows ordered by movie id
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenreMatrix {
    vocabulary: Vec<Genre>,
    rows: Vec<GenreRecord>,
}

impl GenreMatrix {
    /// Encode every movie of the index
    pub fn from_index(index: &DataIndex) -> Self {
        Self::from_genre_sets(index.movies().map(|m| (m.id, &m.genres)))
    }

    /// Encode arbitrary (movie id, genre set) pairs
    ///
    /// Rows are sorted by movie id; a repeated id keeps its first genre set.
    pub fn from_genre_sets<'a, I>(movies: I) -> Self
    where
        I: IntoIterator<Item = (MovieId, &'a BTreeSet<Genre>)>,
    {
        let mut by_id: BTreeMap<MovieId, &BTreeSet<Genre>> = BTreeMap::new();
        for (id, genres) in movies {
            by_id.entry(id).or_insert(genres);
        }

        let vocabulary: Vec<Genre> = by_id
            .values()
            .flat_map(|genres| genres.iter())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .cloned()
            .collect();

        let rows = by_id
            .into_iter()
            .map(|(movie_id, genres)| GenreRecord {
                movie_id,
                flags: vocabulary.iter().map(|g| genres.contains(g)).collect(),
            })
            .collect();

        Self { vocabulary, rows }
    }

    pub fn vocabulary(&self) -> &[Genre] {
        &self.vocabulary
    }

    pub fn rows(&self) -> &[GenreRecord] {
        &self.rows
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_columns(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column of a genre; binary search works because the vocabulary is sorted
    pub fn column_index(&self, genre: &Genre) -> Option<usize> {
        self.vocabulary.binary_search(genre).ok()
    }

    pub fn genre(&self, column: usize) -> Option<&Genre> {
        self.vocabulary.get(column)
    }

    /// Genres for a list of column indices
    pub fn genres_for(&self, columns: &[usize]) -> Vec<Genre> {
        columns
            .iter()
            .filter_map(|&c| self.vocabulary.get(c).cloned())
            .collect()
    }

    /// Number of rows containing every column of `itemset`
    pub fn count_rows_containing(&self, itemset: &[usize]) -> usize {
        self.rows.iter().filter(|row| row.contains_all(itemset)).count()
    }

    /// Stable content hash, used as a memoization key
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.vocabulary.hash(&mut hasher);
        self.rows.hash(&mut hasher);
        hasher.finish()
    }
}
