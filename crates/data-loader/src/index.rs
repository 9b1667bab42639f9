//! Loading the dataset and building the DataIndex.
//!
//! - `RawDataset::load` parses the CSV files (in parallel) into raw tables
//! - `DataIndex::load_from_files` runs the preprocessor on top of that
//! - secondary indices and per-movie statistics are built once here

use crate::error::{DataLoadError, Result};
use crate::parser::{
    self, LoadedTable, RawLink, RawMovie, RawRating, RawRecord, RawTag, TableSummary,
};
use crate::preprocess::{self, PreprocessReport};
use crate::types::*;
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::info;

/// Locations of the source tables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub movies: PathBuf,
    pub ratings: PathBuf,
    pub tags: PathBuf,
    /// Optional; no links table is loaded when `None`
    pub links: Option<PathBuf>,
}

impl DataPaths {
    /// The standard MovieLens file names inside `data_dir`
    ///
    /// `links.csv` is only included when it exists.
    pub fn from_dir(data_dir: &Path) -> Self {
        let links = data_dir.join(RawLink::FILE_NAME);
        Self {
            movies: data_dir.join(RawMovie::FILE_NAME),
            ratings: data_dir.join(RawRating::FILE_NAME),
            tags: data_dir.join(RawTag::FILE_NAME),
            links: links.exists().then_some(links),
        }
    }
}

/// The four source tables exactly as read from disk
#[derive(Debug, Clone)]
pub struct RawDataset {
    pub movies: LoadedTable<RawMovie>,
    pub ratings: LoadedTable<RawRating>,
    pub tags: LoadedTable<RawTag>,
    pub links: Option<LoadedTable<RawLink>>,
}

impl RawDataset {
    /// Parse all tables; the first file-level failure halts the load
    pub fn load(paths: &DataPaths) -> Result<Self> {
        info!("Loading MovieLens tables from {:?}", paths.movies.parent());

        // Rayon's `join` runs two closures in parallel; nest for three-way
        let ((movies, tags), ratings) = rayon::join(
            || {
                rayon::join(
                    || parser::parse_table::<RawMovie>(&paths.movies),
                    || parser::parse_table::<RawTag>(&paths.tags),
                )
            },
            || parser::parse_table::<RawRating>(&paths.ratings),
        );

        let movies = movies?;
        let ratings = ratings?;
        let tags = tags?;
        let links = paths
            .links
            .as_deref()
            .map(parser::parse_table::<RawLink>)
            .transpose()?;

        Ok(Self {
            movies,
            ratings,
            tags,
            links,
        })
    }

    /// Row/column/null report for every loaded table
    pub fn summaries(&self) -> Vec<&TableSummary> {
        let mut summaries = vec![&self.movies.summary, &self.ratings.summary, &self.tags.summary];
        if let Some(links) = &self.links {
            summaries.push(&links.summary);
        }
        summaries
    }
}

impl DataIndex {
    /// Load and preprocess the dataset found in `data_dir`
    pub fn load_from_files(data_dir: &Path) -> Result<Self> {
        if !data_dir.is_dir() {
            return Err(DataLoadError::FileNotFound {
                path: data_dir.display().to_string(),
            });
        }
        let (index, _) = Self::load_from_paths(&DataPaths::from_dir(data_dir))?;
        Ok(index)
    }

    /// Load and preprocess, also returning the preprocessing report
    pub fn load_from_paths(paths: &DataPaths) -> Result<(Self, PreprocessReport)> {
        let raw = RawDataset::load(paths)?;
        Ok(preprocess::preprocess(&raw))
    }

    /// Build the genre -> movies and movie -> ratings indices
    pub fn build_secondary_indices(&mut self) {
        self.movie_ratings.clear();
        for (i, rating) in self.ratings.iter().enumerate() {
            self.movie_ratings.entry(rating.movie_id).or_default().push(i);
        }

        self.genre_index.clear();
        for (movie_id, movie) in &self.movies {
            for genre in &movie.genres {
                self.genre_index
                    .entry(genre.clone())
                    .or_insert_with(Vec::new)
                    .push(*movie_id);
            }
        }
        for ids in self.genre_index.values_mut() {
            ids.sort_unstable();
        }
    }

    /// Compute aggregate statistics for all movies
    ///
    /// Ratings whose movie is not in the movie table are left out.
    pub fn compute_movie_stats(&mut self) {
        let movies = &self.movies;
        let totals: HashMap<MovieId, (f64, u32)> = self
            .ratings
            .par_iter()
            .filter(|r| movies.contains_key(&r.movie_id))
            .fold(HashMap::new, |mut acc: HashMap<MovieId, (f64, u32)>, r| {
                let entry = acc.entry(r.movie_id).or_insert((0.0, 0));
                entry.0 += r.rating as f64;
                entry.1 += 1;
                acc
            })
            .reduce(HashMap::new, |mut acc, local| {
                for (movie_id, (sum, count)) in local {
                    let entry = acc.entry(movie_id).or_insert((0.0, 0));
                    entry.0 += sum;
                    entry.1 += count;
                }
                acc
            });

        self.movie_stats = totals
            .into_iter()
            .map(|(movie_id, (sum, rating_count))| {
                let stats = MovieStats {
                    avg_rating: (sum / rating_count as f64) as f32,
                    rating_count,
                };
                (movie_id, stats)
            })
            .collect();
    }
}
