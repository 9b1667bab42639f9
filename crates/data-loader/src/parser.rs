//! Parser for the MovieLens CSV files.
//!
//! - movies.csv: movieId,title,genres
//! - ratings.csv: userId,movieId,rating,timestamp
//! - tags.csv: userId,movieId,tag,timestamp
//! - links.csv: movieId,imdbId,tmdbId
//!
//! Rows are read into raw records whose fields are all optional. An empty
//! field, or a numeric field that does not parse, becomes `None`; deciding
//! what to do about it is the preprocessor's job. The only hard failures
//! here are file-level: missing, empty, or a header without the expected
//! columns.

use crate::error::{DataLoadError, Result};
use crate::types::{Genre, MovieId, UserId};
use csv::{ReaderBuilder, Trim};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};

// =============================================================================
// Schema description
// =============================================================================

/// An expected header column and the alternative spellings accepted for it
#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
}

impl Column {
    const fn new(name: &'static str, aliases: &'static [&'static str]) -> Self {
        Self { name, aliases }
    }

    fn matches(&self, header: &str) -> bool {
        header == self.name || self.aliases.contains(&header)
    }
}

/// A raw row type that knows its file and header schema
pub trait RawRecord: DeserializeOwned {
    /// Default file name inside a dataset directory
    const FILE_NAME: &'static str;
    /// Expected columns, in the order used by [`RawRecord::count_nulls`]
    const COLUMNS: &'static [Column];

    /// Add one to `nulls[i]` for every missing field `i` of this row
    fn count_nulls(&self, nulls: &mut [usize]);
}

// =============================================================================
// Raw records
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawMovie {
    #[serde(
        rename = "movieId",
        alias = "movie_id",
        default,
        deserialize_with = "csv::invalid_option"
    )]
    pub movie_id: Option<MovieId>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub genres: Option<String>,
}

impl RawRecord for RawMovie {
    const FILE_NAME: &'static str = "movies.csv";
    const COLUMNS: &'static [Column] = &[
        Column::new("movieId", &["movie_id"]),
        Column::new("title", &[]),
        Column::new("genres", &[]),
    ];

    fn count_nulls(&self, nulls: &mut [usize]) {
        nulls[0] += self.movie_id.is_none() as usize;
        nulls[1] += self.title.is_none() as usize;
        nulls[2] += self.genres.is_none() as usize;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawRating {
    #[serde(
        rename = "userId",
        alias = "user_id",
        default,
        deserialize_with = "csv::invalid_option"
    )]
    pub user_id: Option<UserId>,
    #[serde(
        rename = "movieId",
        alias = "movie_id",
        default,
        deserialize_with = "csv::invalid_option"
    )]
    pub movie_id: Option<MovieId>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub rating: Option<f32>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub timestamp: Option<i64>,
}

impl RawRecord for RawRating {
    const FILE_NAME: &'static str = "ratings.csv";
    const COLUMNS: &'static [Column] = &[
        Column::new("userId", &["user_id"]),
        Column::new("movieId", &["movie_id"]),
        Column::new("rating", &[]),
        Column::new("timestamp", &[]),
    ];

    fn count_nulls(&self, nulls: &mut [usize]) {
        nulls[0] += self.user_id.is_none() as usize;
        nulls[1] += self.movie_id.is_none() as usize;
        nulls[2] += self.rating.is_none() as usize;
        nulls[3] += self.timestamp.is_none() as usize;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawTag {
    #[serde(
        rename = "userId",
        alias = "user_id",
        default,
        deserialize_with = "csv::invalid_option"
    )]
    pub user_id: Option<UserId>,
    #[serde(
        rename = "movieId",
        alias = "movie_id",
        default,
        deserialize_with = "csv::invalid_option"
    )]
    pub movie_id: Option<MovieId>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub timestamp: Option<i64>,
}

impl RawRecord for RawTag {
    const FILE_NAME: &'static str = "tags.csv";
    const COLUMNS: &'static [Column] = &[
        Column::new("userId", &["user_id"]),
        Column::new("movieId", &["movie_id"]),
        Column::new("tag", &[]),
        Column::new("timestamp", &[]),
    ];

    fn count_nulls(&self, nulls: &mut [usize]) {
        nulls[0] += self.user_id.is_none() as usize;
        nulls[1] += self.movie_id.is_none() as usize;
        nulls[2] += self.tag.is_none() as usize;
        nulls[3] += self.timestamp.is_none() as usize;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawLink {
    #[serde(
        rename = "movieId",
        alias = "movie_id",
        default,
        deserialize_with = "csv::invalid_option"
    )]
    pub movie_id: Option<MovieId>,
    #[serde(
        rename = "imdbId",
        alias = "imdb_id",
        default,
        deserialize_with = "csv::invalid_option"
    )]
    pub imdb_id: Option<u32>,
    #[serde(
        rename = "tmdbId",
        alias = "tmdb_id",
        default,
        deserialize_with = "csv::invalid_option"
    )]
    pub tmdb_id: Option<u32>,
}

impl RawRecord for RawLink {
    const FILE_NAME: &'static str = "links.csv";
    const COLUMNS: &'static [Column] = &[
        Column::new("movieId", &["movie_id"]),
        Column::new("imdbId", &["imdb_id"]),
        Column::new("tmdbId", &["tmdb_id"]),
    ];

    fn count_nulls(&self, nulls: &mut [usize]) {
        nulls[0] += self.movie_id.is_none() as usize;
        nulls[1] += self.imdb_id.is_none() as usize;
        nulls[2] += self.tmdb_id.is_none() as usize;
    }
}

// =============================================================================
// Loaded tables
// =============================================================================

/// Missing-value count for one column
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnNulls {
    pub column: String,
    pub nulls: usize,
}

/// Shape and null report for one loaded file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSummary {
    pub file: String,
    pub rows: usize,
    pub columns: Vec<String>,
    pub null_counts: Vec<ColumnNulls>,
    /// Rows the CSV reader could not decode at all
    pub malformed_rows: usize,
}

impl TableSummary {
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn total_nulls(&self) -> usize {
        self.null_counts.iter().map(|c| c.nulls).sum()
    }
}

/// Raw rows of one file plus its summary
#[derive(Debug, Clone)]
pub struct LoadedTable<T> {
    pub rows: Vec<T>,
    pub summary: TableSummary,
}

/// Parse one CSV file into raw records of type `T`
pub fn parse_table<T: RawRecord>(path: &Path) -> Result<LoadedTable<T>> {
    let file_name = path.display().to_string();

    let file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => DataLoadError::FileNotFound {
            path: file_name.clone(),
        },
        _ => DataLoadError::IoError {
            file: file_name.clone(),
            source: e,
        },
    })?;

    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| DataLoadError::Csv {
            file: file_name.clone(),
            source: e,
        })?
        .clone();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(DataLoadError::EmptyFile { file: file_name });
    }
    check_schema(&file_name, &headers, T::COLUMNS)?;

    let mut rows = Vec::new();
    let mut nulls = vec![0usize; T::COLUMNS.len()];
    let mut malformed_rows = 0;

    for (idx, result) in reader.deserialize::<T>().enumerate() {
        match result {
            Ok(row) => {
                row.count_nulls(&mut nulls);
                rows.push(row);
            }
            Err(e) if matches!(e.kind(), csv::ErrorKind::Io(_)) => {
                return Err(DataLoadError::Csv {
                    file: file_name,
                    source: e,
                });
            }
            Err(e) => {
                // +2: one for the header, one for 1-based line numbers
                debug!("Skipping malformed row at line {} in {}: {}", idx + 2, file_name, e);
                malformed_rows += 1;
            }
        }
    }

    if rows.is_empty() {
        return Err(DataLoadError::EmptyFile { file: file_name });
    }

    let summary = TableSummary {
        file: file_name,
        rows: rows.len(),
        columns: T::COLUMNS.iter().map(|c| c.name.to_string()).collect(),
        null_counts: T::COLUMNS
            .iter()
            .zip(nulls)
            .map(|(c, nulls)| ColumnNulls {
                column: c.name.to_string(),
                nulls,
            })
            .collect(),
        malformed_rows,
    };

    info!(
        "Parsed {} rows from {} ({} nulls, {} malformed rows)",
        summary.rows,
        summary.file,
        summary.total_nulls(),
        summary.malformed_rows
    );

    Ok(LoadedTable { rows, summary })
}

/// Validate once, at the load boundary, that every expected column exists
fn check_schema(file: &str, headers: &csv::StringRecord, columns: &[Column]) -> Result<()> {
    let missing: Vec<String> = columns
        .iter()
        .filter(|column| !headers.iter().any(|h| column.matches(h)))
        .map(|column| column.name.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(DataLoadError::SchemaMismatch {
            file: file.to_string(),
            missing,
        })
    }
}

/// Extract year from movie title
///
/// Example: "Toy Story (1995)" -> Some(1995)
///          "Movie Title" -> None
pub fn extract_year_from_title(title: &str) -> Option<u16> {
    let start = title.rfind('(')?;
    let end = title.rfind(')')?;
    if start < end {
        let year_str = &title[start + 1..end];
        if year_str.len() == 4 {
            return year_str.parse::<u16>().ok();
        }
    }
    None
}

/// Parse pipe-separated genres into a sorted, deduplicated set
///
/// Example: "Action|Adventure|Sci-Fi" -> {Action, Adventure, Sci-Fi}
///
/// Blank pieces are ignored; a field with no genre at all yields the
/// "(no genres listed)" placeholder so every movie has at least one label.
pub fn parse_genres(s: &str) -> BTreeSet<Genre> {
    let mut genres: BTreeSet<Genre> = s
        .split('|')
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(Genre::new)
        .collect();
    if genres.is_empty() {
        genres.insert(Genre::placeholder());
    }
    genres
}
