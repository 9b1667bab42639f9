//! Cleaning raw tables into the typed `DataIndex`.
//!
//! Missing-value policy, per column:
//!
//! | table   | column                         | when missing / invalid     |
//! |---------|--------------------------------|----------------------------|
//! | movies  | movieId                        | drop row                   |
//! | movies  | title                          | fill `""`                  |
//! | movies  | genres                         | fill `(no genres listed)`  |
//! | ratings | userId, movieId, rating, ts    | drop row                   |
//! | tags    | userId, movieId, timestamp     | drop row                   |
//! | tags    | tag                            | fill `""`                  |
//! | links   | movieId, imdbId, tmdbId        | drop row                   |
//!
//! A rating outside [0.5, 5.0] and a timestamp that is negative or has no
//! calendar date count as missing. The raw tables are only borrowed.

use crate::index::RawDataset;
use crate::parser::{RawLink, RawMovie, RawRating, RawTag, extract_year_from_title, parse_genres};
use crate::types::*;
use chrono::{DateTime, NaiveDate};
use rayon::prelude::*;
use serde::Serialize;
use std::ops::RangeInclusive;
use tracing::{info, instrument};

/// Valid rating values
pub const RATING_RANGE: RangeInclusive<f32> = 0.5..=5.0;

/// Row accounting for one table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableReport {
    pub table: String,
    pub rows_in: usize,
    pub rows_kept: usize,
    pub rows_dropped: usize,
    /// Text fields replaced by their placeholder
    pub values_filled: usize,
}

impl TableReport {
    fn new(table: &str, rows_in: usize, rows_kept: usize, values_filled: usize) -> Self {
        Self {
            table: table.to_string(),
            rows_in,
            rows_kept,
            rows_dropped: rows_in - rows_kept,
            values_filled,
        }
    }
}

/// What the preprocessor did to each table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreprocessReport {
    pub movies: TableReport,
    pub ratings: TableReport,
    pub tags: TableReport,
    pub links: Option<TableReport>,
}

/// Integer seconds since the epoch -> UTC calendar date
///
/// Negative and out-of-range values yield `None`.
pub fn epoch_to_date(timestamp: i64) -> Option<NaiveDate> {
    if timestamp < 0 {
        return None;
    }
    DateTime::from_timestamp(timestamp, 0).map(|dt| dt.date_naive())
}

/// Clean one movie row; the `usize` is the number of placeholder fills
pub fn clean_movie(raw: &RawMovie) -> Option<(Movie, usize)> {
    let id = raw.movie_id?;
    let mut filled = 0;

    let title = match &raw.title {
        Some(title) => title.clone(),
        None => {
            filled += 1;
            String::new()
        }
    };
    let genres = match &raw.genres {
        Some(genres) => parse_genres(genres),
        None => {
            filled += 1;
            parse_genres("")
        }
    };

    let movie = Movie {
        id,
        year: extract_year_from_title(&title),
        title,
        genres,
    };
    Some((movie, filled))
}

pub fn clean_rating(raw: &RawRating) -> Option<Rating> {
    let rating = raw.rating.filter(|r| RATING_RANGE.contains(r))?;
    let timestamp = raw.timestamp?;
    Some(Rating {
        user_id: raw.user_id?,
        movie_id: raw.movie_id?,
        rating,
        timestamp,
        date: epoch_to_date(timestamp)?,
    })
}

/// Clean one tag row; the flag tells whether the tag text was filled
pub fn clean_tag(raw: &RawTag) -> Option<(Tag, bool)> {
    let timestamp = raw.timestamp?;
    let tag = Tag {
        user_id: raw.user_id?,
        movie_id: raw.movie_id?,
        tag: raw.tag.clone().unwrap_or_default(),
        timestamp,
        date: epoch_to_date(timestamp)?,
    };
    Some((tag, raw.tag.is_none()))
}

pub fn clean_link(raw: &RawLink) -> Option<Link> {
    Some(Link {
        movie_id: raw.movie_id?,
        imdb_id: raw.imdb_id?,
        tmdb_id: raw.tmdb_id?,
    })
}

/// Run the missing-value policy over every raw table and build the index
#[instrument(skip(raw))]
pub fn preprocess(raw: &RawDataset) -> (DataIndex, PreprocessReport) {
    let mut index = DataIndex::new();

    // Movies: first occurrence of an id wins
    let mut movies_kept = 0;
    let mut movies_filled = 0;
    for (movie, filled) in raw.movies.rows.iter().filter_map(clean_movie) {
        if index.insert_movie(movie) {
            movies_kept += 1;
            movies_filled += filled;
        }
    }

    // Ratings are the big table; clean in parallel, order is preserved
    let ratings: Vec<Rating> = raw.ratings.rows.par_iter().filter_map(clean_rating).collect();
    let ratings_kept = ratings.len();
    index.ratings = ratings;

    let mut tags_filled = 0;
    for (tag, filled) in raw.tags.rows.iter().filter_map(clean_tag) {
        tags_filled += filled as usize;
        index.insert_tag(tag);
    }
    let tags_kept = index.tags.len();

    // Links follow the same first-wins rule as movies
    let links = raw.links.as_ref().map(|links| {
        let kept = links
            .rows
            .iter()
            .filter_map(clean_link)
            .filter(|link| index.insert_link(*link))
            .count();
        TableReport::new("links", links.rows.len(), kept, 0)
    });

    index.build_secondary_indices();
    index.compute_movie_stats();

    let report = PreprocessReport {
        movies: TableReport::new("movies", raw.movies.rows.len(), movies_kept, movies_filled),
        ratings: TableReport::new("ratings", raw.ratings.rows.len(), ratings_kept, 0),
        tags: TableReport::new("tags", raw.tags.rows.len(), tags_kept, tags_filled),
        links,
    };

    info!(
        "Preprocessed: {} movies, {} ratings ({} dropped), {} tags ({} dropped)",
        report.movies.rows_kept,
        report.ratings.rows_kept,
        report.ratings.rows_dropped,
        report.tags.rows_kept,
        report.tags.rows_dropped
    );

    (index, report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_rating(timestamp: Option<i64>, rating: Option<f32>) -> RawRating {
        RawRating {
            user_id: Some(1),
            movie_id: Some(10),
            rating,
            timestamp,
        }
    }

    #[test]
    fn test_epoch_to_date() {
        assert_eq!(epoch_to_date(0), NaiveDate::from_ymd_opt(1970, 1, 1));
        assert_eq!(epoch_to_date(1_260_759_144), NaiveDate::from_ymd_opt(2009, 12, 14));
        assert_eq!(epoch_to_date(-1), None);
        assert_eq!(epoch_to_date(i64::MAX), None);
    }

    #[test]
    fn test_clean_rating_drops_missing_numeric_fields() {
        assert!(clean_rating(&raw_rating(Some(1_000_000_000), Some(4.0))).is_some());
        assert!(clean_rating(&raw_rating(None, Some(4.0))).is_none());
        assert!(clean_rating(&raw_rating(Some(1_000_000_000), None)).is_none());
        assert!(clean_rating(&raw_rating(Some(-5), Some(4.0))).is_none());
    }

    #[test]
    fn test_clean_rating_range() {
        assert!(clean_rating(&raw_rating(Some(1), Some(0.5))).is_some());
        assert!(clean_rating(&raw_rating(Some(1), Some(5.0))).is_some());
        assert!(clean_rating(&raw_rating(Some(1), Some(0.0))).is_none());
        assert!(clean_rating(&raw_rating(Some(1), Some(7.5))).is_none());
        assert!(clean_rating(&raw_rating(Some(1), Some(f32::NAN))).is_none());
    }

    #[test]
    fn test_clean_movie_fills_text_fields() {
        let raw = RawMovie {
            movie_id: Some(3),
            title: None,
            genres: None,
        };
        let (movie, filled) = clean_movie(&raw).unwrap();
        assert_eq!(filled, 2);
        assert_eq!(movie.title, "");
        assert_eq!(movie.genres.len(), 1);
        assert!(movie.genres.iter().all(Genre::is_placeholder));

        let no_id = RawMovie {
            movie_id: None,
            ..raw
        };
        assert!(clean_movie(&no_id).is_none());
    }

    #[test]
    fn test_clean_tag_fills_empty_text() {
        let raw = RawTag {
            user_id: Some(15),
            movie_id: Some(339),
            tag: None,
            timestamp: Some(1_138_537_770),
        };
        let (tag, filled) = clean_tag(&raw).unwrap();
        assert!(filled);
        assert_eq!(tag.tag, "");

        let no_timestamp = RawTag {
            timestamp: None,
            ..raw
        };
        assert!(clean_tag(&no_timestamp).is_none());
    }

    #[test]
    fn test_clean_link_requires_all_ids() {
        let raw = RawLink {
            movie_id: Some(1),
            imdb_id: Some(114709),
            tmdb_id: None,
        };
        assert!(clean_link(&raw).is_none());
    }
}
