//! Descriptive statistics over the cleaned dataset.
//!
//! Everything here is a read-only pass over a `DataIndex`; the year window
//! filters ratings by the calendar year of their date.

use crate::types::{DataIndex, Genre, MovieId, Rating};
use chrono::Datelike;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::ops::RangeInclusive;

/// Year window used by the exploratory views when none is given
pub const DEFAULT_YEARS: RangeInclusive<i32> = 2005..=2015;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieRatingCount {
    pub movie_id: MovieId,
    pub title: String,
    pub ratings_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RatingBucket {
    pub rating: f32,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingDistribution {
    /// One bucket per distinct rating value, ascending
    pub buckets: Vec<RatingBucket>,
    pub total: usize,
    pub most_common: Option<RatingBucket>,
    pub mean: Option<f64>,
    /// Biased Fisher-Pearson skewness; `None` for fewer than two ratings
    /// or zero variance
    pub skewness: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct YearCount {
    pub year: i32,
    pub ratings_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct YearOverYear {
    pub latest_year: i32,
    pub latest_count: usize,
    pub previous_count: Option<usize>,
    /// Percent change against the previous year, when that year has ratings
    pub percent_change: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenreCount {
    pub genre: Genre,
    pub count: usize,
}

fn in_window<'a>(
    index: &'a DataIndex,
    years: &'a RangeInclusive<i32>,
) -> impl Iterator<Item = &'a Rating> + 'a {
    index
        .ratings()
        .iter()
        .filter(move |r| years.contains(&r.date.year()))
}

/// The `limit` movies with the most ratings inside `years`
///
/// Ratings of movies missing from the movie table are skipped.
pub fn most_rated_movies(
    index: &DataIndex,
    years: RangeInclusive<i32>,
    limit: usize,
) -> Vec<MovieRatingCount> {
    let mut counts: HashMap<MovieId, usize> = HashMap::new();
    for rating in in_window(index, &years) {
        *counts.entry(rating.movie_id).or_insert(0) += 1;
    }

    let mut top: Vec<MovieRatingCount> = counts
        .into_iter()
        .filter_map(|(movie_id, ratings_count)| {
            index.get_movie(movie_id).map(|movie| MovieRatingCount {
                movie_id,
                title: movie.title.clone(),
                ratings_count,
            })
        })
        .collect();

    top.sort_by(|a, b| {
        b.ratings_count
            .cmp(&a.ratings_count)
            .then_with(|| a.movie_id.cmp(&b.movie_id))
    });
    top.truncate(limit);
    top
}

/// Histogram and moments of rating values inside `years`
pub fn rating_distribution(index: &DataIndex, years: RangeInclusive<i32>) -> RatingDistribution {
    let values: Vec<f64> = in_window(index, &years).map(|r| r.rating as f64).collect();
    distribution_of(&values)
}

fn distribution_of(values: &[f64]) -> RatingDistribution {
    // Key by half stars so buckets are exact
    let mut by_half_star: BTreeMap<u32, usize> = BTreeMap::new();
    for &v in values {
        *by_half_star.entry((v * 2.0).round() as u32).or_insert(0) += 1;
    }
    let buckets: Vec<RatingBucket> = by_half_star
        .into_iter()
        .map(|(half, count)| RatingBucket {
            rating: half as f32 / 2.0,
            count,
        })
        .collect();

    // Highest count wins; ties go to the lower rating
    let most_common = buckets
        .iter()
        .copied()
        .fold(None, |best: Option<RatingBucket>, b| match best {
            Some(best) if best.count >= b.count => Some(best),
            _ => Some(b),
        });

    RatingDistribution {
        total: values.len(),
        most_common,
        mean: mean(values),
        skewness: skewness(values),
        buckets,
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// m3 / m2^1.5 with population moments
pub fn skewness(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mu = mean(values)?;
    let n = values.len() as f64;
    let m2 = values.iter().map(|v| (v - mu).powi(2)).sum::<f64>() / n;
    let m3 = values.iter().map(|v| (v - mu).powi(3)).sum::<f64>() / n;
    if m2 == 0.0 {
        return None;
    }
    Some(m3 / m2.powf(1.5))
}

/// Number of ratings per calendar year inside `years`, ascending by year
pub fn ratings_per_year(index: &DataIndex, years: RangeInclusive<i32>) -> Vec<YearCount> {
    let mut counts: BTreeMap<i32, usize> = BTreeMap::new();
    for rating in in_window(index, &years) {
        *counts.entry(rating.date.year()).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|(year, ratings_count)| YearCount {
            year,
            ratings_count,
        })
        .collect()
}

/// Latest year's count compared to the year before it
pub fn year_over_year(per_year: &[YearCount]) -> Option<YearOverYear> {
    let latest = per_year.iter().max_by_key(|y| y.year)?;
    let previous_count = per_year
        .iter()
        .find(|y| y.year == latest.year - 1)
        .map(|y| y.ratings_count);

    let percent_change = previous_count.filter(|&c| c > 0).map(|prev| {
        (latest.ratings_count as f64 - prev as f64) / prev as f64 * 100.0
    });

    Some(YearOverYear {
        latest_year: latest.year,
        latest_count: latest.ratings_count,
        previous_count,
        percent_change,
    })
}

/// Movies per genre, most common first, ties by genre name
pub fn genre_distribution(index: &DataIndex) -> Vec<GenreCount> {
    let mut counts: Vec<GenreCount> = index
        .genres()
        .into_iter()
        .map(|genre| GenreCount {
            count: index.get_movies_by_genre(&genre).len(),
            genre,
        })
        .collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.genre.cmp(&b.genre)));
    counts
}
