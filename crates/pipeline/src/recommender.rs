//! Rule-based movie recommendations.
//!
//! ## Algorithm
//! 1. Keep the rules whose antecedent is a subset of the query genres G,
//!    in canonical rule order (lift desc, ...)
//! 2. Walk those rules collecting consequent genres until n distinct ones
//!    are gathered
//! 3. Every movie carrying one of those genres is a candidate; its matched
//!    genres are the intersection
//! 4. Run the filter pipeline (query movie first)
//! 5. Rank by matched-genre count desc, average rating desc, movie id asc
//!    and keep the first n

use crate::candidate::{Candidate, RecommendationQuery};
use crate::filter_pipeline::FilterPipeline;
use crate::filters::{MinimumRatingFilter, QueryMovieFilter};
use anyhow::{Result, anyhow, bail};
use data_loader::{DataIndex, Genre, MovieId};
use miner::{Rule, compare_rules};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Rules listed per genre by [`associated_genres`] when no count is given
pub const DEFAULT_ASSOCIATION_COUNT: usize = 10;

/// One ranked recommendation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub movie_id: MovieId,
    pub title: String,
    pub year: Option<u16>,
    pub genres: Vec<Genre>,
    /// Genres shared with the collected consequents
    pub matched_genres: Vec<Genre>,
    pub avg_rating: f32,
    pub rating_count: u32,
}

/// "Movies of genre X also tend to be ..."
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenreAssociation {
    pub genre: Genre,
    /// Highest-lift rules whose antecedent contains `genre`
    pub rules: Vec<Rule>,
    /// Distinct consequent genres of `rules`, sorted
    pub associated_genres: Vec<Genre>,
}

/// Rules applicable to a movie with `genres`, in canonical order
pub fn matching_rules<'a>(genres: &BTreeSet<Genre>, rules: &'a [Rule]) -> Vec<&'a Rule> {
    let mut matching: Vec<&Rule> = rules.iter().filter(|r| r.antecedent_within(genres)).collect();
    matching.sort_by(|a, b| compare_rules(a, b));
    matching
}

/// Consequent genres of `rules`, in rule order, until `n` distinct ones
pub fn collect_consequent_genres(rules: &[&Rule], n: usize) -> BTreeSet<Genre> {
    let mut collected = BTreeSet::new();
    'rules: for rule in rules {
        for genre in &rule.consequent {
            if collected.len() >= n {
                break 'rules;
            }
            collected.insert(genre.clone());
        }
    }
    collected
}

/// Top `top` rules by lift whose antecedent contains `genre`
pub fn associated_genres(genre: &Genre, rules: &[Rule], top: usize) -> GenreAssociation {
    let mut selected: Vec<Rule> = rules
        .iter()
        .filter(|r| r.antecedent_contains(genre))
        .cloned()
        .collect();
    selected.sort_by(compare_rules);
    selected.truncate(top);

    let associated: BTreeSet<Genre> = selected
        .iter()
        .flat_map(|r| r.consequent.iter().cloned())
        .collect();

    GenreAssociation {
        genre: genre.clone(),
        rules: selected,
        associated_genres: associated.into_iter().collect(),
    }
}

/// Turns mined rules into ranked movie recommendations
pub struct GenreRecommender {
    data_index: Arc<DataIndex>,
    filters: FilterPipeline,
}

impl GenreRecommender {
    /// Standard pipeline: drop the query movie, then (when `min_rating_count`
    /// is non-zero) thinly rated movies
    pub fn new(data_index: Arc<DataIndex>, min_rating_count: u32) -> Self {
        let mut filters = FilterPipeline::new().add_filter(QueryMovieFilter);
        if min_rating_count > 0 {
            filters = filters.add_filter(MinimumRatingFilter::new(min_rating_count));
        }
        Self::with_filters(data_index, filters)
    }

    pub fn with_filters(data_index: Arc<DataIndex>, filters: FilterPipeline) -> Self {
        Self {
            data_index,
            filters,
        }
    }

    /// Recommend up to `n` movies for `movie_id`
    ///
    /// An unknown id is an error; a movie no rule applies to gets an empty
    /// list.
    #[instrument(skip(self, rules), fields(rules = rules.len()))]
    pub fn recommend(
        &self,
        movie_id: MovieId,
        rules: &[Rule],
        n: usize,
    ) -> Result<Vec<Recommendation>> {
        let movie = self
            .data_index
            .get_movie(movie_id)
            .ok_or_else(|| anyhow!("Movie {} not found", movie_id))?;

        self.recommend_for_genres(Some(movie_id), &movie.genres, rules, n)
    }

    /// Recommend for an arbitrary genre set, optionally excluding a movie
    pub fn recommend_for_genres(
        &self,
        query_movie: Option<MovieId>,
        genres: &BTreeSet<Genre>,
        rules: &[Rule],
        n: usize,
    ) -> Result<Vec<Recommendation>> {
        if n == 0 {
            bail!("Recommendation count must be at least 1");
        }

        let matching = matching_rules(genres, rules);
        if matching.is_empty() {
            warn!("No rule applies to genres {:?}", genres);
            return Ok(Vec::new());
        }

        let query = RecommendationQuery {
            movie_id: query_movie,
            genres: genres.clone(),
            consequent_genres: collect_consequent_genres(&matching, n),
        };
        debug!(
            "{} matching rules, consequent genres {:?}",
            matching.len(),
            query.consequent_genres
        );

        let candidates = self.generate_candidates(&query);
        let mut candidates = self.filters.apply(candidates, &query)?;
        rank_candidates(&mut candidates);
        candidates.truncate(n);

        let recommendations: Vec<Recommendation> = candidates
            .into_iter()
            .filter_map(|c| self.to_recommendation(c))
            .collect();
        info!("Produced {} recommendations", recommendations.len());
        Ok(recommendations)
    }

    /// Every movie carrying at least one consequent genre
    fn generate_candidates(&self, query: &RecommendationQuery) -> Vec<Candidate> {
        let mut matched: BTreeMap<MovieId, BTreeSet<Genre>> = BTreeMap::new();
        for genre in &query.consequent_genres {
            for &movie_id in self.data_index.get_movies_by_genre(genre) {
                matched.entry(movie_id).or_default().insert(genre.clone());
            }
        }

        matched
            .into_iter()
            .map(|(movie_id, genres)| {
                let candidate = Candidate::new(movie_id, genres);
                match self.data_index.get_movie_stats(movie_id) {
                    Some(stats) => candidate.with_stats(stats.avg_rating, stats.rating_count),
                    None => candidate,
                }
            })
            .collect()
    }

    fn to_recommendation(&self, candidate: Candidate) -> Option<Recommendation> {
        let movie = self.data_index.get_movie(candidate.movie_id)?;
        Some(Recommendation {
            movie_id: movie.id,
            title: movie.title.clone(),
            year: movie.year,
            genres: movie.genres.iter().cloned().collect(),
            matched_genres: candidate.matched_genres.into_iter().collect(),
            avg_rating: candidate.avg_rating,
            rating_count: candidate.rating_count,
        })
    }
}

fn rank_candidates(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| {
        b.matched_genres
            .len()
            .cmp(&a.matched_genres.len())
            .then_with(|| b.avg_rating.total_cmp(&a.avg_rating))
            .then_with(|| a.movie_id.cmp(&b.movie_id))
    });
}
