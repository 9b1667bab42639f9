//! End-to-end entry point: loaded data in, itemsets, rules and
//! recommendations out.
//!
//! The `Analyzer` owns the read-only `DataIndex` and its genre matrix. It
//! keeps the output of the last mining run, keyed by the matrix fingerprint
//! and the exact bit patterns of the parameters; asking again with the same
//! parameters reuses it, any change replaces it.

use crate::config::PipelineConfig;
use crate::recommender::{GenreAssociation, GenreRecommender, Recommendation, associated_genres};
use anyhow::{Context, Result};
use data_loader::{DataIndex, Genre, GenreMatrix, MovieId};
use miner::{MiningOutput, MiningParams, mine};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CacheKey {
    fingerprint: u64,
    min_support: u64,
    min_confidence: u64,
    min_lift: u64,
    max_len: Option<usize>,
}

impl CacheKey {
    fn new(fingerprint: u64, params: &MiningParams) -> Self {
        Self {
            fingerprint,
            min_support: params.min_support.to_bits(),
            min_confidence: params.min_confidence.to_bits(),
            min_lift: params.min_lift.to_bits(),
            max_len: params.max_len,
        }
    }
}

/// Everything one `run` produces
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub movie_id: MovieId,
    pub config: PipelineConfig,
    pub num_itemsets: usize,
    pub num_rules: usize,
    pub recommendations: Vec<Recommendation>,
}

pub struct Analyzer {
    data_index: Arc<DataIndex>,
    matrix: GenreMatrix,
    fingerprint: u64,
    last_run: Option<(CacheKey, Arc<MiningOutput>)>,
}

impl Analyzer {
    pub fn new(data_index: Arc<DataIndex>) -> Self {
        let matrix = GenreMatrix::from_index(&data_index);
        let fingerprint = matrix.fingerprint();
        info!(
            "Genre matrix: {} movies x {} genres",
            matrix.num_rows(),
            matrix.num_columns()
        );
        Self {
            data_index,
            matrix,
            fingerprint,
            last_run: None,
        }
    }

    /// Load a MovieLens directory and build the matrix
    pub fn load(data_dir: &Path) -> Result<Self> {
        let index = DataIndex::load_from_files(data_dir)
            .with_context(|| format!("Failed to load dataset from {}", data_dir.display()))?;
        Ok(Self::new(Arc::new(index)))
    }

    pub fn data_index(&self) -> &Arc<DataIndex> {
        &self.data_index
    }

    pub fn matrix(&self) -> &GenreMatrix {
        &self.matrix
    }

    /// Mine with `params`, reusing the previous output when nothing changed
    pub fn mine(&mut self, params: &MiningParams) -> Result<Arc<MiningOutput>> {
        let key = CacheKey::new(self.fingerprint, params);
        if let Some((cached_key, output)) = &self.last_run {
            if *cached_key == key {
                debug!("Reusing mining output for {:?}", params);
                return Ok(Arc::clone(output));
            }
        }

        let output = Arc::new(self.mine_uncached(params)?);
        self.last_run = Some((key, Arc::clone(&output)));
        Ok(output)
    }

    /// Mine without touching the memo
    pub fn mine_uncached(&self, params: &MiningParams) -> Result<MiningOutput> {
        mine(&self.matrix, params).context("Mining failed")
    }

    /// Mine (memoized) and recommend for `movie_id`
    pub fn recommend(
        &mut self,
        movie_id: MovieId,
        config: &PipelineConfig,
    ) -> Result<Vec<Recommendation>> {
        config.validate()?;
        let output = self.mine(&config.mining)?;
        self.recommender(config)
            .recommend(movie_id, &output.rules, config.recommendation_count)
    }

    /// Same as [`Analyzer::recommend`] but always mines afresh
    pub fn recommend_uncached(
        &self,
        movie_id: MovieId,
        config: &PipelineConfig,
    ) -> Result<Vec<Recommendation>> {
        config.validate()?;
        let output = self.mine_uncached(&config.mining)?;
        self.recommender(config)
            .recommend(movie_id, &output.rules, config.recommendation_count)
    }

    /// Full pipeline for one query movie
    pub fn run(&mut self, movie_id: MovieId, config: &PipelineConfig) -> Result<Analysis> {
        config.validate()?;
        let output = self.mine(&config.mining)?;
        let recommendations = self.recommender(config).recommend(
            movie_id,
            &output.rules,
            config.recommendation_count,
        )?;

        Ok(Analysis {
            movie_id,
            config: *config,
            num_itemsets: output.itemsets.len(),
            num_rules: output.rules.len(),
            recommendations,
        })
    }

    /// Top rules by lift whose antecedent contains `genre`
    pub fn associations(
        &mut self,
        genre: &Genre,
        params: &MiningParams,
        top: usize,
    ) -> Result<GenreAssociation> {
        if self.matrix.column_index(genre).is_none() {
            anyhow::bail!("Unknown genre '{}'", genre);
        }
        let output = self.mine(params)?;
        Ok(associated_genres(genre, &output.rules, top))
    }

    fn recommender(&self, config: &PipelineConfig) -> GenreRecommender {
        GenreRecommender::new(Arc::clone(&self.data_index), config.min_rating_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::Movie;

    fn create_test_analyzer() -> Analyzer {
        let mut index = DataIndex::new();
        let scenario: [&[&str]; 4] = [
            &["Action", "Comedy"],
            &["Action"],
            &["Comedy", "Drama"],
            &["Action", "Comedy"],
        ];
        for (i, genres) in scenario.iter().enumerate() {
            index.insert_movie(Movie {
                id: i as u32 + 1,
                title: format!("Movie {}", i + 1),
                year: None,
                genres: genres.iter().map(|&g| Genre::from(g)).collect(),
            });
        }
        index.build_secondary_indices();
        Analyzer::new(Arc::new(index))
    }

    #[test]
    fn test_same_params_reuse_output() {
        let mut analyzer = create_test_analyzer();
        let params = MiningParams::new(0.5, 0.5);

        let first = analyzer.mine(&params).unwrap();
        let second = analyzer.mine(&params).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_param_change_replaces_output() {
        let mut analyzer = create_test_analyzer();
        let first = analyzer.mine(&MiningParams::new(0.5, 0.5)).unwrap();
        let changed = analyzer.mine(&MiningParams::new(0.25, 0.5)).unwrap();
        assert!(!Arc::ptr_eq(&first, &changed));
        assert_eq!(first.itemsets.len(), 3);
        assert_eq!(changed.itemsets.len(), 5);

        // Back to the first params: the memo only holds the latest run
        let again = analyzer.mine(&MiningParams::new(0.5, 0.5)).unwrap();
        assert!(!Arc::ptr_eq(&first, &again));
        assert_eq!(*first, *again);
    }

    #[test]
    fn test_invalid_params_leave_memo_untouched() {
        let mut analyzer = create_test_analyzer();
        let params = MiningParams::new(0.5, 0.5);
        let first = analyzer.mine(&params).unwrap();

        let err = analyzer.mine(&MiningParams::new(1.1, 0.5)).unwrap_err();
        assert!(err.downcast_ref::<miner::MiningError>().is_some());
        assert!(Arc::ptr_eq(&first, &analyzer.mine(&params).unwrap()));
    }

    #[test]
    fn test_run_excludes_query_movie() {
        let mut analyzer = create_test_analyzer();
        let config = PipelineConfig::new(MiningParams::new(0.25, 0.1));
        let analysis = analyzer.run(2, &config).unwrap();

        assert_eq!(analysis.num_itemsets, 5);
        assert!(!analysis.recommendations.is_empty());
        assert!(analysis.recommendations.iter().all(|r| r.movie_id != 2));
    }

    #[test]
    fn test_unknown_genre_rejected() {
        let mut analyzer = create_test_analyzer();
        let err = analyzer
            .associations(&Genre::from("Western"), &MiningParams::default(), 10)
            .unwrap_err();
        assert!(err.to_string().contains("Western"));
    }
}
