//! Parameters for one end-to-end run.

use miner::{MiningError, MiningParams};
use serde::Serialize;

/// Number of recommendations returned when none is given
pub const DEFAULT_RECOMMENDATION_COUNT: usize = 10;

/// Mining thresholds plus the recommendation settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PipelineConfig {
    pub mining: MiningParams,
    /// n: distinct consequent genres collected, and movies returned; >= 1
    pub recommendation_count: usize,
    /// Candidates with fewer ratings are dropped; 0 disables the filter
    pub min_rating_count: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            mining: MiningParams::default(),
            recommendation_count: DEFAULT_RECOMMENDATION_COUNT,
            min_rating_count: 0,
        }
    }
}

impl PipelineConfig {
    pub fn new(mining: MiningParams) -> Self {
        Self {
            mining,
            ..Self::default()
        }
    }

    pub fn with_recommendation_count(mut self, n: usize) -> Self {
        self.recommendation_count = n;
        self
    }

    pub fn with_min_rating_count(mut self, min_count: u32) -> Self {
        self.min_rating_count = min_count;
        self
    }

    pub fn validate(&self) -> miner::Result<()> {
        self.mining.validate()?;
        if self.recommendation_count == 0 {
            return Err(MiningError::InvalidParameter {
                name: "recommendation_count",
                value: "0".to_string(),
                expected: "an integer >= 1",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.recommendation_count, 10);
        assert_eq!(config.min_rating_count, 0);
    }

    #[test]
    fn test_zero_recommendations_rejected() {
        let config = PipelineConfig::default().with_recommendation_count(0);
        assert!(matches!(
            config.validate(),
            Err(MiningError::InvalidParameter { name: "recommendation_count", .. })
        ));
    }

    #[test]
    fn test_mining_params_checked() {
        let config = PipelineConfig::new(MiningParams::new(0.0, 0.3));
        assert!(matches!(
            config.validate(),
            Err(MiningError::InvalidParameter { name: "min_support", .. })
        ));
    }
}
