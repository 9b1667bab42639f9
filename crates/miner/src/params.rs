//! Mining thresholds and their validation.

use crate::error::{MiningError, Result};
use serde::Serialize;

/// Thresholds for one mining run
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MiningParams {
    /// Minimum fraction of movies containing an itemset, in (0, 1]
    pub min_support: f64,
    /// Minimum rule confidence, in (0, 1]
    pub min_confidence: f64,
    /// Minimum rule lift, >= 0 (0 disables the filter)
    pub min_lift: f64,
    /// Largest itemset size to search, >= 1; unbounded when `None`
    pub max_len: Option<usize>,
}

impl Default for MiningParams {
    fn default() -> Self {
        Self {
            min_support: 0.005,
            min_confidence: 0.3,
            min_lift: 0.0,
            max_len: None,
        }
    }
}

impl MiningParams {
    pub fn new(min_support: f64, min_confidence: f64) -> Self {
        Self {
            min_support,
            min_confidence,
            ..Self::default()
        }
    }

    pub fn with_min_lift(mut self, min_lift: f64) -> Self {
        self.min_lift = min_lift;
        self
    }

    pub fn with_max_len(mut self, max_len: usize) -> Self {
        self.max_len = Some(max_len);
        self
    }

    /// Reject any threshold outside its range
    pub fn validate(&self) -> Result<()> {
        check_support(self.min_support)?;
        check_confidence(self.min_confidence)?;
        check_lift(self.min_lift)?;
        check_max_len(self.max_len)
    }
}

fn unit_interval(value: f64) -> bool {
    // NaN fails both comparisons
    value > 0.0 && value <= 1.0
}

pub(crate) fn check_support(min_support: f64) -> Result<()> {
    if unit_interval(min_support) {
        Ok(())
    } else {
        Err(MiningError::InvalidParameter {
            name: "min_support",
            value: min_support.to_string(),
            expected: "a value in (0, 1]",
        })
    }
}

pub(crate) fn check_confidence(min_confidence: f64) -> Result<()> {
    if unit_interval(min_confidence) {
        Ok(())
    } else {
        Err(MiningError::InvalidParameter {
            name: "min_confidence",
            value: min_confidence.to_string(),
            expected: "a value in (0, 1]",
        })
    }
}

pub(crate) fn check_lift(min_lift: f64) -> Result<()> {
    if min_lift >= 0.0 && min_lift.is_finite() {
        Ok(())
    } else {
        Err(MiningError::InvalidParameter {
            name: "min_lift",
            value: min_lift.to_string(),
            expected: "a finite value >= 0",
        })
    }
}

pub(crate) fn check_max_len(max_len: Option<usize>) -> Result<()> {
    match max_len {
        Some(0) => Err(MiningError::InvalidParameter {
            name: "max_len",
            value: "0".to_string(),
            expected: "at least 1",
        }),
        _ => Ok(()),
    }
}
