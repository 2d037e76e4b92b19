use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Train/validation/test proportions attached to a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitRatios {
    pub train: f64,
    pub validation: f64,
    pub test: f64,
}

impl Default for SplitRatios {
    fn default() -> Self {
        Self {
            train: 0.75,
            validation: 0.25,
            test: 0.0,
        }
    }
}

/// Reasons a set of split ratios cannot drive a training run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SplitError {
    #[error("Train and validation ratios must be greater than zero (train={train}, validation={validation})")]
    ZeroRatio { train: f64, validation: f64 },
    #[error("Split ratios must not be negative or non-finite")]
    OutOfRange,
    #[error("Split ratios must sum to 1.0, got {sum}")]
    BadSum { sum: f64 },
}

impl SplitRatios {
    pub fn new(train: f64, validation: f64, test: f64) -> Self {
        Self {
            train,
            validation,
            test,
        }
    }

    /// Check the ratios can be planned: both train and validation present and
    /// the three parts summing to one (to six decimal places).
    pub fn validate(&self) -> Result<(), SplitError> {
        let parts = [self.train, self.validation, self.test];
        if parts.iter().any(|value| !value.is_finite() || *value < 0.0) {
            return Err(SplitError::OutOfRange);
        }
        if self.train == 0.0 || self.validation == 0.0 {
            return Err(SplitError::ZeroRatio {
                train: self.train,
                validation: self.validation,
            });
        }
        let sum: f64 = parts.iter().sum();
        if round6(sum) != 1.0 {
            return Err(SplitError::BadSum { sum });
        }
        Ok(())
    }
}

fn round6(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}

/// One dataset version within a project.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub id: String,
    pub user_id: String,
    pub project_id: String,
    pub version: i64,
    pub locked: bool,
    pub split: SplitRatios,
}
