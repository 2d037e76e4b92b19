//! Train/validation/test sizing.

/// Number of annotations that go into each partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SplitCounts {
    pub train: usize,
    pub validation: usize,
    pub test: usize,
}

impl SplitCounts {
    pub fn total(&self) -> usize {
        self.train + self.validation + self.test
    }

    /// Both train and validation partitions must be non-empty to train.
    pub fn is_trainable(&self) -> bool {
        self.train > 0 && self.validation > 0
    }
}

/// Size the three partitions for `total` annotations.
///
/// Train and validation are floored; whatever is left goes to test, or back to
/// train when the test ratio is zero. The counts always add up to `total`.
pub fn split_counts(
    total: usize,
    train_ratio: f64,
    validation_ratio: f64,
    test_ratio: f64,
) -> SplitCounts {
    let train = floor_share(total, train_ratio);
    let validation = floor_share(total, validation_ratio).min(total - train);
    let remainder = total - train - validation;
    if test_ratio == 0.0 {
        SplitCounts {
            train: train + remainder,
            validation,
            test: 0,
        }
    } else {
        SplitCounts {
            train,
            validation,
            test: remainder,
        }
    }
}

fn floor_share(total: usize, ratio: f64) -> usize {
    if !ratio.is_finite() || ratio <= 0.0 {
        return 0;
    }
    ((ratio * total as f64).floor() as usize).min(total)
}
