//! Shuffle annotations and slice them into train/validation/test groups.

use rand::Rng;
use rand::seq::SliceRandom;
use thiserror::Error;

use super::split::SplitCounts;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Split counts cover {planned} records but {actual} were supplied")]
pub struct PartitionError {
    pub planned: usize,
    pub actual: usize,
}

/// Three contiguous, disjoint slices of one shuffled input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partitions<T> {
    pub train: Vec<T>,
    pub validation: Vec<T>,
    pub test: Vec<T>,
}

impl<T> Partitions<T> {
    pub fn len(&self) -> usize {
        self.train.len() + self.validation.len() + self.test.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Shuffle with a fresh thread-local RNG, then partition.
pub fn shuffle_and_partition<T>(
    items: Vec<T>,
    counts: SplitCounts,
) -> Result<Partitions<T>, PartitionError> {
    shuffle_and_partition_with(items, counts, &mut rand::rng())
}

/// Shuffle with `rng`, then slice into groups of exactly the planned sizes.
pub fn shuffle_and_partition_with<T, R: Rng + ?Sized>(
    mut items: Vec<T>,
    counts: SplitCounts,
    rng: &mut R,
) -> Result<Partitions<T>, PartitionError> {
    if counts.total() != items.len() {
        return Err(PartitionError {
            planned: counts.total(),
            actual: items.len(),
        });
    }
    items.shuffle(rng);
    let test = items.split_off(counts.train + counts.validation);
    let validation = items.split_off(counts.train);
    Ok(Partitions {
        train: items,
        validation,
        test,
    })
}
