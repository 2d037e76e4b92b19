use thiserror::Error;

use super::manifest::ManifestError;
use super::partition::PartitionError;
use super::versioning::VersioningError;
use crate::blob::BlobError;
use crate::domain::SplitError;
use crate::store::StoreError;
use crate::trainer::TrainerError;

/// Failures after the model entered TRAINING; recorded as the model's last error.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Dataset versioning failed: {0}")]
    Versioning(#[from] VersioningError),
    #[error("Invalid dataset split: {0}")]
    InvalidSplit(#[from] SplitError),
    #[error(
        "No content to process; training and validation annotations should be > 0 (train={train}, validation={validation})"
    )]
    InsufficientContent { train: usize, validation: usize },
    #[error(transparent)]
    Partition(#[from] PartitionError),
    #[error("Manifest generation failed: {0}")]
    Manifest(#[from] ManifestError),
    #[error("Manifest upload failed: {0}")]
    Blob(#[from] BlobError),
    #[error(transparent)]
    Trainer(#[from] TrainerError),
}

/// Failures escalated to the queue so the message is delivered again.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("Failed to load train event resources: {0}")]
    Lookup(StoreError),
    #[error("Failed to move model {model_id} to TRAINING: {source}")]
    Claim { model_id: String, source: StoreError },
    #[error("Failed to record failure on model {model_id} after {attempts} attempt(s): {source}")]
    StateWrite {
        model_id: String,
        attempts: u32,
        source: StoreError,
    },
}
