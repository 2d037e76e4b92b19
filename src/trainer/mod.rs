//! Narrow interface to the external training backend.
//!
//! The pipeline starts a job, blocks on [`TrainingBackend::poll_for_status`]
//! until it reaches a terminal state, then fetches the final metrics.

pub mod hyperparameters;
mod local;

use std::collections::BTreeMap;

use thiserror::Error;

pub use local::LocalTrainer;

use crate::config::ResourceSettings;
use crate::domain::{AnnotationType, Metrics};

/// Metric key the backend reports billable seconds under.
pub const BILLABLE_SECONDS_METRIC: &str = "BillableTimeInSeconds";

#[derive(Debug, Error)]
pub enum TrainerError {
    #[error("Training job {name} failed: {reason}")]
    JobFailed { name: String, reason: String },
    #[error("Training job {0} was stopped")]
    JobStopped(String),
    #[error("Unknown training job {0}")]
    UnknownJob(String),
    #[error("Training backend rejected the request: {0}")]
    Rejected(String),
}

/// Everything the backend needs to start one tuning job.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainRequest {
    pub model_id: String,
    pub algorithm: AnnotationType,
    pub num_classes: usize,
    pub num_training_samples: usize,
    pub num_validation_samples: usize,
    /// Detection label width; `None` for classification.
    pub padding_width: Option<usize>,
    /// Inclusive `mini_batch_size` search range.
    pub mini_batch_size: (usize, usize),
    pub train_manifest: String,
    pub validation_manifest: String,
    pub output_path: String,
    pub resource: ResourceSettings,
    pub hyperparameters: BTreeMap<String, String>,
}

impl TrainRequest {
    /// Manifest record attributes the algorithm reads.
    pub fn attribute_names(&self) -> [&'static str; 2] {
        match self.algorithm {
            AnnotationType::Classification => ["source-ref", "class"],
            AnnotationType::BoundingBox => ["source-ref", "bounding-box"],
        }
    }
}

/// Handle for a started job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    pub name: String,
}

/// Terminal summary of the best training job in a tuning run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSummary {
    pub training_job_name: String,
    pub billable_seconds: u64,
}

pub trait TrainingBackend: Send + Sync {
    fn train(&self, request: &TrainRequest) -> Result<JobHandle, TrainerError>;

    /// Block until the job is terminal. Failed or stopped jobs are errors.
    fn poll_for_status(&self, handle: &JobHandle) -> Result<JobSummary, TrainerError>;

    fn metrics(&self, training_job_name: &str) -> Result<Metrics, TrainerError>;
}

/// Metric the tuning job maximizes for an annotation type.
pub fn objective_metric_name(algorithm: AnnotationType) -> &'static str {
    match algorithm {
        AnnotationType::Classification => "validation:accuracy",
        AnnotationType::BoundingBox => "validation:mAP",
    }
}

/// Placeholder test metrics reported until a test pass exists.
pub fn placeholder_test_metrics(algorithm: AnnotationType) -> [&'static str; 3] {
    match algorithm {
        AnnotationType::Classification => ["test:accuracy", "test:precision", "test:recall"],
        AnnotationType::BoundingBox => ["test:mAP", "test:precision", "test:recall"],
    }
}
