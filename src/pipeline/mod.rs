//! Training-job pipeline: versioning, preprocessing, backend invocation and
//! recovery for one train event at a time.
//!
//! A [`Pipeline`] is built once at startup from its collaborators and shared by
//! every worker; each call to [`Pipeline::handle`] borrows the worker's own
//! store connection.

pub mod compensation;
mod errors;
mod job;
pub mod labels;
pub mod manifest;
pub mod partition;
pub mod preprocess;
pub(crate) mod retry;
pub mod split;
pub mod versioning;

use std::sync::Arc;

pub use errors::{JobError, PipelineError};
pub use job::JobOutcome;

use crate::app_dirs::{self, AppDirError};
use crate::blob::{BlobStore, FsBlobStore};
use crate::config::{NotifySettings, ResourceSettings, RetrySettings, ServiceConfig};
use crate::domain::{Model, Project, User};
use crate::notify::{LogNotifier, Notifier};
use crate::trainer::{LocalTrainer, TrainingBackend};

/// External services the pipeline talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub blob: Arc<dyn BlobStore>,
    pub trainer: Arc<dyn TrainingBackend>,
    pub notifier: Arc<dyn Notifier>,
}

/// Per-process settings the pipeline needs from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    pub bucket: String,
    pub content_uri_prefix: String,
    pub resource: ResourceSettings,
    pub notify: NotifySettings,
    pub retry: RetrySettings,
}

impl PipelineSettings {
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self {
            bucket: config.blob.bucket.clone(),
            content_uri_prefix: config.blob.content_uri_prefix.clone(),
            resource: config.trainer.resource.clone(),
            notify: config.notify.clone(),
            retry: config.retry.clone(),
        }
    }

    /// Where the backend writes model artifacts.
    pub fn output_path(&self, user_id: &str, model_id: &str) -> String {
        format!(
            "{}{}/{}",
            self.content_uri_prefix,
            self.bucket,
            manifest::model_prefix(user_id, model_id)
        )
    }
}

/// Entities loaded for one run.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub model: Model,
    pub user: User,
    pub project: Project,
}

pub struct Pipeline {
    blob: Arc<dyn BlobStore>,
    trainer: Arc<dyn TrainingBackend>,
    notifier: Arc<dyn Notifier>,
    settings: PipelineSettings,
}

impl Pipeline {
    pub fn new(collaborators: Collaborators, settings: PipelineSettings) -> Self {
        Self {
            blob: collaborators.blob,
            trainer: collaborators.trainer,
            notifier: collaborators.notifier,
            settings,
        }
    }

    /// Build the pipeline with the local blob store, trainer and notifier.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, AppDirError> {
        let blob_root = match &config.blob.root {
            Some(root) => app_dirs::ensure_dir(root.clone())?,
            None => app_dirs::blob_dir()?,
        };
        let collaborators = Collaborators {
            blob: Arc::new(FsBlobStore::new(blob_root)),
            trainer: Arc::new(LocalTrainer::new(&config.trainer)),
            notifier: Arc::new(LogNotifier),
        };
        Ok(Self::new(collaborators, PipelineSettings::from_config(config)))
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }
}
