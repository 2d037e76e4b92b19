//! One train event from claim to TRAINED or ERR.

use rusqlite::Connection;
use serde_json::Value;
use tracing::{error, info, info_span, warn};

use super::compensation::compensate;
use super::errors::{JobError, PipelineError};
use super::labels::LabelIntegerMap;
use super::manifest::Partition;
use super::preprocess;
use super::retry::retry_with_backoff;
use super::versioning::copy_dataset;
use super::{Pipeline, RunContext};
use crate::domain::{Dataset, Metrics, ModelState, TrainEvent};
use crate::notify::Notice;
use crate::store::usage::UsageRecord;
use crate::store::{
    StoreError, datasets, models, now_epoch_seconds, now_rfc3339, projects, usage, users,
};
use crate::trainer::{
    BILLABLE_SECONDS_METRIC, JobSummary, TrainRequest, hyperparameters, objective_metric_name,
    placeholder_test_metrics,
};

const USAGE_TYPE_TRAIN: &str = "TRAIN";
const BILLING_METRIC_SECOND: &str = "SECOND";

/// Result of handling one train event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Trained {
        model_id: String,
        dataset_id: String,
        training_job_name: String,
    },
    /// The run failed and the model was moved to ERR.
    Failed { model_id: String, error: String },
    /// The model was not INITIALIZED; nothing was written.
    Skipped { state: ModelState },
}

impl Pipeline {
    /// Run the training pipeline for `event`.
    ///
    /// Mid-pipeline failures are recorded on the model and reported as
    /// [`JobOutcome::Failed`]. Only failures the queue should redeliver come
    /// back as errors.
    pub fn handle(&self, conn: &Connection, event: &TrainEvent) -> Result<JobOutcome, JobError> {
        let span = info_span!("train", model = %event.model_id, user = %event.user_id);
        let _enter = span.enter();

        let model = models::view(conn, &event.user_id, &event.model_id).map_err(JobError::Lookup)?;
        if model.state != ModelState::Initialized {
            info!(state = model.state.as_str(), "Model is not INITIALIZED, skipping");
            return Ok(JobOutcome::Skipped { state: model.state });
        }
        let user = users::view(conn, &model.user_id).map_err(JobError::Lookup)?;
        let project =
            projects::view(conn, &model.user_id, &model.project_id).map_err(JobError::Lookup)?;
        let source = datasets::view(conn, &model.user_id, &model.dataset_id)
            .map_err(JobError::Lookup)?;

        let claimed = models::mark_training(conn, &model.user_id, &model.id, now_epoch_seconds())
            .map_err(|source| JobError::Claim {
                model_id: model.id.clone(),
                source,
            })?;
        if !claimed {
            info!("Model was claimed by another delivery, skipping");
            return Ok(JobOutcome::Skipped {
                state: ModelState::Training,
            });
        }
        info!(dataset = %source.id, "Model moved to TRAINING");

        let run = RunContext {
            model,
            user,
            project,
        };
        let copy = match copy_dataset(conn, &source, true) {
            Ok(copy) => copy,
            Err(err) => return self.fail(conn, &run, None, err.into()),
        };
        info!(
            versioned = %copy.dataset.id,
            version = copy.dataset.version,
            annotations = copy.annotations_copied,
            contents = copy.contents_associated,
            "Dataset versioned"
        );

        match self.run_versioned(conn, &run, &copy.dataset) {
            Ok(training_job_name) => {
                self.notify(&run, &self.settings.notify.success_message);
                Ok(JobOutcome::Trained {
                    model_id: run.model.id.clone(),
                    dataset_id: copy.dataset.id,
                    training_job_name,
                })
            }
            Err(err) => self.fail(conn, &run, Some(&copy.dataset.id), err),
        }
    }

    fn run_versioned(
        &self,
        conn: &Connection,
        run: &RunContext,
        dataset: &Dataset,
    ) -> Result<String, PipelineError> {
        let algorithm = run.project.annotation_type;
        let labels = LabelIntegerMap::for_dataset(conn, &dataset.user_id, &dataset.id)?;
        let prepared = preprocess::prepare(
            conn,
            self.blob.as_ref(),
            &self.settings,
            run,
            dataset,
            &labels,
            &mut rand::rng(),
        )?;

        let counts = prepared.counts;
        let request = TrainRequest {
            model_id: run.model.id.clone(),
            algorithm,
            num_classes: labels.len(),
            num_training_samples: counts.train,
            num_validation_samples: counts.validation,
            padding_width: prepared.padding_width,
            mini_batch_size: hyperparameters::mini_batch_size_range(
                counts.train,
                counts.validation,
            ),
            train_manifest: prepared
                .location(Partition::Train)
                .unwrap_or_default()
                .to_string(),
            validation_manifest: prepared
                .location(Partition::Validation)
                .unwrap_or_default()
                .to_string(),
            output_path: self.settings.output_path(&run.model.user_id, &run.model.id),
            resource: self.settings.resource.clone(),
            hyperparameters: hyperparameters::build(
                algorithm,
                labels.len(),
                counts.train,
                prepared.padding_width,
            ),
        };

        let handle = self.trainer.train(&request)?;
        info!(job = %handle.name, classes = labels.len(), "Training job started");
        let summary = self.trainer.poll_for_status(&handle)?;
        let mut metrics = self.trainer.metrics(&summary.training_job_name)?;
        metrics.insert(
            "ObjectiveMetricName".into(),
            Value::from(objective_metric_name(algorithm)),
        );
        for name in placeholder_test_metrics(algorithm) {
            metrics.insert(name.into(), Value::from("-"));
        }

        let mapping = labels.to_mapping();
        models::mark_trained(
            conn,
            &models::TrainedUpdate {
                user_id: &run.model.user_id,
                model_id: &run.model.id,
                dataset_id: &dataset.id,
                integer_mapping: &mapping,
                metrics: &metrics,
                training_job_name: &summary.training_job_name,
                ended_at: now_epoch_seconds(),
            },
        )?;
        info!(job = %summary.training_job_name, "Model moved to TRAINED");

        self.record_usage(conn, run, &summary, &metrics);
        Ok(summary.training_job_name)
    }

    fn record_usage(
        &self,
        conn: &Connection,
        run: &RunContext,
        summary: &JobSummary,
        metrics: &Metrics,
    ) {
        let billable_value = metrics
            .get(BILLABLE_SECONDS_METRIC)
            .and_then(Value::as_f64)
            .unwrap_or(summary.billable_seconds as f64);
        let metadata = serde_json::to_value(&self.settings.resource).unwrap_or(Value::Null);
        let record = UsageRecord {
            user_id: run.model.user_id.clone(),
            time: now_rfc3339(),
            usage_type: USAGE_TYPE_TRAIN.into(),
            billing_metric: BILLING_METRIC_SECOND.into(),
            billable_value,
            metadata,
        };
        if let Err(err) = usage::add(conn, &record) {
            error!("Failed to record training usage: {err}");
        }
    }

    fn fail(
        &self,
        conn: &Connection,
        run: &RunContext,
        versioned_dataset: Option<&str>,
        err: PipelineError,
    ) -> Result<JobOutcome, JobError> {
        let message = err.to_string();
        warn!("Training run failed: {message}");
        if let Some(dataset_id) = versioned_dataset {
            let report = compensate(conn, &run.model.user_id, dataset_id);
            if !report.is_clean() {
                warn!(
                    dataset = %dataset_id,
                    failures = report.failures.len(),
                    "Compensation left artifacts behind"
                );
            }
        }

        let retry = &self.settings.retry;
        retry_with_backoff(retry.attempts, retry.backoff(), || {
            models::mark_failed(
                conn,
                &run.model.user_id,
                &run.model.id,
                &message,
                now_epoch_seconds(),
            )
        })
        .map_err(|source: StoreError| {
            error!("Model stays in TRAINING, could not record failure: {source}");
            JobError::StateWrite {
                model_id: run.model.id.clone(),
                attempts: retry.attempts.max(1),
                source,
            }
        })?;

        self.notify(run, &self.settings.notify.failed_message);
        Ok(JobOutcome::Failed {
            model_id: run.model.id.clone(),
            error: message,
        })
    }

    fn notify(&self, run: &RunContext, status_message: &str) {
        let notice = Notice {
            username: run.user.username.clone(),
            email: run.user.email.clone(),
            project_name: run.project.name.clone(),
            model_name: run.model.name.clone(),
            status_message: status_message.to_string(),
        };
        if let Err(err) = self.notifier.send(&notice) {
            warn!("Failed to send notification: {err}");
        }
    }
}
