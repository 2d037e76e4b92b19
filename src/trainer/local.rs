use std::collections::HashMap;
use std::sync::Mutex;
use std::thread::sleep;
use std::time::{Duration, Instant};

use serde_json::json;
use tracing::{debug, info};

use super::{
    BILLABLE_SECONDS_METRIC, JobHandle, JobSummary, TrainRequest, TrainerError, TrainingBackend,
};
use crate::config::TrainerSettings;
use crate::domain::{AnnotationType, Metrics, new_id};

struct LocalJob {
    started: Instant,
    algorithm: AnnotationType,
    instance_count: u32,
    num_classes: usize,
}

/// In-process backend that simulates a tuning job of fixed duration.
pub struct LocalTrainer {
    duration: Duration,
    poll_interval: Duration,
    jobs: Mutex<HashMap<String, LocalJob>>,
}

impl LocalTrainer {
    pub fn new(settings: &TrainerSettings) -> Self {
        Self {
            duration: settings.simulated_duration(),
            poll_interval: settings.poll_interval(),
            jobs: Mutex::new(HashMap::new()),
        }
    }

    fn with_job<T>(
        &self,
        name: &str,
        f: impl FnOnce(&LocalJob) -> T,
    ) -> Result<T, TrainerError> {
        let jobs = self.jobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        jobs.get(name)
            .map(f)
            .ok_or_else(|| TrainerError::UnknownJob(name.to_string()))
    }

    /// Remove a finished job; metrics are the last thing read from it.
    fn take_job(&self, name: &str) -> Result<LocalJob, TrainerError> {
        let mut jobs = self.jobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        jobs.remove(name).ok_or_else(|| TrainerError::UnknownJob(name.to_string()))
    }
}

impl TrainingBackend for LocalTrainer {
    fn train(&self, request: &TrainRequest) -> Result<JobHandle, TrainerError> {
        if request.num_classes == 0 {
            return Err(TrainerError::Rejected("num_classes must be at least 1".into()));
        }
        if request.num_training_samples == 0 || request.num_validation_samples == 0 {
            return Err(TrainerError::Rejected(
                "training and validation samples are required".into(),
            ));
        }
        let mut short = new_id();
        short.truncate(17);
        let name = format!("train-job-{short}");
        info!(
            job = %name,
            model = %request.model_id,
            algorithm = %request.algorithm,
            classes = request.num_classes,
            train = request.num_training_samples,
            validation = request.num_validation_samples,
            "Created local tuning job"
        );
        let mut jobs = self.jobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        jobs.insert(
            name.clone(),
            LocalJob {
                started: Instant::now(),
                algorithm: request.algorithm,
                instance_count: request.resource.instance_count.max(1),
                num_classes: request.num_classes,
            },
        );
        Ok(JobHandle { name })
    }

    fn poll_for_status(&self, handle: &JobHandle) -> Result<JobSummary, TrainerError> {
        let started = self.with_job(&handle.name, |job| job.started)?;
        while started.elapsed() < self.duration {
            debug!(job = %handle.name, "Tuning job in progress");
            sleep(self.poll_interval.min(self.duration.saturating_sub(started.elapsed())));
        }
        let billable = self.duration.as_secs_f64().ceil().max(1.0) as u64;
        Ok(JobSummary {
            training_job_name: format!("{}-001", handle.name),
            billable_seconds: billable,
        })
    }

    fn metrics(&self, training_job_name: &str) -> Result<Metrics, TrainerError> {
        let tuning_name = training_job_name
            .strip_suffix("-001")
            .unwrap_or(training_job_name);
        let job = self.take_job(tuning_name)?;
        let billable = self.duration.as_secs_f64().ceil().max(1.0) as u64;
        let quality = 1.0 - 0.5 / (job.num_classes as f64 + 1.0);
        let mut metrics = Metrics::new();
        match job.algorithm {
            AnnotationType::Classification => {
                metrics.insert("train:accuracy".into(), json!(quality));
                metrics.insert("validation:accuracy".into(), json!(quality * 0.95));
            }
            AnnotationType::BoundingBox => {
                metrics.insert("train:progress".into(), json!(100.0));
                metrics.insert("validation:mAP".into(), json!(quality * 0.8));
            }
        }
        metrics.insert(
            BILLABLE_SECONDS_METRIC.into(),
            json!(billable * u64::from(job.instance_count)),
        );
        Ok(metrics)
    }
}
