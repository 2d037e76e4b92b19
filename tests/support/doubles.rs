use std::sync::Mutex;

use emld_trainer::config::TrainerSettings;
use emld_trainer::domain::Metrics;
use emld_trainer::notify::{Notice, Notifier, NotifyError};
use emld_trainer::trainer::{
    JobHandle, JobSummary, LocalTrainer, TrainRequest, TrainerError, TrainingBackend,
};

pub fn fast_trainer_settings() -> TrainerSettings {
    TrainerSettings {
        simulated_duration_ms: 0,
        poll_interval_ms: 1,
        ..TrainerSettings::default()
    }
}

/// Local trainer that remembers every request it was given.
pub struct RecordingTrainer {
    inner: LocalTrainer,
    requests: Mutex<Vec<TrainRequest>>,
}

impl RecordingTrainer {
    pub fn new() -> Self {
        Self {
            inner: LocalTrainer::new(&fast_trainer_settings()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<TrainRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl TrainingBackend for RecordingTrainer {
    fn train(&self, request: &TrainRequest) -> Result<JobHandle, TrainerError> {
        self.requests.lock().unwrap().push(request.clone());
        self.inner.train(request)
    }

    fn poll_for_status(&self, handle: &JobHandle) -> Result<JobSummary, TrainerError> {
        self.inner.poll_for_status(handle)
    }

    fn metrics(&self, training_job_name: &str) -> Result<Metrics, TrainerError> {
        self.inner.metrics(training_job_name)
    }
}

/// Backend whose jobs always end in a failed state.
pub struct FailingTrainer;

impl TrainingBackend for FailingTrainer {
    fn train(&self, _request: &TrainRequest) -> Result<JobHandle, TrainerError> {
        Ok(JobHandle {
            name: "train-job-failing".into(),
        })
    }

    fn poll_for_status(&self, handle: &JobHandle) -> Result<JobSummary, TrainerError> {
        Err(TrainerError::JobFailed {
            name: handle.name.clone(),
            reason: "AlgorithmError: out of memory".into(),
        })
    }

    fn metrics(&self, training_job_name: &str) -> Result<Metrics, TrainerError> {
        Err(TrainerError::UnknownJob(training_job_name.into()))
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn send(&self, notice: &Notice) -> Result<(), NotifyError> {
        self.notices.lock().unwrap().push(notice.clone());
        Ok(())
    }
}

/// Notifier that always fails delivery.
pub struct BrokenNotifier;

impl Notifier for BrokenNotifier {
    fn send(&self, _notice: &Notice) -> Result<(), NotifyError> {
        Err(NotifyError::Delivery("smtp unavailable".into()))
    }
}
