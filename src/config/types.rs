use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::defaults::*;
use crate::app_dirs::{self, AppDirError};

/// Everything the training service reads from `config.toml`.
///
/// Config sections: `queue`, `store`, `blob`, `trainer`, `notify`, `retry`, `logging`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub queue: QueueSettings,
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub blob: BlobSettings,
    #[serde(default)]
    pub trainer: TrainerSettings,
    #[serde(default)]
    pub notify: NotifySettings,
    #[serde(default)]
    pub retry: RetrySettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl ServiceConfig {
    /// Clamp values into the ranges the service can run with.
    pub fn normalized(mut self) -> Self {
        self.queue.concurrency = clamp_concurrency(self.queue.concurrency);
        self.queue.visibility_timeout_secs =
            clamp_visibility_secs(self.queue.visibility_timeout_secs);
        self.queue.retry_delay_secs = self.queue.retry_delay_secs.min(MAX_VISIBILITY_SECS);
        self.queue.max_receive_count = self.queue.max_receive_count.max(1);
        self.queue.idle_poll_ms = self.queue.idle_poll_ms.max(1);
        self.retry.attempts = self.retry.attempts.max(1);
        self.trainer.resource.instance_count = self.trainer.resource.instance_count.max(1);
        self.logging.max_files = self.logging.max_files.max(1);
        self
    }
}

/// Training queue consumer settings.
///
/// Config keys: `name`, `concurrency`, `visibility_timeout_secs`, `retry_delay_secs`,
/// `max_receive_count`, `idle_poll_ms`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSettings {
    #[serde(default = "default_queue_name")]
    pub name: String,
    /// Number of worker threads pulling from the queue.
    #[serde(default = "default_concurrency")]
    pub concurrency: u32,
    #[serde(default = "default_visibility_timeout_secs")]
    pub visibility_timeout_secs: u64,
    /// Delay before a failed message becomes visible again.
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
    /// Receives after which a message is dead-lettered.
    #[serde(default = "default_max_receive_count")]
    pub max_receive_count: u32,
    #[serde(default = "default_idle_poll_ms")]
    pub idle_poll_ms: u64,
}

impl QueueSettings {
    pub fn visibility_timeout(&self) -> Duration {
        Duration::from_secs(self.visibility_timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    pub fn idle_poll(&self) -> Duration {
        Duration::from_millis(self.idle_poll_ms)
    }
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            name: default_queue_name(),
            concurrency: default_concurrency(),
            visibility_timeout_secs: default_visibility_timeout_secs(),
            retry_delay_secs: default_retry_delay_secs(),
            max_receive_count: default_max_receive_count(),
            idle_poll_ms: default_idle_poll_ms(),
        }
    }
}

/// Document store location. Defaults to `emld.db` in the app directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSettings {
    #[serde(default)]
    pub db_path: Option<PathBuf>,
}

impl StoreSettings {
    /// Configured database path, or the default inside the app directory.
    pub fn resolved_db_path(&self) -> Result<PathBuf, AppDirError> {
        match &self.db_path {
            Some(path) => Ok(path.clone()),
            None => app_dirs::default_db_path(),
        }
    }
}

/// Object storage settings.
///
/// Config keys: `root`, `bucket`, `content_uri_prefix`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobSettings {
    /// Local directory that holds buckets; defaults to `blobs` in the app directory.
    #[serde(default)]
    pub root: Option<PathBuf>,
    #[serde(default = "default_bucket")]
    pub bucket: String,
    /// Scheme prefix for content and model locations handed to the trainer.
    #[serde(default = "default_content_uri_prefix")]
    pub content_uri_prefix: String,
}

impl Default for BlobSettings {
    fn default() -> Self {
        Self {
            root: None,
            bucket: default_bucket(),
            content_uri_prefix: default_content_uri_prefix(),
        }
    }
}

/// Training backend settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainerSettings {
    /// How long the local backend pretends a job runs.
    #[serde(default = "default_simulated_duration_ms")]
    pub simulated_duration_ms: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default)]
    pub resource: ResourceSettings,
}

impl TrainerSettings {
    pub fn simulated_duration(&self) -> Duration {
        Duration::from_millis(self.simulated_duration_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms).max(min_poll_interval())
    }
}

impl Default for TrainerSettings {
    fn default() -> Self {
        Self {
            simulated_duration_ms: default_simulated_duration_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            resource: ResourceSettings::default(),
        }
    }
}

/// Compute requested for each training job; also recorded on usage rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSettings {
    #[serde(default = "default_instance_type")]
    pub instance_type: String,
    #[serde(default = "default_instance_count")]
    pub instance_count: u32,
    #[serde(default = "default_volume_size_gb")]
    pub volume_size_gb: u32,
}

impl Default for ResourceSettings {
    fn default() -> Self {
        Self {
            instance_type: default_instance_type(),
            instance_count: default_instance_count(),
            volume_size_gb: default_volume_size_gb(),
        }
    }
}

/// Status lines included in run notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifySettings {
    #[serde(default = "default_success_message")]
    pub success_message: String,
    #[serde(default = "default_failed_message")]
    pub failed_message: String,
}

impl Default for NotifySettings {
    fn default() -> Self {
        Self {
            success_message: default_success_message(),
            failed_message: default_failed_message(),
        }
    }
}

/// Retry policy for recording a failed run on the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrySettings {
    #[serde(default = "default_retry_attempts")]
    pub attempts: u32,
    /// Initial delay; doubled after every failed attempt.
    #[serde(default = "default_retry_backoff_ms")]
    pub backoff_ms: u64,
}

impl RetrySettings {
    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            attempts: default_retry_attempts(),
            backoff_ms: default_retry_backoff_ms(),
        }
    }
}

/// Config keys: `level`, `dir`, `max_files`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Default filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub dir: Option<PathBuf>,
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            dir: None,
            max_files: default_max_log_files(),
        }
    }
}
