//! User notifications sent when a training run finishes.

use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notification delivery failed: {0}")]
    Delivery(String),
}

/// Everything a notification needs to describe one run's outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub username: String,
    pub email: String,
    pub project_name: String,
    pub model_name: String,
    pub status_message: String,
}

pub trait Notifier: Send + Sync {
    fn send(&self, notice: &Notice) -> Result<(), NotifyError>;
}

/// Notifier that records notices in the service log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send(&self, notice: &Notice) -> Result<(), NotifyError> {
        info!(
            username = %notice.username,
            email = %notice.email,
            project = %notice.project_name,
            model = %notice.model_name,
            "{}",
            notice.status_message
        );
        Ok(())
    }
}
