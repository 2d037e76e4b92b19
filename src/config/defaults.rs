use std::time::Duration;

pub(super) const MAX_CONCURRENCY: u32 = 64;
pub(super) const MAX_VISIBILITY_SECS: u64 = 12 * 60 * 60;

pub(super) fn clamp_concurrency(value: u32) -> u32 {
    value.clamp(1, MAX_CONCURRENCY)
}

pub(super) fn clamp_visibility_secs(value: u64) -> u64 {
    value.clamp(1, MAX_VISIBILITY_SECS)
}

pub(super) fn default_queue_name() -> String {
    "emld-train-jobs".to_string()
}

pub(super) fn default_concurrency() -> u32 {
    2
}

pub(super) fn default_visibility_timeout_secs() -> u64 {
    30
}

pub(super) fn default_retry_delay_secs() -> u64 {
    5
}

pub(super) fn default_max_receive_count() -> u32 {
    4
}

pub(super) fn default_idle_poll_ms() -> u64 {
    500
}

pub(super) fn default_bucket() -> String {
    "emld".to_string()
}

pub(super) fn default_content_uri_prefix() -> String {
    "s3://".to_string()
}

pub(super) fn default_simulated_duration_ms() -> u64 {
    2_000
}

pub(super) fn default_poll_interval_ms() -> u64 {
    250
}

pub(super) fn default_instance_type() -> String {
    "ml.p3.2xlarge".to_string()
}

pub(super) fn default_instance_count() -> u32 {
    1
}

pub(super) fn default_volume_size_gb() -> u32 {
    50
}

pub(super) fn default_success_message() -> String {
    "Your model finished training successfully.".to_string()
}

pub(super) fn default_failed_message() -> String {
    "Your model failed to train.".to_string()
}

pub(super) fn default_retry_attempts() -> u32 {
    5
}

pub(super) fn default_retry_backoff_ms() -> u64 {
    100
}

pub(super) fn default_log_level() -> String {
    "info".to_string()
}

pub(super) fn default_max_log_files() -> usize {
    10
}

pub(super) fn min_poll_interval() -> Duration {
    Duration::from_millis(10)
}
