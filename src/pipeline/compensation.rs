//! Best-effort removal of a versioned dataset after a failed run.

use rusqlite::Connection;
use tracing::{error, info};

use crate::store::{annotations, datasets, tags};

/// What compensation managed to remove.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompensationReport {
    pub dataset_removed: bool,
    pub annotations_removed: usize,
    pub tags_removed: usize,
    pub failures: Vec<String>,
}

impl CompensationReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Delete the dataset row, its annotations and its tags.
///
/// Each step runs regardless of the others; failures are logged and reported,
/// never returned.
pub fn compensate(conn: &Connection, user_id: &str, dataset_id: &str) -> CompensationReport {
    let mut report = CompensationReport::default();

    match datasets::delete(conn, user_id, dataset_id) {
        Ok(removed) => report.dataset_removed = removed,
        Err(err) => {
            error!(dataset = %dataset_id, "Failed to delete versioned dataset: {err}");
            report.failures.push(format!("dataset: {err}"));
        }
    }
    match annotations::delete_for_dataset(conn, user_id, dataset_id) {
        Ok(count) => report.annotations_removed = count,
        Err(err) => {
            error!(dataset = %dataset_id, "Failed to delete versioned annotations: {err}");
            report.failures.push(format!("annotations: {err}"));
        }
    }
    match tags::delete_for_dataset(conn, user_id, dataset_id) {
        Ok(count) => report.tags_removed = count,
        Err(err) => {
            error!(dataset = %dataset_id, "Failed to delete versioned tags: {err}");
            report.failures.push(format!("tags: {err}"));
        }
    }

    info!(
        dataset = %dataset_id,
        dataset_removed = report.dataset_removed,
        annotations = report.annotations_removed,
        tags = report.tags_removed,
        "Compensated failed run"
    );
    report
}
