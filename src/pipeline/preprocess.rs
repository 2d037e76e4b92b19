//! Split, shuffle, encode and upload the annotations of a versioned dataset.

use std::collections::BTreeMap;

use rand::Rng;
use rusqlite::Connection;
use tracing::debug;

use super::{PipelineSettings, RunContext};
use super::errors::PipelineError;
use super::labels::LabelIntegerMap;
use super::manifest::{ManifestEncoder, Partition, manifest_key};
use super::partition::shuffle_and_partition_with;
use super::split::{SplitCounts, split_counts};
use crate::blob::BlobStore;
use crate::domain::Dataset;
use crate::store::annotations;

/// Label width the detection algorithm uses when no image needs more.
pub const DEFAULT_LABEL_WIDTH: usize = 350;

/// Detection label padding for the busiest image in a dataset.
pub fn padding_width(max_boxes_per_image: usize) -> usize {
    DEFAULT_LABEL_WIDTH.max(max_boxes_per_image.saturating_mul(5).saturating_add(2))
}

/// Output of the preprocessing stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prepared {
    pub counts: SplitCounts,
    /// Uploaded manifest locations; empty partitions are absent.
    pub manifests: BTreeMap<&'static str, String>,
    pub padding_width: Option<usize>,
}

impl Prepared {
    pub fn location(&self, partition: Partition) -> Option<&str> {
        self.manifests.get(partition.manifest_name()).map(String::as_str)
    }
}

pub(super) fn prepare<R: Rng + ?Sized>(
    conn: &Connection,
    blob: &dyn BlobStore,
    settings: &PipelineSettings,
    run: &RunContext,
    dataset: &Dataset,
    labels: &LabelIntegerMap,
    rng: &mut R,
) -> Result<Prepared, PipelineError> {
    let project = &run.project;
    dataset.split.validate()?;
    let user_id = dataset.user_id.as_str();

    let records = annotations::list_for_dataset(conn, user_id, &dataset.id)?;
    let counts = split_counts(
        records.len(),
        dataset.split.train,
        dataset.split.validation,
        dataset.split.test,
    );
    debug!(
        dataset = %dataset.id,
        train = counts.train,
        validation = counts.validation,
        test = counts.test,
        "Computed split counts"
    );
    if !counts.is_trainable() {
        return Err(PipelineError::InsufficientContent {
            train: counts.train,
            validation: counts.validation,
        });
    }

    let parts = shuffle_and_partition_with(records, counts, rng)?;

    let mut encoder = ManifestEncoder::new(
        conn,
        user_id,
        project.annotation_type,
        labels,
        &settings.content_uri_prefix,
    );
    let group_of = |partition: Partition| match partition {
        Partition::Train => &parts.train,
        Partition::Validation => &parts.validation,
        Partition::Test => &parts.test,
    };
    let mut manifests = BTreeMap::new();
    for partition in Partition::ALL {
        let bytes = encoder.encode(group_of(partition))?;
        if bytes.is_empty() {
            continue;
        }
        let key = manifest_key(user_id, &run.model.id, partition);
        let location = blob.upload(&mut bytes.as_slice(), &settings.bucket, &key)?;
        debug!(location = %location, bytes = bytes.len(), "Uploaded manifest");
        manifests.insert(partition.manifest_name(), location);
    }

    let assignments: Vec<(&str, _)> = Partition::ALL
        .into_iter()
        .flat_map(|partition| {
            group_of(partition)
                .iter()
                .map(move |annotation| (annotation.id.as_str(), partition.split()))
        })
        .collect();
    let updated = annotations::assign_splits(conn, user_id, &dataset.id, &assignments)?;
    debug!(dataset = %dataset.id, updated, "Assigned annotation splits");

    let padding_width = if project.annotation_type.is_object_detection() {
        let max_boxes = annotations::max_bounding_boxes(conn, user_id, &dataset.id)?;
        Some(padding_width(max_boxes))
    } else {
        None
    };

    Ok(Prepared {
        counts,
        manifests,
        padding_width,
    })
}
