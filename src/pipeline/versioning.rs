//! Copy-on-train dataset versions.
//!
//! Every training run gets its own copy of the source dataset: a new dataset
//! row numbered after the project's existing versions, re-keyed tags and
//! annotations, and the project's contents associated with the new id.

use std::collections::HashMap;

use rusqlite::Connection;
use thiserror::Error;
use tracing::debug;

use crate::domain::{Annotation, BoundingBox, Dataset, Tag, new_id};
use crate::store::{
    StoreError, annotations, contents, datasets, map_sql_error, tags, write_transaction,
};

#[derive(Debug, Error)]
pub enum VersioningError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Annotation {annotation_id} references tag {tag_id}, which is not part of dataset {dataset_id}")]
    UnmappedTag {
        annotation_id: String,
        tag_id: String,
        dataset_id: String,
    },
}

/// Result of a committed copy.
#[derive(Debug, Clone)]
pub struct DatasetCopy {
    pub dataset: Dataset,
    /// Source tag id to copied tag id.
    pub tag_map: HashMap<String, String>,
    pub annotations_copied: usize,
    pub contents_associated: usize,
}

/// Copy `source` into a new dataset version, optionally locking it.
///
/// Runs in a single transaction; on error nothing is left behind.
pub fn copy_dataset(
    conn: &Connection,
    source: &Dataset,
    lock: bool,
) -> Result<DatasetCopy, VersioningError> {
    let tx = write_transaction(conn)?;
    let user_id = source.user_id.as_str();

    let version = datasets::count_for_project(&tx, user_id, &source.project_id)?;
    let mut dataset = Dataset {
        id: new_id(),
        user_id: source.user_id.clone(),
        project_id: source.project_id.clone(),
        version,
        locked: false,
        split: source.split,
    };
    datasets::insert(&tx, &dataset)?;

    let mut tag_map = HashMap::new();
    for tag in tags::list_for_dataset(&tx, user_id, &source.id)? {
        let copy = Tag {
            id: new_id(),
            dataset_id: dataset.id.clone(),
            ..tag
        };
        tags::insert(&tx, &copy)?;
        tag_map.insert(tag.id, copy.id);
    }

    let mut annotations_copied = 0usize;
    for annotation in annotations::list_for_dataset(&tx, user_id, &source.id)? {
        let copy = remap_annotation(annotation, &dataset.id, &tag_map, &source.id)?;
        annotations::insert(&tx, &copy)?;
        annotations_copied += 1;
    }

    let contents_associated =
        contents::associate_dataset(&tx, user_id, &source.project_id, &dataset.id)?;

    if lock {
        datasets::set_locked(&tx, user_id, &dataset.id, true)?;
        dataset.locked = true;
    }
    tx.commit().map_err(map_sql_error)?;

    debug!(
        source = %source.id,
        dataset = %dataset.id,
        version = dataset.version,
        tags = tag_map.len(),
        annotations = annotations_copied,
        contents = contents_associated,
        "Versioned dataset"
    );
    Ok(DatasetCopy {
        dataset,
        tag_map,
        annotations_copied,
        contents_associated,
    })
}

fn remap_annotation(
    annotation: Annotation,
    dataset_id: &str,
    tag_map: &HashMap<String, String>,
    source_dataset_id: &str,
) -> Result<Annotation, VersioningError> {
    let lookup = |tag_id: &str| {
        tag_map
            .get(tag_id)
            .cloned()
            .ok_or_else(|| VersioningError::UnmappedTag {
                annotation_id: annotation.id.clone(),
                tag_id: tag_id.to_string(),
                dataset_id: source_dataset_id.to_string(),
            })
    };
    let tag_ids = annotation
        .tag_ids
        .iter()
        .map(|tag_id| lookup(tag_id))
        .collect::<Result<Vec<_>, _>>()?;
    let bounding_boxes = annotation
        .metadata
        .bounding_boxes
        .iter()
        .map(|bbox| {
            Ok(BoundingBox {
                tag_id: lookup(&bbox.tag_id)?,
                ..bbox.clone()
            })
        })
        .collect::<Result<Vec<_>, VersioningError>>()?;

    let mut copy = annotation.clone();
    copy.id = new_id();
    copy.dataset_id = dataset_id.to_string();
    copy.tag_ids = tag_ids;
    copy.metadata.bounding_boxes = bounding_boxes;
    Ok(copy)
}
