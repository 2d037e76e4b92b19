//! Newline-delimited training manifests.
//!
//! Classification records carry a multi-hot class string; object-detection
//! records carry the image size, one entry per box and the class map.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io::Write;

use rusqlite::Connection;
use serde::Serialize;
use thiserror::Error;

use super::labels::LabelIntegerMap;
use crate::domain::{Annotation, AnnotationType, Split};
use crate::store::{StoreError, contents, tags};

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Tag {tag_id} on annotation {annotation_id} has name {name:?}, which is not in the label map")]
    UnknownLabel {
        annotation_id: String,
        tag_id: String,
        name: String,
    },
    #[error("Failed to encode manifest record: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("Failed to write manifest record: {0}")]
    Write(#[from] std::io::Error),
}

/// One of the three manifest files produced per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Partition {
    Train,
    Validation,
    Test,
}

impl Partition {
    pub const ALL: [Partition; 3] = [Partition::Train, Partition::Validation, Partition::Test];

    pub fn manifest_name(self) -> &'static str {
        match self {
            Partition::Train => "train.manifest",
            Partition::Validation => "validation.manifest",
            Partition::Test => "test.manifest",
        }
    }

    pub fn split(self) -> Split {
        match self {
            Partition::Train => Split::Train,
            Partition::Validation => Split::Validation,
            Partition::Test => Split::Test,
        }
    }
}

/// Blob key of a model's manifest: `{user}/models/{model}/{name}`.
pub fn manifest_key(user_id: &str, model_id: &str, partition: Partition) -> String {
    format!("{}/{}", model_prefix(user_id, model_id), partition.manifest_name())
}

/// Blob key prefix shared by everything a model run writes.
pub fn model_prefix(user_id: &str, model_id: &str) -> String {
    format!("{user_id}/models/{model_id}")
}

/// Multi-hot class string such as `[0,1,0,1,0]`.
pub fn class_labels(len: usize, present: &BTreeSet<usize>) -> String {
    let mut out = String::with_capacity(len * 2 + 2);
    out.push('[');
    for idx in 0..len {
        if idx > 0 {
            out.push(',');
        }
        out.push(if present.contains(&idx) { '1' } else { '0' });
    }
    out.push(']');
    out
}

#[derive(Serialize)]
struct ClassificationRecord<'a> {
    #[serde(rename = "source-ref")]
    source_ref: &'a str,
    class: String,
}

#[derive(Serialize)]
struct DetectionRecord<'a> {
    #[serde(rename = "source-ref")]
    source_ref: &'a str,
    #[serde(rename = "bounding-box")]
    bounding_box: BoundingBoxAttribute<'a>,
}

#[derive(Serialize)]
struct BoundingBoxAttribute<'a> {
    image_size: [ImageSize; 1],
    annotations: Vec<BoxEntry>,
    #[serde(rename = "bounding-box-metadata")]
    metadata: BoxMetadata<'a>,
}

#[derive(Serialize)]
struct ImageSize {
    width: u32,
    height: u32,
    depth: u32,
}

#[derive(Debug, Serialize, PartialEq)]
struct BoxEntry {
    class_id: usize,
    left: i64,
    top: i64,
    width: i64,
    height: i64,
}

#[derive(Serialize)]
struct BoxMetadata<'a> {
    class_map: &'a BTreeMap<usize, String>,
    #[serde(rename = "type")]
    kind: &'static str,
}

/// Encodes annotations of one versioned dataset into manifest bytes.
///
/// Tag names are cached for the lifetime of the encoder, so one encoder should
/// be reused for all partitions of a run.
pub struct ManifestEncoder<'a> {
    conn: &'a Connection,
    user_id: &'a str,
    annotation_type: AnnotationType,
    labels: &'a LabelIntegerMap,
    class_map: BTreeMap<usize, String>,
    uri_prefix: &'a str,
    tag_names: HashMap<String, String>,
}

impl<'a> ManifestEncoder<'a> {
    pub fn new(
        conn: &'a Connection,
        user_id: &'a str,
        annotation_type: AnnotationType,
        labels: &'a LabelIntegerMap,
        uri_prefix: &'a str,
    ) -> Self {
        Self {
            conn,
            user_id,
            annotation_type,
            labels,
            class_map: labels.class_map(),
            uri_prefix,
            tag_names: HashMap::new(),
        }
    }

    /// Number of distinct tags looked up so far.
    pub fn cached_tags(&self) -> usize {
        self.tag_names.len()
    }

    /// Encode one partition; an empty slice yields an empty buffer.
    pub fn encode(&mut self, annotations: &[Annotation]) -> Result<Vec<u8>, ManifestError> {
        let mut out = Vec::new();
        for annotation in annotations {
            self.write_record(&mut out, annotation)?;
        }
        Ok(out)
    }

    fn write_record(
        &mut self,
        out: &mut Vec<u8>,
        annotation: &Annotation,
    ) -> Result<(), ManifestError> {
        let content = contents::view(self.conn, self.user_id, &annotation.content_id)?;
        let source_ref = content.source_uri(self.uri_prefix);

        let mut present = BTreeSet::new();
        let mut boxes = Vec::new();
        for tag_id in &annotation.tag_ids {
            let class_id = self.class_index(annotation, tag_id)?;
            present.insert(class_id);
            for bbox in annotation
                .metadata
                .bounding_boxes
                .iter()
                .filter(|bbox| &bbox.tag_id == tag_id)
            {
                let (left, top, width, height) = bbox.to_left_top_width_height();
                boxes.push(BoxEntry {
                    class_id,
                    left,
                    top,
                    width,
                    height,
                });
            }
        }

        match self.annotation_type {
            AnnotationType::Classification => {
                let record = ClassificationRecord {
                    source_ref: &source_ref,
                    class: class_labels(self.labels.len(), &present),
                };
                serde_json::to_writer(&mut *out, &record)?;
            }
            AnnotationType::BoundingBox => {
                let record = DetectionRecord {
                    source_ref: &source_ref,
                    bounding_box: BoundingBoxAttribute {
                        image_size: [ImageSize {
                            width: content.width,
                            height: content.height,
                            depth: 3,
                        }],
                        annotations: boxes,
                        metadata: BoxMetadata {
                            class_map: &self.class_map,
                            kind: "ObjectDetection",
                        },
                    },
                };
                serde_json::to_writer(&mut *out, &record)?;
            }
        }
        out.write_all(b"\n")?;
        Ok(())
    }

    fn class_index(
        &mut self,
        annotation: &Annotation,
        tag_id: &str,
    ) -> Result<usize, ManifestError> {
        if !self.tag_names.contains_key(tag_id) {
            let tag = tags::view(self.conn, self.user_id, tag_id)?;
            self.tag_names.insert(tag_id.to_string(), tag.name);
        }
        let name = self
            .tag_names
            .get(tag_id)
            .map(String::as_str)
            .unwrap_or_default();
        self.labels
            .index_of(name)
            .ok_or_else(|| ManifestError::UnknownLabel {
                annotation_id: annotation.id.clone(),
                tag_id: tag_id.to_string(),
                name: name.to_string(),
            })
    }
}

#[cfg(test)]
mod tests;
