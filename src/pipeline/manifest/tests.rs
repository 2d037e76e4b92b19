use std::collections::BTreeSet;

use serde_json::{Value, json};

use super::*;
use crate::domain::{AnnotationMetadata, BoundingBox, Content, Dataset, SplitRatios, Tag};
use crate::store::{Store, datasets};

fn seeded_store() -> Store {
    let store = Store::open_in_memory().unwrap();
    let conn = store.conn();
    datasets::insert(
        conn,
        &Dataset {
            id: "d1".into(),
            user_id: "u1".into(),
            project_id: "p1".into(),
            version: 0,
            locked: false,
            split: SplitRatios::default(),
        },
    )
    .unwrap();
    for (id, name) in [("t-cat", "cat"), ("t-dog", "dog"), ("t-owl", "owl")] {
        tags::insert(
            conn,
            &Tag {
                id: id.into(),
                user_id: "u1".into(),
                project_id: "p1".into(),
                dataset_id: "d1".into(),
                name: name.into(),
                properties: json!({}),
            },
        )
        .unwrap();
    }
    contents::insert(
        conn,
        &Content {
            id: "c1".into(),
            user_id: "u1".into(),
            stored_dir: "emld/u1/uploads".into(),
            stored_path: "img1.jpg".into(),
            width: 640,
            height: 480,
        },
        "p1",
    )
    .unwrap();
    store
}

fn annotation(id: &str, tag_ids: &[&str], boxes: Vec<BoundingBox>) -> Annotation {
    Annotation {
        id: id.into(),
        user_id: "u1".into(),
        project_id: "p1".into(),
        dataset_id: "d1".into(),
        content_id: "c1".into(),
        tag_ids: tag_ids.iter().map(|id| id.to_string()).collect(),
        metadata: AnnotationMetadata {
            bounding_boxes: boxes,
        },
        split: Split::Undefined,
    }
}

fn bbox(tag_id: &str, xmin: i64, ymin: i64, xmax: i64, ymax: i64) -> BoundingBox {
    BoundingBox {
        tag_id: tag_id.into(),
        xmin,
        ymin,
        xmax,
        ymax,
    }
}

fn lines(bytes: &[u8]) -> Vec<Value> {
    std::str::from_utf8(bytes)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn class_labels_marks_present_indices() {
    let present: BTreeSet<usize> = [1, 3].into_iter().collect();
    assert_eq!(class_labels(5, &present), "[0,1,0,1,0]");
    assert_eq!(class_labels(3, &BTreeSet::new()), "[0,0,0]");
    assert_eq!(class_labels(0, &BTreeSet::new()), "[]");
}

#[test]
fn manifest_keys_follow_model_layout() {
    assert_eq!(
        manifest_key("u1", "m1", Partition::Validation),
        "u1/models/m1/validation.manifest"
    );
    assert_eq!(Partition::Test.split(), Split::Test);
}

#[test]
fn classification_records_are_multi_hot() {
    let store = seeded_store();
    let labels = LabelIntegerMap::from_names(["cat", "dog", "owl"]);
    let mut encoder = ManifestEncoder::new(
        store.conn(),
        "u1",
        AnnotationType::Classification,
        &labels,
        "s3://",
    );
    let bytes = encoder
        .encode(&[
            annotation("a1", &["t-owl", "t-cat"], vec![]),
            annotation("a2", &[], vec![]),
            annotation("a3", &["t-cat"], vec![]),
        ])
        .unwrap();
    let records = lines(&bytes);
    assert_eq!(records.len(), 3);
    assert_eq!(
        records[0],
        json!({"source-ref": "s3://emld/u1/uploads/img1.jpg", "class": "[1,0,1]"})
    );
    assert_eq!(records[1]["class"], "[0,0,0]");
    assert_eq!(records[2]["class"], "[1,0,0]");
    assert_eq!(encoder.cached_tags(), 2);
    assert!(bytes.ends_with(b"\n"));
}

#[test]
fn detection_records_list_boxes_per_tag() {
    let store = seeded_store();
    let labels = LabelIntegerMap::from_names(["cat", "dog", "owl"]);
    let mut encoder = ManifestEncoder::new(
        store.conn(),
        "u1",
        AnnotationType::BoundingBox,
        &labels,
        "s3://",
    );
    let boxes = vec![
        bbox("t-cat", 98, 345, 420, 462),
        bbox("t-dog", 0, 0, 10, 20),
        bbox("t-cat", 5, 5, 6, 7),
    ];
    let bytes = encoder
        .encode(&[annotation("a1", &["t-dog", "t-cat"], boxes)])
        .unwrap();
    let records = lines(&bytes);
    assert_eq!(
        records[0],
        json!({
            "source-ref": "s3://emld/u1/uploads/img1.jpg",
            "bounding-box": {
                "image_size": [{"width": 640, "height": 480, "depth": 3}],
                "annotations": [
                    {"class_id": 1, "left": 0, "top": 0, "width": 10, "height": 20},
                    {"class_id": 0, "left": 98, "top": 345, "width": 322, "height": 117},
                    {"class_id": 0, "left": 5, "top": 5, "width": 1, "height": 2}
                ],
                "bounding-box-metadata": {
                    "class_map": {"0": "cat", "1": "dog", "2": "owl"},
                    "type": "ObjectDetection"
                }
            }
        })
    );
}

#[test]
fn null_detection_annotation_has_no_boxes() {
    let store = seeded_store();
    let labels = LabelIntegerMap::from_names(["cat"]);
    let mut encoder =
        ManifestEncoder::new(store.conn(), "u1", AnnotationType::BoundingBox, &labels, "s3://");
    let records = lines(&encoder.encode(&[annotation("a1", &[], vec![])]).unwrap());
    assert_eq!(records[0]["bounding-box"]["annotations"], json!([]));
}

#[test]
fn empty_partition_encodes_to_nothing() {
    let store = seeded_store();
    let labels = LabelIntegerMap::from_names(["cat"]);
    let mut encoder = ManifestEncoder::new(
        store.conn(),
        "u1",
        AnnotationType::Classification,
        &labels,
        "s3://",
    );
    assert!(encoder.encode(&[]).unwrap().is_empty());
}

#[test]
fn tags_outside_label_map_fail() {
    let store = seeded_store();
    let labels = LabelIntegerMap::from_names(["cat"]);
    let mut encoder = ManifestEncoder::new(
        store.conn(),
        "u1",
        AnnotationType::Classification,
        &labels,
        "s3://",
    );
    let err = encoder
        .encode(&[annotation("a1", &["t-dog"], vec![])])
        .unwrap_err();
    assert!(matches!(err, ManifestError::UnknownLabel { ref name, .. } if name == "dog"));

    let err = encoder
        .encode(&[annotation("a2", &["t-missing"], vec![])])
        .unwrap_err();
    assert!(matches!(
        err,
        ManifestError::Store(StoreError::NotFound { entity: "tag", .. })
    ));
}
