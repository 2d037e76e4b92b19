use std::path::Path;
use std::sync::Arc;

use emld_trainer::blob::FsBlobStore;
use emld_trainer::config::ServiceConfig;
use emld_trainer::domain::{
    Annotation, AnnotationMetadata, AnnotationType, BoundingBox, Content, Dataset, Model,
    ModelState, Project, Split, SplitRatios, Tag, User,
};
use emld_trainer::notify::Notifier;
use emld_trainer::pipeline::{Collaborators, Pipeline, PipelineSettings};
use emld_trainer::store::{annotations, contents, datasets, models, projects, tags, users};
use emld_trainer::trainer::TrainingBackend;
use rusqlite::Connection;
use serde_json::json;

pub const USER: &str = "u1";
pub const PROJECT: &str = "p1";
pub const SOURCE_DATASET: &str = "d1";
pub const MODEL: &str = "m1";

/// Tag ids and names seeded on the source dataset.
pub const TAGS: [(&str, &str); 3] = [("t-cat", "cat"), ("t-dog", "dog"), ("t-bird", "bird")];

pub struct SeedOptions {
    pub annotation_type: AnnotationType,
    pub annotations: usize,
    pub split: SplitRatios,
    /// Bounding boxes drawn on the first annotation's image.
    pub boxes_on_first: usize,
}

impl Default for SeedOptions {
    fn default() -> Self {
        Self {
            annotation_type: AnnotationType::Classification,
            annotations: 10,
            split: SplitRatios::default(),
            boxes_on_first: 1,
        }
    }
}

/// Seed a user, project, source dataset, tags, contents, annotations and an
/// INITIALIZED model pointing at the source dataset.
pub fn seed_project(conn: &Connection, options: &SeedOptions) {
    users::insert(
        conn,
        &User {
            id: USER.into(),
            username: "ada".into(),
            email: "ada@example.com".into(),
        },
    )
    .unwrap();
    projects::insert(
        conn,
        &Project {
            id: PROJECT.into(),
            user_id: USER.into(),
            name: "Birds and pets".into(),
            annotation_type: options.annotation_type,
        },
    )
    .unwrap();
    datasets::insert(
        conn,
        &Dataset {
            id: SOURCE_DATASET.into(),
            user_id: USER.into(),
            project_id: PROJECT.into(),
            version: 0,
            locked: false,
            split: options.split,
        },
    )
    .unwrap();
    for (id, name) in TAGS {
        tags::insert(
            conn,
            &Tag {
                id: id.into(),
                user_id: USER.into(),
                project_id: PROJECT.into(),
                dataset_id: SOURCE_DATASET.into(),
                name: name.into(),
                properties: json!({"color": "#ff0000"}),
            },
        )
        .unwrap();
    }

    for idx in 0..options.annotations {
        let content_id = format!("c{idx}");
        contents::insert(
            conn,
            &Content {
                id: content_id.clone(),
                user_id: USER.into(),
                stored_dir: "bucket/u1/images".into(),
                stored_path: format!("img-{idx}.jpg"),
                width: 640,
                height: 480,
            },
            PROJECT,
        )
        .unwrap();
        contents::attach_to_dataset(conn, USER, &content_id, SOURCE_DATASET).unwrap();

        let tag_ids: Vec<String> = if idx % 2 == 0 {
            vec!["t-cat".into()]
        } else {
            vec!["t-dog".into(), "t-bird".into()]
        };
        let box_count = if idx == 0 { options.boxes_on_first } else { 1 };
        let bounding_boxes = match options.annotation_type {
            AnnotationType::Classification => Vec::new(),
            AnnotationType::BoundingBox => (0..box_count)
                .map(|n| BoundingBox {
                    tag_id: tag_ids[n % tag_ids.len()].clone(),
                    xmin: 10,
                    ymin: 20,
                    xmax: 110,
                    ymax: 70,
                })
                .collect(),
        };
        annotations::insert(
            conn,
            &Annotation {
                id: format!("a{idx}"),
                user_id: USER.into(),
                project_id: PROJECT.into(),
                dataset_id: SOURCE_DATASET.into(),
                content_id,
                tag_ids,
                metadata: AnnotationMetadata { bounding_boxes },
                split: Split::Undefined,
            },
        )
        .unwrap();
    }

    models::insert(conn, &initialized_model()).unwrap();
}

pub fn initialized_model() -> Model {
    Model {
        id: MODEL.into(),
        name: "pets-v1".into(),
        user_id: USER.into(),
        project_id: PROJECT.into(),
        dataset_id: SOURCE_DATASET.into(),
        state: ModelState::Initialized,
        integer_mapping: Default::default(),
        metrics: Default::default(),
        last_error: None,
        training_job_name: None,
        train_started_at: None,
        train_ended_at: None,
        created_at: 1_700_000_000,
        updated_at: 1_700_000_000,
    }
}

/// Pipeline over a blob root in `blob_root` with the given backend and notifier.
pub fn pipeline_with(
    blob_root: &Path,
    trainer: Arc<dyn TrainingBackend>,
    notifier: Arc<dyn Notifier>,
) -> Pipeline {
    let mut config = ServiceConfig::default();
    config.retry.backoff_ms = 0;
    Pipeline::new(
        Collaborators {
            blob: Arc::new(FsBlobStore::new(blob_root)),
            trainer,
            notifier,
        },
        PipelineSettings::from_config(&config),
    )
}

/// Lines of the manifest a run uploaded, or `None` when none was written.
pub fn manifest_lines(blob_root: &Path, name: &str) -> Option<Vec<serde_json::Value>> {
    let path = blob_root
        .join("emld")
        .join(USER)
        .join("models")
        .join(MODEL)
        .join(name);
    let text = std::fs::read_to_string(path).ok()?;
    Some(
        text.lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect(),
    )
}
