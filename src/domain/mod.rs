//! Entities shared by the store, the pipeline and the worker pool.

pub mod annotation;
pub mod content;
pub mod dataset;
pub mod event;
pub mod ids;
pub mod model;
pub mod project;
pub mod tag;
pub mod user;

pub use annotation::{Annotation, AnnotationMetadata, BoundingBox, Split};
pub use content::Content;
pub use dataset::{Dataset, SplitError, SplitRatios};
pub use event::{DecodeError, TrainEvent};
pub use ids::new_id;
pub use model::{Metrics, Model, ModelState};
pub use project::{AnnotationType, Project};
pub use tag::Tag;
pub use user::User;
