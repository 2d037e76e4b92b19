use serde::{Deserialize, Serialize};

/// Partition an annotation was assigned to by the last training run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Split {
    #[default]
    Undefined,
    Train,
    Validation,
    Test,
}

impl Split {
    pub fn as_str(self) -> &'static str {
        match self {
            Split::Undefined => "UNDEFINED",
            Split::Train => "TRAIN",
            Split::Validation => "VALIDATION",
            Split::Test => "TEST",
        }
    }

    /// Parse a stored value, treating unknown strings as undefined.
    pub fn parse(value: &str) -> Self {
        match value {
            "TRAIN" => Split::Train,
            "VALIDATION" => Split::Validation,
            "TEST" => Split::Test,
            _ => Split::Undefined,
        }
    }
}

/// Stored box corners, in pixels, plus the tag it is labeled with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub tag_id: String,
    pub xmin: i64,
    pub ymin: i64,
    pub xmax: i64,
    pub ymax: i64,
}

impl BoundingBox {
    /// Convert corner coordinates into `(left, top, width, height)`.
    pub fn to_left_top_width_height(&self) -> (i64, i64, i64, i64) {
        (
            self.xmin,
            self.ymin,
            self.xmax - self.xmin,
            self.ymax - self.ymin,
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotationMetadata {
    #[serde(default)]
    pub bounding_boxes: Vec<BoundingBox>,
}

/// Labels applied to one content item inside one dataset version.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub id: String,
    pub user_id: String,
    pub project_id: String,
    pub dataset_id: String,
    pub content_id: String,
    pub tag_ids: Vec<String>,
    pub metadata: AnnotationMetadata,
    pub split: Split,
}
