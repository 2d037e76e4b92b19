use std::fmt;

/// Labeling task a project is set up for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnotationType {
    Classification,
    BoundingBox,
}

impl AnnotationType {
    /// Stable string stored in the projects table.
    pub fn as_str(self) -> &'static str {
        match self {
            AnnotationType::Classification => "classification",
            AnnotationType::BoundingBox => "bounding_box",
        }
    }

    /// Parse the stored column value.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "classification" => Some(AnnotationType::Classification),
            "bounding_box" => Some(AnnotationType::BoundingBox),
            _ => None,
        }
    }

    pub fn is_object_detection(self) -> bool {
        matches!(self, AnnotationType::BoundingBox)
    }
}

impl fmt::Display for AnnotationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub annotation_type: AnnotationType,
}
