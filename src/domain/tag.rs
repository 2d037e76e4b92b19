use serde_json::Value;

/// Label scoped to exactly one dataset version.
#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    pub id: String,
    pub user_id: String,
    pub project_id: String,
    pub dataset_id: String,
    pub name: String,
    pub properties: Value,
}
