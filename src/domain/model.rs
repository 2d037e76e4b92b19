use std::collections::BTreeMap;

use serde_json::Value;

/// Free-form training metrics keyed by metric name.
pub type Metrics = BTreeMap<String, Value>;

/// Lifecycle of a model: `INITIALIZED -> TRAINING -> TRAINED | ERR`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelState {
    Unknown,
    Initialized,
    Training,
    Trained,
    Err,
}

impl ModelState {
    pub fn as_str(self) -> &'static str {
        match self {
            ModelState::Unknown => "UNKNOWN",
            ModelState::Initialized => "INITIALIZED",
            ModelState::Training => "TRAINING",
            ModelState::Trained => "TRAINED",
            ModelState::Err => "ERR",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "INITIALIZED" => ModelState::Initialized,
            "TRAINING" => ModelState::Training,
            "TRAINED" => ModelState::Trained,
            "ERR" => ModelState::Err,
            _ => ModelState::Unknown,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ModelState::Trained | ModelState::Err)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub id: String,
    pub name: String,
    pub user_id: String,
    pub project_id: String,
    pub dataset_id: String,
    pub state: ModelState,
    pub integer_mapping: BTreeMap<String, usize>,
    pub metrics: Metrics,
    pub last_error: Option<String>,
    pub training_job_name: Option<String>,
    pub train_started_at: Option<i64>,
    pub train_ended_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_strings_round_trip() {
        for state in [
            ModelState::Initialized,
            ModelState::Training,
            ModelState::Trained,
            ModelState::Err,
            ModelState::Unknown,
        ] {
            assert_eq!(ModelState::parse(state.as_str()), state);
        }
        assert!(ModelState::Err.is_terminal());
        assert!(!ModelState::Training.is_terminal());
    }
}
