use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Queue payload asking for one model to be trained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainEvent {
    pub model_id: String,
    pub user_id: String,
}

/// Message bodies that can never be processed.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Malformed train event: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Train event is missing {0}")]
    MissingField(&'static str),
}

impl TrainEvent {
    pub fn new(model_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            user_id: user_id.into(),
        }
    }

    /// Decode a raw queue body, rejecting events with blank ids.
    pub fn decode(body: &str) -> Result<Self, DecodeError> {
        let event: TrainEvent = serde_json::from_str(body)?;
        if event.model_id.trim().is_empty() {
            return Err(DecodeError::MissingField("model_id"));
        }
        if event.user_id.trim().is_empty() {
            return Err(DecodeError::MissingField("user_id"));
        }
        Ok(event)
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
