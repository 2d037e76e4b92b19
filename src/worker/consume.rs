//! Turn one queue message into a pipeline run and settle it with the queue.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use rusqlite::Connection;
use tracing::{error, info, warn};

use crate::domain::TrainEvent;
use crate::pipeline::{JobOutcome, Pipeline};
use crate::queue::{self, QueueError, QueueMessage};

/// How a received message was settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsumeOutcome {
    /// Handled; the message was deleted.
    Acked(JobOutcome),
    /// Undecodable; deleted without running the pipeline.
    Discarded { reason: String },
    /// Handling failed; the message becomes visible again after the retry delay.
    Released { error: String },
}

/// Decode, handle and settle `message`.
///
/// Only queue bookkeeping failures are returned; pipeline failures are
/// expressed in the outcome.
pub fn consume_one(
    conn: &Connection,
    pipeline: &Pipeline,
    message: &QueueMessage,
    retry_delay: Duration,
) -> Result<ConsumeOutcome, QueueError> {
    let event = match TrainEvent::decode(&message.body) {
        Ok(event) => event,
        Err(err) => {
            warn!(message = message.id, "Discarding undecodable message: {err}");
            queue::delete(conn, message.id)?;
            return Ok(ConsumeOutcome::Discarded {
                reason: err.to_string(),
            });
        }
    };

    let result = match catch_unwind(AssertUnwindSafe(|| pipeline.handle(conn, &event))) {
        Ok(Ok(outcome)) => Ok(outcome),
        Ok(Err(err)) => Err(err.to_string()),
        Err(payload) => Err(panic_to_string(payload)),
    };
    match result {
        Ok(outcome) => {
            info!(
                message = message.id,
                model = %event.model_id,
                "Train event handled: {outcome:?}"
            );
            queue::delete(conn, message.id)?;
            Ok(ConsumeOutcome::Acked(outcome))
        }
        Err(error) => {
            error!(
                message = message.id,
                model = %event.model_id,
                receive_count = message.receive_count,
                "Train event failed, releasing for retry: {error}"
            );
            queue::change_visibility(conn, message.id, retry_delay, Some(&error))?;
            Ok(ConsumeOutcome::Released { error })
        }
    }
}

fn panic_to_string(payload: Box<dyn std::any::Any + Send>) -> String {
    let message = if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "Unknown panic payload".to_string()
    };
    format!("Train worker panicked: {message}")
}
