//! Durable work queue with visibility timeouts, stored in the document store.
//!
//! A received message stays hidden until its visibility deadline passes; a
//! consumer that finishes deletes it, a consumer that fails shortens the
//! deadline so another worker can retry. Messages received more than the
//! configured number of times are parked as `dead`.

use std::time::Duration;

use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};
use thiserror::Error;

use crate::store::{StoreError, map_sql_error, now_epoch_seconds};

/// Upper bound on a message's visibility timeout.
pub const MAX_VISIBILITY: Duration = Duration::from_secs(12 * 60 * 60);

const STATUS_PENDING: &str = "pending";
const STATUS_DEAD: &str = "dead";

#[derive(Debug, Error)]
pub enum QueueError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Queue message {0} not found")]
    MessageNotFound(i64),
}

impl From<rusqlite::Error> for QueueError {
    fn from(err: rusqlite::Error) -> Self {
        QueueError::Store(map_sql_error(err))
    }
}

/// A message claimed by one consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMessage {
    pub id: i64,
    pub queue: String,
    pub body: String,
    pub receive_count: u32,
}

/// Publish a message that becomes visible immediately.
pub fn send(conn: &Connection, queue: &str, body: &str) -> Result<i64, QueueError> {
    let now = now_epoch_seconds();
    conn.execute(
        "INSERT INTO queue_messages (queue, body, status, visible_at, receive_count, created_at)
         VALUES (?1, ?2, 'pending', ?3, 0, ?3)",
        params![queue, body, now],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Claim the oldest visible message and hide it for `visibility`.
pub fn receive(
    conn: &mut Connection,
    queue: &str,
    visibility: Duration,
) -> Result<Option<QueueMessage>, QueueError> {
    let visibility = visibility.min(MAX_VISIBILITY);
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let now = now_epoch_seconds();
    let hidden_until = now.saturating_add(visibility.as_secs() as i64);
    let message = tx
        .query_row(
            "UPDATE queue_messages
             SET visible_at = ?3, receive_count = receive_count + 1
             WHERE id = (
                 SELECT id FROM queue_messages
                 WHERE queue = ?1 AND status = 'pending' AND visible_at <= ?2
                 ORDER BY visible_at ASC, id ASC
                 LIMIT 1
             )
             RETURNING id, queue, body, receive_count",
            params![queue, now, hidden_until],
            |row| {
                Ok(QueueMessage {
                    id: row.get(0)?,
                    queue: row.get(1)?,
                    body: row.get(2)?,
                    receive_count: row.get(3)?,
                })
            },
        )
        .optional()?;
    tx.commit()?;
    Ok(message)
}

/// Acknowledge a message, removing it from the queue.
pub fn delete(conn: &Connection, message_id: i64) -> Result<(), QueueError> {
    let removed = conn.execute(
        "DELETE FROM queue_messages WHERE id = ?1",
        params![message_id],
    )?;
    if removed == 0 {
        return Err(QueueError::MessageNotFound(message_id));
    }
    Ok(())
}

/// Make a claimed message visible again after `delay`.
pub fn change_visibility(
    conn: &Connection,
    message_id: i64,
    delay: Duration,
    error: Option<&str>,
) -> Result<(), QueueError> {
    let delay = delay.min(MAX_VISIBILITY);
    let visible_at = now_epoch_seconds().saturating_add(delay.as_secs() as i64);
    let updated = conn.execute(
        "UPDATE queue_messages SET visible_at = ?2, last_error = COALESCE(?3, last_error)
         WHERE id = ?1",
        params![message_id, visible_at, error],
    )?;
    if updated == 0 {
        return Err(QueueError::MessageNotFound(message_id));
    }
    Ok(())
}

/// Park pending messages that have been received `max_receive_count` times or
/// more and are visible again. Returns how many were dead-lettered.
pub fn dead_letter_exhausted(
    conn: &Connection,
    queue: &str,
    max_receive_count: u32,
) -> Result<usize, QueueError> {
    let parked = conn.execute(
        "UPDATE queue_messages SET status = ?4
         WHERE queue = ?1 AND status = ?2 AND receive_count >= ?3 AND visible_at <= ?5",
        params![
            queue,
            STATUS_PENDING,
            max_receive_count,
            STATUS_DEAD,
            now_epoch_seconds()
        ],
    )?;
    Ok(parked)
}

/// Counts of pending and dead messages on a queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueDepth {
    pub pending: u64,
    pub dead: u64,
}

pub fn depth(conn: &Connection, queue: &str) -> Result<QueueDepth, QueueError> {
    let mut stmt = conn.prepare(
        "SELECT status, COUNT(*) FROM queue_messages WHERE queue = ?1 GROUP BY status",
    )?;
    let mut rows = stmt.query(params![queue])?;
    let mut depth = QueueDepth::default();
    while let Some(row) = rows.next()? {
        let status: String = row.get(0)?;
        let count: i64 = row.get(1)?;
        match status.as_str() {
            STATUS_PENDING => depth.pending = count.max(0) as u64,
            STATUS_DEAD => depth.dead = count.max(0) as u64,
            _ => {}
        }
    }
    Ok(depth)
}

#[cfg(test)]
mod tests;
