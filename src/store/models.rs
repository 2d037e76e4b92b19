use std::collections::BTreeMap;

use rusqlite::{Connection, OptionalExtension, params};

use super::util::{json_column, to_json};
use super::{StoreError, map_sql_error, now_epoch_seconds};
use crate::domain::{Metrics, Model, ModelState};

const MODEL_COLUMNS: &str = "id, name, user_id, project_id, dataset_id, state, integer_mapping, \
     metrics, last_error, training_job_name, train_started_at, train_ended_at, created_at, updated_at";

fn map_model(row: &rusqlite::Row<'_>) -> rusqlite::Result<Model> {
    let state: String = row.get(5)?;
    Ok(Model {
        id: row.get(0)?,
        name: row.get(1)?,
        user_id: row.get(2)?,
        project_id: row.get(3)?,
        dataset_id: row.get(4)?,
        state: ModelState::parse(&state),
        integer_mapping: json_column(row, 6)?,
        metrics: json_column(row, 7)?,
        last_error: row.get(8)?,
        training_job_name: row.get(9)?,
        train_started_at: row.get(10)?,
        train_ended_at: row.get(11)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

/// Fields written when a run finishes successfully.
#[derive(Debug, Clone)]
pub struct TrainedUpdate<'a> {
    pub user_id: &'a str,
    pub model_id: &'a str,
    pub dataset_id: &'a str,
    pub integer_mapping: &'a BTreeMap<String, usize>,
    pub metrics: &'a Metrics,
    pub training_job_name: &'a str,
    pub ended_at: i64,
}

pub fn insert(conn: &Connection, model: &Model) -> Result<(), StoreError> {
    conn.execute(
        &format!("INSERT INTO models ({MODEL_COLUMNS})
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)"),
        params![
            model.id,
            model.name,
            model.user_id,
            model.project_id,
            model.dataset_id,
            model.state.as_str(),
            to_json(&model.integer_mapping)?,
            to_json(&model.metrics)?,
            model.last_error,
            model.training_job_name,
            model.train_started_at,
            model.train_ended_at,
            model.created_at,
            model.updated_at,
        ],
    )
    .map_err(map_sql_error)?;
    Ok(())
}

pub fn view(conn: &Connection, user_id: &str, model_id: &str) -> Result<Model, StoreError> {
    let sql = format!("SELECT {MODEL_COLUMNS} FROM models WHERE user_id = ?1 AND id = ?2");
    conn.query_row(&sql, params![user_id, model_id], map_model)
        .optional()
        .map_err(map_sql_error)?
        .ok_or_else(|| StoreError::not_found("model", model_id))
}

/// Move an INITIALIZED model to TRAINING, clearing its last error.
///
/// Returns `false` when the model was no longer INITIALIZED, which means
/// another delivery already claimed it.
pub fn mark_training(
    conn: &Connection,
    user_id: &str,
    model_id: &str,
    started_at: i64,
) -> Result<bool, StoreError> {
    let updated = conn
        .execute(
            "UPDATE models
             SET state = 'TRAINING', train_started_at = ?3, last_error = NULL, updated_at = ?4
             WHERE user_id = ?1 AND id = ?2 AND state = 'INITIALIZED'",
            params![user_id, model_id, started_at, now_epoch_seconds()],
        )
        .map_err(map_sql_error)?;
    Ok(updated == 1)
}

pub fn mark_trained(conn: &Connection, update: &TrainedUpdate<'_>) -> Result<(), StoreError> {
    let updated = conn
        .execute(
            "UPDATE models
             SET state = 'TRAINED', dataset_id = ?3, integer_mapping = ?4, metrics = ?5,
                 training_job_name = ?6, train_ended_at = ?7, last_error = NULL, updated_at = ?8
             WHERE user_id = ?1 AND id = ?2",
            params![
                update.user_id,
                update.model_id,
                update.dataset_id,
                to_json(update.integer_mapping)?,
                to_json(update.metrics)?,
                update.training_job_name,
                update.ended_at,
                now_epoch_seconds(),
            ],
        )
        .map_err(map_sql_error)?;
    if updated == 0 {
        return Err(StoreError::not_found("model", update.model_id));
    }
    Ok(())
}

pub fn mark_failed(
    conn: &Connection,
    user_id: &str,
    model_id: &str,
    error: &str,
    ended_at: i64,
) -> Result<(), StoreError> {
    let updated = conn
        .execute(
            "UPDATE models
             SET state = 'ERR', last_error = ?3, train_ended_at = ?4, updated_at = ?5
             WHERE user_id = ?1 AND id = ?2",
            params![user_id, model_id, error, ended_at, now_epoch_seconds()],
        )
        .map_err(map_sql_error)?;
    if updated == 0 {
        return Err(StoreError::not_found("model", model_id));
    }
    Ok(())
}
