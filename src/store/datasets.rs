use rusqlite::{Connection, OptionalExtension, params};

use super::{StoreError, map_sql_error, now_epoch_seconds, write_transaction};
use crate::domain::{Dataset, SplitRatios};

pub fn insert(conn: &Connection, dataset: &Dataset) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO datasets
            (id, user_id, project_id, version, locked, split_train, split_validation, split_test, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            dataset.id,
            dataset.user_id,
            dataset.project_id,
            dataset.version,
            dataset.locked,
            dataset.split.train,
            dataset.split.validation,
            dataset.split.test,
            now_epoch_seconds(),
        ],
    )
    .map_err(map_sql_error)?;
    Ok(())
}

pub fn view(conn: &Connection, user_id: &str, dataset_id: &str) -> Result<Dataset, StoreError> {
    conn.query_row(
        "SELECT id, user_id, project_id, version, locked, split_train, split_validation, split_test
         FROM datasets WHERE user_id = ?1 AND id = ?2",
        params![user_id, dataset_id],
        |row| {
            Ok(Dataset {
                id: row.get(0)?,
                user_id: row.get(1)?,
                project_id: row.get(2)?,
                version: row.get(3)?,
                locked: row.get(4)?,
                split: SplitRatios::new(row.get(5)?, row.get(6)?, row.get(7)?),
            })
        },
    )
    .optional()
    .map_err(map_sql_error)?
    .ok_or_else(|| StoreError::not_found("dataset", dataset_id))
}

/// Whether a dataset row with this id exists for the user.
pub fn exists(conn: &Connection, user_id: &str, dataset_id: &str) -> Result<bool, StoreError> {
    conn.query_row(
        "SELECT 1 FROM datasets WHERE user_id = ?1 AND id = ?2",
        params![user_id, dataset_id],
        |_| Ok(()),
    )
    .optional()
    .map(|found| found.is_some())
    .map_err(map_sql_error)
}

/// Number of dataset documents stored for `(user, project)`.
pub fn count_for_project(
    conn: &Connection,
    user_id: &str,
    project_id: &str,
) -> Result<i64, StoreError> {
    conn.query_row(
        "SELECT COUNT(*) FROM datasets WHERE user_id = ?1 AND project_id = ?2",
        params![user_id, project_id],
        |row| row.get(0),
    )
    .map_err(map_sql_error)
}

pub fn set_locked(
    conn: &Connection,
    user_id: &str,
    dataset_id: &str,
    locked: bool,
) -> Result<(), StoreError> {
    let updated = conn
        .execute(
            "UPDATE datasets SET locked = ?3 WHERE user_id = ?1 AND id = ?2",
            params![user_id, dataset_id, locked],
        )
        .map_err(map_sql_error)?;
    if updated == 0 {
        return Err(StoreError::not_found("dataset", dataset_id));
    }
    Ok(())
}

/// Fail with `Locked` when the dataset is locked, `NotFound` when it is missing.
pub fn ensure_unlocked(
    conn: &Connection,
    user_id: &str,
    dataset_id: &str,
) -> Result<(), StoreError> {
    let locked: bool = conn
        .query_row(
            "SELECT locked FROM datasets WHERE user_id = ?1 AND id = ?2",
            params![user_id, dataset_id],
            |row| row.get(0),
        )
        .optional()
        .map_err(map_sql_error)?
        .ok_or_else(|| StoreError::not_found("dataset", dataset_id))?;
    if locked {
        return Err(StoreError::Locked {
            dataset_id: dataset_id.to_string(),
        });
    }
    Ok(())
}

/// Delete a dataset row and its content associations. Returns whether a row was removed.
pub fn delete(conn: &Connection, user_id: &str, dataset_id: &str) -> Result<bool, StoreError> {
    let tx = write_transaction(conn)?;
    let removed = tx
        .execute(
            "DELETE FROM datasets WHERE user_id = ?1 AND id = ?2",
            params![user_id, dataset_id],
        )
        .map_err(map_sql_error)?;
    if removed > 0 {
        tx.execute(
            "DELETE FROM content_datasets WHERE dataset_id = ?1",
            params![dataset_id],
        )
        .map_err(map_sql_error)?;
    }
    tx.commit().map_err(map_sql_error)?;
    Ok(removed > 0)
}
