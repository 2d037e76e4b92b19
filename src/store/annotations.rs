use rusqlite::{Connection, OptionalExtension, params};

use super::util::{json_column, to_json};
use super::{StoreError, datasets, map_sql_error, now_epoch_seconds, write_transaction};
use crate::domain::{Annotation, Split};

const ANNOTATION_COLUMNS: &str =
    "id, user_id, project_id, dataset_id, content_id, tag_ids, metadata, split";

fn map_annotation(row: &rusqlite::Row<'_>) -> rusqlite::Result<Annotation> {
    let split: String = row.get(7)?;
    Ok(Annotation {
        id: row.get(0)?,
        user_id: row.get(1)?,
        project_id: row.get(2)?,
        dataset_id: row.get(3)?,
        content_id: row.get(4)?,
        tag_ids: json_column(row, 5)?,
        metadata: json_column(row, 6)?,
        split: Split::parse(&split),
    })
}

/// Insert an annotation; rejected when its dataset is locked.
pub fn insert(conn: &Connection, annotation: &Annotation) -> Result<(), StoreError> {
    datasets::ensure_unlocked(conn, &annotation.user_id, &annotation.dataset_id)?;
    conn.execute(
        "INSERT INTO annotations
            (id, user_id, project_id, dataset_id, content_id, tag_ids, metadata, split, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            annotation.id,
            annotation.user_id,
            annotation.project_id,
            annotation.dataset_id,
            annotation.content_id,
            to_json(&annotation.tag_ids)?,
            to_json(&annotation.metadata)?,
            annotation.split.as_str(),
            now_epoch_seconds(),
        ],
    )
    .map_err(map_sql_error)?;
    Ok(())
}

/// Replace the tags on an annotation; rejected when its dataset is locked.
pub fn replace_tags(
    conn: &Connection,
    user_id: &str,
    annotation_id: &str,
    tag_ids: &[String],
) -> Result<(), StoreError> {
    let annotation = view(conn, user_id, annotation_id)?;
    datasets::ensure_unlocked(conn, user_id, &annotation.dataset_id)?;
    conn.execute(
        "UPDATE annotations SET tag_ids = ?3 WHERE user_id = ?1 AND id = ?2",
        params![user_id, annotation_id, to_json(&tag_ids)?],
    )
    .map_err(map_sql_error)?;
    Ok(())
}

pub fn view(
    conn: &Connection,
    user_id: &str,
    annotation_id: &str,
) -> Result<Annotation, StoreError> {
    let sql =
        format!("SELECT {ANNOTATION_COLUMNS} FROM annotations WHERE user_id = ?1 AND id = ?2");
    conn.query_row(&sql, params![user_id, annotation_id], map_annotation)
        .optional()
        .map_err(map_sql_error)?
        .ok_or_else(|| StoreError::not_found("annotation", annotation_id))
}

pub fn list_for_dataset(
    conn: &Connection,
    user_id: &str,
    dataset_id: &str,
) -> Result<Vec<Annotation>, StoreError> {
    let sql = format!(
        "SELECT {ANNOTATION_COLUMNS} FROM annotations WHERE user_id = ?1 AND dataset_id = ?2
         ORDER BY created_at ASC, rowid ASC"
    );
    let mut stmt = conn.prepare(&sql).map_err(map_sql_error)?;
    let rows = stmt
        .query_map(params![user_id, dataset_id], map_annotation)
        .map_err(map_sql_error)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(map_sql_error)
}

pub fn count_for_dataset(
    conn: &Connection,
    user_id: &str,
    dataset_id: &str,
) -> Result<i64, StoreError> {
    conn.query_row(
        "SELECT COUNT(*) FROM annotations WHERE user_id = ?1 AND dataset_id = ?2",
        params![user_id, dataset_id],
        |row| row.get(0),
    )
    .map_err(map_sql_error)
}

/// Bulk-assign the training split of annotations in one dataset.
///
/// Split assignment is run metadata and is allowed on locked datasets; tag ids
/// are left untouched.
pub fn assign_splits(
    conn: &Connection,
    user_id: &str,
    dataset_id: &str,
    assignments: &[(&str, Split)],
) -> Result<usize, StoreError> {
    if assignments.is_empty() {
        return Ok(0);
    }
    let tx = write_transaction(conn)?;
    let mut updated = 0usize;
    {
        let mut stmt = tx
            .prepare_cached(
                "UPDATE annotations SET split = ?4
                 WHERE user_id = ?1 AND dataset_id = ?2 AND id = ?3",
            )
            .map_err(map_sql_error)?;
        for (annotation_id, split) in assignments {
            updated += stmt
                .execute(params![user_id, dataset_id, annotation_id, split.as_str()])
                .map_err(map_sql_error)?;
        }
    }
    tx.commit().map_err(map_sql_error)?;
    Ok(updated)
}

/// Largest number of bounding boxes stored on any single annotation.
pub fn max_bounding_boxes(
    conn: &Connection,
    user_id: &str,
    dataset_id: &str,
) -> Result<usize, StoreError> {
    let max: Option<i64> = conn
        .query_row(
            "SELECT MAX(COALESCE(json_array_length(metadata, '$.bounding_boxes'), 0))
             FROM annotations WHERE user_id = ?1 AND dataset_id = ?2",
            params![user_id, dataset_id],
            |row| row.get(0),
        )
        .map_err(map_sql_error)?;
    Ok(max.unwrap_or(0).max(0) as usize)
}

/// Remove every annotation scoped to a dataset. Returns the number removed.
pub fn delete_for_dataset(
    conn: &Connection,
    user_id: &str,
    dataset_id: &str,
) -> Result<usize, StoreError> {
    conn.execute(
        "DELETE FROM annotations WHERE user_id = ?1 AND dataset_id = ?2",
        params![user_id, dataset_id],
    )
    .map_err(map_sql_error)
}
