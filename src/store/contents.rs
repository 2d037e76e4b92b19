use rusqlite::{Connection, OptionalExtension, params};

use super::{StoreError, datasets, map_sql_error};
use crate::domain::Content;

/// Insert a content row and associate it with its project.
pub fn insert(conn: &Connection, content: &Content, project_id: &str) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO contents (id, user_id, stored_dir, stored_path, width, height)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            content.id,
            content.user_id,
            content.stored_dir,
            content.stored_path,
            content.width,
            content.height
        ],
    )
    .map_err(map_sql_error)?;
    conn.execute(
        "INSERT OR IGNORE INTO content_projects (content_id, project_id) VALUES (?1, ?2)",
        params![content.id, project_id],
    )
    .map_err(map_sql_error)?;
    Ok(())
}

pub fn view(conn: &Connection, user_id: &str, content_id: &str) -> Result<Content, StoreError> {
    conn.query_row(
        "SELECT id, user_id, stored_dir, stored_path, width, height
         FROM contents WHERE user_id = ?1 AND id = ?2",
        params![user_id, content_id],
        |row| {
            Ok(Content {
                id: row.get(0)?,
                user_id: row.get(1)?,
                stored_dir: row.get(2)?,
                stored_path: row.get(3)?,
                width: row.get(4)?,
                height: row.get(5)?,
            })
        },
    )
    .optional()
    .map_err(map_sql_error)?
    .ok_or_else(|| StoreError::not_found("content", content_id))
}

/// Attach one content item to a dataset; rejected when the dataset is locked.
pub fn attach_to_dataset(
    conn: &Connection,
    user_id: &str,
    content_id: &str,
    dataset_id: &str,
) -> Result<(), StoreError> {
    datasets::ensure_unlocked(conn, user_id, dataset_id)?;
    conn.execute(
        "INSERT OR IGNORE INTO content_datasets (content_id, dataset_id) VALUES (?1, ?2)",
        params![content_id, dataset_id],
    )
    .map_err(map_sql_error)?;
    Ok(())
}

/// Add `target_dataset_id` to the dataset set of every content in the project.
/// Returns the number of new associations.
pub fn associate_dataset(
    conn: &Connection,
    user_id: &str,
    project_id: &str,
    target_dataset_id: &str,
) -> Result<usize, StoreError> {
    datasets::ensure_unlocked(conn, user_id, target_dataset_id)?;
    conn.execute(
        "INSERT OR IGNORE INTO content_datasets (content_id, dataset_id)
         SELECT cp.content_id, ?3
         FROM content_projects AS cp
         JOIN contents AS c ON c.id = cp.content_id
         WHERE c.user_id = ?1 AND cp.project_id = ?2",
        params![user_id, project_id, target_dataset_id],
    )
    .map_err(map_sql_error)
}

/// Ids of contents associated with a dataset, sorted.
pub fn ids_for_dataset(conn: &Connection, dataset_id: &str) -> Result<Vec<String>, StoreError> {
    let mut stmt = conn
        .prepare(
            "SELECT content_id FROM content_datasets WHERE dataset_id = ?1 ORDER BY content_id",
        )
        .map_err(map_sql_error)?;
    let rows = stmt
        .query_map(params![dataset_id], |row| row.get(0))
        .map_err(map_sql_error)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(map_sql_error)
}
