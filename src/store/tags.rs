use rusqlite::{Connection, OptionalExtension, params};

use super::util::{json_column, to_json};
use super::{StoreError, datasets, map_sql_error, now_epoch_seconds};
use crate::domain::Tag;

const TAG_COLUMNS: &str = "id, user_id, project_id, dataset_id, name, properties";

fn map_tag(row: &rusqlite::Row<'_>) -> rusqlite::Result<Tag> {
    Ok(Tag {
        id: row.get(0)?,
        user_id: row.get(1)?,
        project_id: row.get(2)?,
        dataset_id: row.get(3)?,
        name: row.get(4)?,
        properties: json_column(row, 5)?,
    })
}

/// Insert a tag; rejected when its dataset is locked.
pub fn insert(conn: &Connection, tag: &Tag) -> Result<(), StoreError> {
    datasets::ensure_unlocked(conn, &tag.user_id, &tag.dataset_id)?;
    conn.execute(
        "INSERT INTO tags (id, user_id, project_id, dataset_id, name, properties, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            tag.id,
            tag.user_id,
            tag.project_id,
            tag.dataset_id,
            tag.name,
            to_json(&tag.properties)?,
            now_epoch_seconds(),
        ],
    )
    .map_err(map_sql_error)?;
    Ok(())
}

/// Rename a tag; rejected when its dataset is locked.
pub fn rename(
    conn: &Connection,
    user_id: &str,
    tag_id: &str,
    name: &str,
) -> Result<(), StoreError> {
    let tag = view(conn, user_id, tag_id)?;
    datasets::ensure_unlocked(conn, user_id, &tag.dataset_id)?;
    conn.execute(
        "UPDATE tags SET name = ?3 WHERE user_id = ?1 AND id = ?2",
        params![user_id, tag_id, name],
    )
    .map_err(map_sql_error)?;
    Ok(())
}

pub fn view(conn: &Connection, user_id: &str, tag_id: &str) -> Result<Tag, StoreError> {
    let sql = format!("SELECT {TAG_COLUMNS} FROM tags WHERE user_id = ?1 AND id = ?2");
    conn.query_row(&sql, params![user_id, tag_id], map_tag)
        .optional()
        .map_err(map_sql_error)?
        .ok_or_else(|| StoreError::not_found("tag", tag_id))
}

pub fn list_for_dataset(
    conn: &Connection,
    user_id: &str,
    dataset_id: &str,
) -> Result<Vec<Tag>, StoreError> {
    let sql = format!(
        "SELECT {TAG_COLUMNS} FROM tags WHERE user_id = ?1 AND dataset_id = ?2
         ORDER BY created_at ASC, rowid ASC"
    );
    let mut stmt = conn.prepare(&sql).map_err(map_sql_error)?;
    let rows = stmt
        .query_map(params![user_id, dataset_id], map_tag)
        .map_err(map_sql_error)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(map_sql_error)
}

/// Distinct tag names in a dataset, in no particular order.
pub fn distinct_names(
    conn: &Connection,
    user_id: &str,
    dataset_id: &str,
) -> Result<Vec<String>, StoreError> {
    let mut stmt = conn
        .prepare("SELECT DISTINCT name FROM tags WHERE user_id = ?1 AND dataset_id = ?2")
        .map_err(map_sql_error)?;
    let rows = stmt
        .query_map(params![user_id, dataset_id], |row| row.get(0))
        .map_err(map_sql_error)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(map_sql_error)
}

pub fn count_for_dataset(
    conn: &Connection,
    user_id: &str,
    dataset_id: &str,
) -> Result<i64, StoreError> {
    conn.query_row(
        "SELECT COUNT(*) FROM tags WHERE user_id = ?1 AND dataset_id = ?2",
        params![user_id, dataset_id],
        |row| row.get(0),
    )
    .map_err(map_sql_error)
}

/// Remove every tag scoped to a dataset. Returns the number removed.
pub fn delete_for_dataset(
    conn: &Connection,
    user_id: &str,
    dataset_id: &str,
) -> Result<usize, StoreError> {
    conn.execute(
        "DELETE FROM tags WHERE user_id = ?1 AND dataset_id = ?2",
        params![user_id, dataset_id],
    )
    .map_err(map_sql_error)
}
