use rusqlite::{Connection, OptionalExtension, params};

use super::{StoreError, map_sql_error};
use crate::domain::{AnnotationType, Project};

pub fn insert(conn: &Connection, project: &Project) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO projects (id, user_id, name, annotation_type) VALUES (?1, ?2, ?3, ?4)",
        params![
            project.id,
            project.user_id,
            project.name,
            project.annotation_type.as_str()
        ],
    )
    .map_err(map_sql_error)?;
    Ok(())
}

pub fn view(conn: &Connection, user_id: &str, project_id: &str) -> Result<Project, StoreError> {
    let row = conn
        .query_row(
            "SELECT id, user_id, name, annotation_type FROM projects
             WHERE user_id = ?1 AND id = ?2",
            params![user_id, project_id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            },
        )
        .optional()
        .map_err(map_sql_error)?
        .ok_or_else(|| StoreError::not_found("project", project_id))?;
    let (id, user_id, name, kind) = row;
    let annotation_type = AnnotationType::parse(&kind).ok_or(StoreError::InvalidValue {
        column: "projects.annotation_type",
        value: kind,
    })?;
    Ok(Project {
        id,
        user_id,
        name,
        annotation_type,
    })
}
