use rusqlite::{Connection, OptionalExtension, params};

use super::{StoreError, map_sql_error};
use crate::domain::User;

pub fn insert(conn: &Connection, user: &User) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO users (id, username, email) VALUES (?1, ?2, ?3)",
        params![user.id, user.username, user.email],
    )
    .map_err(map_sql_error)?;
    Ok(())
}

pub fn view(conn: &Connection, user_id: &str) -> Result<User, StoreError> {
    conn.query_row(
        "SELECT id, username, email FROM users WHERE id = ?1",
        params![user_id],
        |row| {
            Ok(User {
                id: row.get(0)?,
                username: row.get(1)?,
                email: row.get(2)?,
            })
        },
    )
    .optional()
    .map_err(map_sql_error)?
    .ok_or_else(|| StoreError::not_found("user", user_id))
}
