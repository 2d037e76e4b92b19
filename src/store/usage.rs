use rusqlite::{Connection, params};
use serde_json::Value;

use super::util::to_json;
use super::{StoreError, map_sql_error};
use crate::domain::new_id;

/// Billable resource consumption attached to a user.
#[derive(Debug, Clone, PartialEq)]
pub struct UsageRecord {
    pub user_id: String,
    pub time: String,
    pub usage_type: String,
    pub billing_metric: String,
    pub billable_value: f64,
    pub metadata: Value,
}

pub fn add(conn: &Connection, record: &UsageRecord) -> Result<String, StoreError> {
    let id = new_id();
    conn.execute(
        "INSERT INTO usage (id, user_id, time, usage_type, billing_metric, billable_value, metadata)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            id,
            record.user_id,
            record.time,
            record.usage_type,
            record.billing_metric,
            record.billable_value,
            to_json(&record.metadata)?,
        ],
    )
    .map_err(map_sql_error)?;
    Ok(id)
}

pub fn list_for_user(conn: &Connection, user_id: &str) -> Result<Vec<UsageRecord>, StoreError> {
    let mut stmt = conn
        .prepare(
            "SELECT user_id, time, usage_type, billing_metric, billable_value, metadata
             FROM usage WHERE user_id = ?1 ORDER BY rowid",
        )
        .map_err(map_sql_error)?;
    let rows = stmt
        .query_map(params![user_id], |row| {
            Ok(UsageRecord {
                user_id: row.get(0)?,
                time: row.get(1)?,
                usage_type: row.get(2)?,
                billing_metric: row.get(3)?,
                billable_value: row.get(4)?,
                metadata: super::util::json_column(row, 5)?,
            })
        })
        .map_err(map_sql_error)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(map_sql_error)
}
