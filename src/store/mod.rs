//! SQLite document store backing models, datasets, tags, annotations and the
//! training queue.
//!
//! Repository functions are free functions over `&Connection` so they run the
//! same way against a plain connection or inside a transaction.

pub mod annotations;
pub mod contents;
pub mod datasets;
pub mod models;
pub mod projects;
mod schema;
pub mod tags;
pub mod usage;
pub mod users;
mod util;

use std::path::{Path, PathBuf};

use rusqlite::Connection;
use thiserror::Error;

pub use util::{now_epoch_seconds, now_rfc3339};
pub(crate) use util::{map_sql_error, write_transaction};

/// Errors returned by repository operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database query failed: {0}")]
    Sql(#[from] rusqlite::Error),
    #[error("Database is busy, please retry")]
    Busy,
    #[error("SQLite returned an unexpected result")]
    Unexpected,
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },
    #[error("Dataset {dataset_id} is locked")]
    Locked { dataset_id: String },
    #[error("Invalid stored value for {column}: {value}")]
    InvalidValue { column: &'static str, value: String },
    #[error("Failed to encode stored JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Could not create {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl StoreError {
    pub(crate) fn not_found(entity: &'static str, id: &str) -> Self {
        StoreError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// Owned connection to the document store.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open (or create) the store at `path` and apply the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let conn = Connection::open(path).map_err(map_sql_error)?;
        Self::from_connection(conn, true)
    }

    /// Open a private in-memory store, used by tests and tooling.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(map_sql_error)?;
        Self::from_connection(conn, false)
    }

    fn from_connection(conn: Connection, wal: bool) -> Result<Self, StoreError> {
        schema::apply_pragmas(&conn, wal)?;
        schema::apply_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn conn_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }
}
