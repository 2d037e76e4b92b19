use rusqlite::Connection;

use super::{StoreError, map_sql_error};

pub(super) fn apply_pragmas(conn: &Connection, wal: bool) -> Result<(), StoreError> {
    if wal {
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(map_sql_error)?;
    }
    conn.busy_timeout(std::time::Duration::from_secs(5))
        .map_err(map_sql_error)?;
    Ok(())
}

pub(super) fn apply_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            username TEXT NOT NULL,
            email TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS projects (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            name TEXT NOT NULL,
            annotation_type TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS datasets (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            project_id TEXT NOT NULL,
            version INTEGER NOT NULL,
            locked INTEGER NOT NULL DEFAULT 0,
            split_train REAL NOT NULL,
            split_validation REAL NOT NULL,
            split_test REAL NOT NULL,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_datasets_project ON datasets (user_id, project_id);
        CREATE TABLE IF NOT EXISTS tags (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            project_id TEXT NOT NULL,
            dataset_id TEXT NOT NULL,
            name TEXT NOT NULL,
            properties TEXT NOT NULL DEFAULT '{}',
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_tags_dataset ON tags (user_id, dataset_id);
        CREATE TABLE IF NOT EXISTS annotations (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            project_id TEXT NOT NULL,
            dataset_id TEXT NOT NULL,
            content_id TEXT NOT NULL,
            tag_ids TEXT NOT NULL DEFAULT '[]',
            metadata TEXT NOT NULL DEFAULT '{}',
            split TEXT NOT NULL DEFAULT 'UNDEFINED',
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_annotations_dataset ON annotations (user_id, dataset_id);
        CREATE TABLE IF NOT EXISTS contents (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            stored_dir TEXT NOT NULL,
            stored_path TEXT NOT NULL,
            width INTEGER NOT NULL,
            height INTEGER NOT NULL
        );
        CREATE TABLE IF NOT EXISTS content_projects (
            content_id TEXT NOT NULL,
            project_id TEXT NOT NULL,
            PRIMARY KEY (content_id, project_id)
        );
        CREATE TABLE IF NOT EXISTS content_datasets (
            content_id TEXT NOT NULL,
            dataset_id TEXT NOT NULL,
            PRIMARY KEY (content_id, dataset_id)
        );
        CREATE INDEX IF NOT EXISTS idx_content_datasets_dataset ON content_datasets (dataset_id);
        CREATE TABLE IF NOT EXISTS models (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            user_id TEXT NOT NULL,
            project_id TEXT NOT NULL,
            dataset_id TEXT NOT NULL,
            state TEXT NOT NULL,
            integer_mapping TEXT NOT NULL DEFAULT '{}',
            metrics TEXT NOT NULL DEFAULT '{}',
            last_error TEXT,
            training_job_name TEXT,
            train_started_at INTEGER,
            train_ended_at INTEGER,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE TABLE IF NOT EXISTS usage (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            time TEXT NOT NULL,
            usage_type TEXT NOT NULL,
            billing_metric TEXT NOT NULL,
            billable_value REAL NOT NULL,
            metadata TEXT NOT NULL DEFAULT '{}'
        );
        CREATE TABLE IF NOT EXISTS queue_messages (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            queue TEXT NOT NULL,
            body TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending',
            visible_at INTEGER NOT NULL,
            receive_count INTEGER NOT NULL DEFAULT 0,
            last_error TEXT,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_queue_visible ON queue_messages (queue, status, visible_at);",
    )
    .map_err(map_sql_error)
}
