//! libSQL/Turso backend for the Database trait.
//!
//! Works with a local SQLite file or an embedded replica that syncs from a
//! remote Turso database.

mod support;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::Connection;

use crate::db::Database;
use crate::db::support_sql::SqlParam;
use crate::error::DatabaseError;

/// libSQL database backend.
pub struct LibSqlBackend {
    db: Arc<libsql::Database>,
}

impl LibSqlBackend {
    /// Open (or create) a local database file.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!(
                    "Failed to create database directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {}", e)))?;
        tracing::debug!("Opened libSQL database at {}", path.display());
        Ok(Self { db: Arc::new(db) })
    }

    /// Open an embedded replica synced from a remote libSQL server.
    pub async fn new_remote_replica(
        path: &Path,
        url: &str,
        auth_token: &str,
    ) -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_remote_replica(path, url.to_string(), auth_token.to_string())
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open remote replica: {}", e)))?;
        tracing::debug!("Opened libSQL remote replica {} at {}", url, path.display());
        Ok(Self { db: Arc::new(db) })
    }

    /// Open a new connection with a busy timeout set.
    pub async fn connect(&self) -> Result<Connection, DatabaseError> {
        let conn = self
            .db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to connect: {}", e)))?;
        conn.query("PRAGMA busy_timeout = 5000", ())
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to set busy_timeout: {}", e)))?;
        Ok(conn)
    }
}

#[async_trait]
impl Database for LibSqlBackend {
    async fn run_migrations(&self) -> Result<(), DatabaseError> {
        let conn = self.connect().await?;
        conn.execute_batch(super::libsql_migrations::SCHEMA)
            .await
            .map_err(|e| DatabaseError::Migration(e.to_string()))?;
        Ok(())
    }
}

// ==================== Row helpers ====================

pub(crate) fn bind_params(params: Vec<SqlParam>) -> libsql::params::Params {
    libsql::params::Params::Positional(
        params
            .into_iter()
            .map(|param| match param {
                SqlParam::Int(value) => libsql::Value::Integer(value),
                SqlParam::Text(value) => libsql::Value::Text(value),
            })
            .collect(),
    )
}

pub(crate) fn get_text(row: &libsql::Row, idx: i32) -> String {
    get_opt_text(row, idx).unwrap_or_default()
}

pub(crate) fn get_opt_text(row: &libsql::Row, idx: i32) -> Option<String> {
    row.get::<Option<String>>(idx).ok().flatten()
}

pub(crate) fn get_i64(row: &libsql::Row, idx: i32) -> i64 {
    get_opt_i64(row, idx).unwrap_or_default()
}

pub(crate) fn get_opt_i64(row: &libsql::Row, idx: i32) -> Option<i64> {
    row.get::<Option<i64>>(idx).ok().flatten()
}

pub(crate) fn get_flag(row: &libsql::Row, idx: i32) -> bool {
    get_i64(row, idx) != 0
}

/// Unix seconds column to UTC timestamp. NULL reads as the epoch.
pub(crate) fn get_timestamp(
    row: &libsql::Row,
    idx: i32,
    field: &str,
) -> Result<DateTime<Utc>, DatabaseError> {
    let secs = get_i64(row, idx);
    DateTime::from_timestamp(secs, 0).ok_or_else(|| {
        DatabaseError::Serialization(format!("invalid {} timestamp {}", field, secs))
    })
}
