#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! `SQLite` persistence for collected Lemobar areas.
//!
//! Opens (or creates) the scan database, ensures the `lemobar_areas` table
//! exists, and provides the write and read operations the scanner and the
//! export/stats commands need. The single write operation is an
//! insert-or-ignore keyed by `area_id`: the first worker to discover an area
//! wins and later discoveries of the same area (from the same or a
//! neighbouring center) are no-ops. That conflict handling lives in the
//! store, so concurrent workers need no coordination of their own.

use std::path::Path;

use lemoscan_models::Area;
use moosicbox_json_utils::database::ToValue as _;
use switchy_database::{Database, DatabaseValue};
use switchy_database_connection::init_sqlite_rusqlite;

/// Errors that can occur during database operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A database query or command failed.
    #[error("Database error: {0}")]
    Database(String),

    /// An I/O operation failed (e.g., creating the database directory).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// Opens (or creates) the scan database at the given path and ensures the
/// schema exists.
///
/// # Errors
///
/// Returns [`DbError`] if the database file cannot be created or the schema
/// DDL fails.
pub async fn open_db(path: &Path) -> Result<Box<dyn Database>, DbError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let db = init_sqlite_rusqlite(Some(path)).map_err(|e| DbError::Database(e.to_string()))?;

    ensure_schema(db.as_ref()).await?;

    Ok(db)
}

/// Opens an in-memory database with the schema applied. Used by tests and
/// dry runs; contents are lost when the handle is dropped.
///
/// # Errors
///
/// Returns [`DbError`] if the connection or schema DDL fails.
pub async fn open_in_memory() -> Result<Box<dyn Database>, DbError> {
    let db = init_sqlite_rusqlite(None).map_err(|e| DbError::Database(e.to_string()))?;

    ensure_schema(db.as_ref()).await?;

    Ok(db)
}

/// Creates the `lemobar_areas` table if it doesn't already exist.
async fn ensure_schema(db: &dyn Database) -> Result<(), DbError> {
    db.exec_raw(
        "CREATE TABLE IF NOT EXISTS lemobar_areas (
            area_id INTEGER PRIMARY KEY,
            area_name TEXT,
            detail_address TEXT,
            latitude REAL,
            longitude REAL,
            total_device_num INTEGER,
            free_device_num INTEGER,
            wait_duration INTEGER
        )",
    )
    .await
    .map_err(|e| DbError::Database(e.to_string()))?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Inserts an area unless a row with the same `area_id` already exists.
///
/// A conflicting insert is a no-op: the originally stored field values are
/// retained. Safe to call concurrently from multiple workers.
///
/// # Errors
///
/// Returns [`DbError`] if the insert fails.
pub async fn upsert_area(db: &dyn Database, area: &Area) -> Result<(), DbError> {
    db.exec_raw_params(
        "INSERT INTO lemobar_areas (area_id, area_name, detail_address, latitude,
             longitude, total_device_num, free_device_num, wait_duration)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT (area_id) DO NOTHING",
        &[
            DatabaseValue::Int64(area.id),
            DatabaseValue::String(area.area_name.clone()),
            DatabaseValue::String(area.detail_address.clone()),
            DatabaseValue::Real64(area.latitude),
            DatabaseValue::Real64(area.longitude),
            DatabaseValue::Int64(area.total_device_num),
            DatabaseValue::Int64(area.free_device_num),
            DatabaseValue::Int64(area.wait_duration),
        ],
    )
    .await
    .map_err(|e| DbError::Database(e.to_string()))?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Retrieves every stored area, ordered by `area_id`.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub async fn all_areas(db: &dyn Database) -> Result<Vec<Area>, DbError> {
    let rows = db
        .query_raw_params("SELECT * FROM lemobar_areas ORDER BY area_id ASC", &[])
        .await
        .map_err(|e| DbError::Database(e.to_string()))?;

    Ok(rows.iter().map(row_to_area).collect())
}

/// Counts the stored areas.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub async fn count_areas(db: &dyn Database) -> Result<i64, DbError> {
    let rows = db
        .query_raw_params("SELECT COUNT(*) AS cnt FROM lemobar_areas", &[])
        .await
        .map_err(|e| DbError::Database(e.to_string()))?;

    let n: i64 = rows
        .first()
        .and_then(|r| r.to_value("cnt").ok())
        .unwrap_or(0);

    Ok(n)
}

/// Top-10 area counts grouped by the first two characters of the area name.
///
/// Lemobar prefixes venue names with the city, so the 2-character prefix is
/// a usable city bucket for the stats display.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub async fn city_breakdown(db: &dyn Database) -> Result<Vec<(String, i64)>, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT SUBSTR(area_name, 1, 2) AS city, COUNT(*) AS cnt
             FROM lemobar_areas
             GROUP BY SUBSTR(area_name, 1, 2)
             ORDER BY cnt DESC
             LIMIT 10",
            &[],
        )
        .await
        .map_err(|e| DbError::Database(e.to_string()))?;

    Ok(rows
        .iter()
        .map(|row| {
            (
                row.to_value("city").unwrap_or_default(),
                row.to_value("cnt").unwrap_or(0),
            )
        })
        .collect())
}

/// Converts a database row into an [`Area`].
fn row_to_area(row: &switchy_database::Row) -> Area {
    Area {
        id: row.to_value("area_id").unwrap_or(0),
        area_name: row.to_value("area_name").unwrap_or_default(),
        detail_address: row.to_value("detail_address").unwrap_or_default(),
        latitude: row.to_value("latitude").unwrap_or(0.0),
        longitude: row.to_value("longitude").unwrap_or(0.0),
        total_device_num: row.to_value("total_device_num").unwrap_or(0),
        free_device_num: row.to_value("free_device_num").unwrap_or(0),
        wait_duration: row.to_value("wait_duration").unwrap_or(0),
    }
}
