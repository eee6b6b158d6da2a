#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CSV export of collected Lemobar areas.
//!
//! Dumps the whole `lemobar_areas` table into a CSV file with a header row,
//! one line per area, coordinates formatted to six decimal places.

use std::path::Path;

use lemoscan_database::DbError;
use switchy_database::Database;

/// Errors that can occur during export.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Reading from the store failed.
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    /// The store holds no areas yet.
    #[error("no collected data to export; run a scan first")]
    NoData,

    /// Writing the CSV file failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Flushing the CSV file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Column order of the export file, matching the table layout.
const HEADER: [&str; 8] = [
    "area_id",
    "area_name",
    "detail_address",
    "latitude",
    "longitude",
    "total_device_num",
    "free_device_num",
    "wait_duration",
];

/// Exports every stored area to a CSV file at `path`, returning the number
/// of exported rows.
///
/// # Errors
///
/// Returns [`ExportError::NoData`] when the store is empty, or another
/// [`ExportError`] if reading the store or writing the file fails.
pub async fn export_csv(db: &dyn Database, path: &Path) -> Result<u64, ExportError> {
    let total = lemoscan_database::count_areas(db).await?;
    if total == 0 {
        return Err(ExportError::NoData);
    }

    log::info!("exporting {total} areas to {}", path.display());

    let areas = lemoscan_database::all_areas(db).await?;

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(HEADER)?;

    for area in &areas {
        writer.write_record([
            area.id.to_string(),
            area.area_name.clone(),
            area.detail_address.clone(),
            format!("{:.6}", area.latitude),
            format!("{:.6}", area.longitude),
            area.total_device_num.to_string(),
            area.free_device_num.to_string(),
            area.wait_duration.to_string(),
        ])?;
    }

    writer.flush()?;

    Ok(areas.len() as u64)
}

#[cfg(test)]
mod tests {
    use lemoscan_models::Area;

    use super::*;

    fn area(id: i64, name: &str) -> Area {
        Area {
            id,
            area_name: name.to_owned(),
            detail_address: "1 Test Rd".to_owned(),
            latitude: 31.2304,
            longitude: 121.4737,
            total_device_num: 4,
            free_device_num: 1,
            wait_duration: 300,
        }
    }

    fn temp_csv(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("lemoscan_export_{}_{name}.csv", std::process::id()))
    }

    #[tokio::test]
    async fn empty_store_refuses_to_export() {
        let db = lemoscan_database::open_in_memory().await.unwrap();
        let path = temp_csv("empty");

        let result = export_csv(db.as_ref(), &path).await;

        assert!(matches!(result, Err(ExportError::NoData)));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn writes_header_and_rows() {
        let db = lemoscan_database::open_in_memory().await.unwrap();
        lemoscan_database::upsert_area(db.as_ref(), &area(2, "Second"))
            .await
            .unwrap();
        lemoscan_database::upsert_area(db.as_ref(), &area(1, "First, with comma"))
            .await
            .unwrap();

        let path = temp_csv("rows");
        let count = export_csv(db.as_ref(), &path).await.unwrap();
        assert_eq!(count, 2);

        let contents = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let mut lines = contents.lines();
        assert_eq!(
            lines.next().unwrap(),
            "area_id,area_name,detail_address,latitude,longitude,\
             total_device_num,free_device_num,wait_duration"
        );
        // Ordered by id; the comma-bearing name gets quoted.
        assert_eq!(
            lines.next().unwrap(),
            "1,\"First, with comma\",1 Test Rd,31.230400,121.473700,4,1,300"
        );
        assert_eq!(
            lines.next().unwrap(),
            "2,Second,1 Test Rd,31.230400,121.473700,4,1,300"
        );
        assert!(lines.next().is_none());
    }
}
