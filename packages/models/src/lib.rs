#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared types for the Lemobar area scanner.
//!
//! Contains the wire types for the `area/near` endpoint ([`Area`],
//! [`ApiEnvelope`]), the geographic anchor type ([`Center`]) together with
//! the fixed list of scanned cities, and the tool [`Config`].

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Deserializes an `f64` that the upstream API may encode either as a JSON
/// number or as a quoted string (`"121.4737"`).
mod lenient_f64 {
    use serde::{Deserialize as _, Deserializer};

    #[derive(serde::Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(f64),
        Text(String),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Raw::deserialize(deserializer)? {
            Raw::Num(value) => Ok(value),
            Raw::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
        }
    }
}

/// A single Lemobar area (a venue hosting massage chairs) as returned by the
/// `area/near` endpoint.
///
/// The `id` is assigned upstream and is the stable identity of the area: the
/// same physical location returns the same `id` no matter which scan center
/// discovered it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Area {
    /// Upstream-assigned, globally unique area identifier.
    pub id: i64,
    /// Display name of the venue.
    #[serde(default)]
    pub area_name: String,
    /// Street address of the venue.
    #[serde(default)]
    pub detail_address: String,
    /// Venue latitude. Arrives as a quoted string from the API.
    #[serde(deserialize_with = "lenient_f64::deserialize")]
    pub latitude: f64,
    /// Venue longitude. Arrives as a quoted string from the API.
    #[serde(deserialize_with = "lenient_f64::deserialize")]
    pub longitude: f64,
    /// Number of chairs installed at the venue.
    #[serde(default)]
    pub total_device_num: i64,
    /// Number of chairs currently free.
    #[serde(default)]
    pub free_device_num: i64,
    /// Expected wait in seconds when all chairs are occupied.
    #[serde(default)]
    pub wait_duration: i64,
}

/// The `data` object of the API envelope.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiData {
    /// Areas near the queried coordinate (possibly empty).
    #[serde(default)]
    pub records: Vec<Area>,
}

/// Top-level response envelope of the `area/near` endpoint.
///
/// `code` is an application-level status; `200` means success regardless of
/// the HTTP status line.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope {
    /// Application status code (`200` = success).
    pub code: i64,
    /// Payload; missing on some error responses.
    #[serde(default)]
    pub data: ApiData,
}

// ---------------------------------------------------------------------------
// Centers
// ---------------------------------------------------------------------------

/// A named geographic anchor point from which a spiral scan originates.
#[derive(Debug, Clone, PartialEq)]
pub struct Center {
    /// City label, used in log lines.
    pub name: String,
    /// Latitude of the city center.
    pub lat: f64,
    /// Longitude of the city center.
    pub lng: f64,
}

impl Center {
    /// Creates a new `Center`.
    #[must_use]
    pub fn new(name: &str, lat: f64, lng: f64) -> Self {
        Self {
            name: name.to_owned(),
            lat,
            lng,
        }
    }
}

/// The 24 city centers scanned by default.
#[must_use]
pub fn default_centers() -> Vec<Center> {
    [
        ("Beijing", 39.9042, 116.4074),
        ("Shanghai", 31.2304, 121.4737),
        ("Guangzhou", 23.1291, 113.2644),
        ("Shenzhen", 22.5431, 114.0579),
        ("Hangzhou", 30.2741, 120.1551),
        ("Nanjing", 32.0603, 118.7969),
        ("Chengdu", 30.5728, 104.0668),
        ("Chongqing", 29.5630, 106.5516),
        ("Wuhan", 30.5928, 114.3055),
        ("Xi'an", 34.3416, 108.9398),
        ("Tianjin", 39.3434, 117.3616),
        ("Suzhou", 31.2989, 120.5853),
        ("Zhengzhou", 34.7466, 113.6254),
        ("Changsha", 28.2282, 112.9388),
        ("Qingdao", 36.0671, 120.3826),
        ("Ningbo", 29.8683, 121.5440),
        ("Foshan", 23.0215, 113.1214),
        ("Hefei", 31.8206, 117.2272),
        ("Wuxi", 31.4912, 120.3119),
        ("Xiamen", 24.4798, 118.0894),
        ("Dalian", 38.9140, 121.6147),
        ("Nanchang", 28.6829, 115.8582),
        ("Kunming", 25.0389, 102.7183),
        ("Changzhou", 31.8107, 119.9741),
    ]
    .into_iter()
    .map(|(name, lat, lng)| Center::new(name, lat, lng))
    .collect()
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Tool configuration, persisted as JSON.
///
/// All fields have defaults so a missing or partial config file still yields
/// a usable configuration; only `authorization` has no sensible default and
/// must be set before a scan can start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// `Authorization` header value captured from the Lemobar mini-program.
    pub authorization: String,
    /// Pause between consecutive API requests, per worker.
    pub interval_ms: u64,
    /// Maximum scan duration per city.
    pub duration_secs: u64,
    /// Maximum number of grid points scanned per city.
    pub max_blocks: u32,
    /// Path of the `SQLite` store.
    pub output_db: PathBuf,
    /// Path of the CSV export file.
    pub output_csv: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            authorization: String::new(),
            interval_ms: 200,
            duration_secs: 30 * 60,
            max_blocks: 5000,
            output_db: PathBuf::from("lemobar_scan.db"),
            output_csv: PathBuf::from("lemobar_export.csv"),
        }
    }
}
