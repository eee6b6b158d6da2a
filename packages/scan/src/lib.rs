#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Concurrent spiral-scan crawler.
//!
//! One worker per city center walks an outward square spiral, queries the
//! API at each grid point, and writes discovered areas into the shared
//! store. Workers are fully independent: they hold their own spiral state
//! and an immutable options snapshot, and share only the database handle
//! (whose insert-or-ignore resolves double discoveries) and a cooperative
//! stop flag.
//!
//! A worker terminates when it has scanned its point budget, when its time
//! budget elapses, or when the stop flag is raised, whichever comes first.
//! Failed points are logged and skipped, never retried, and still consume a
//! budget slot and the pacing delay.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use lemoscan_client::{AreaFetcher, ClientError, LemobarApi};
use lemoscan_models::{Center, Config};
use lemoscan_spiral::SpiralPath;
use switchy_database::Database;

/// Degrees of latitude/longitude per spiral grid unit.
///
/// Applied independently on both axes with no geodesic correction: ~3.3 km
/// at the equator, narrower east-west at higher latitudes.
pub const GRID_STEP_DEGREES: f64 = 0.03;

/// Errors that prevent a scan from starting.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// No authorization token is configured; workers are never launched.
    #[error("authorization token is not set; configure it before scanning")]
    MissingAuthorization,

    /// The API client could not be constructed.
    #[error("API client error: {0}")]
    Client(#[from] ClientError),
}

/// The pair of limits bounding one worker's total work. Either limit
/// terminates the scan; the first to trigger wins.
#[derive(Debug, Clone, Copy)]
pub struct ScanBudget {
    /// Maximum number of grid points to scan.
    pub max_points: u32,
    /// Maximum wall-clock duration, checked before each point.
    pub max_duration: Duration,
}

/// Immutable per-worker options snapshot.
#[derive(Debug, Clone, Copy)]
pub struct ScanOptions {
    /// Point and duration budgets.
    pub budget: ScanBudget,
    /// Pause between consecutive requests. This pacing is the rate-limit
    /// avoidance mechanism and elapses even after a failed call.
    pub interval: Duration,
}

impl ScanOptions {
    /// Derives scan options from the tool configuration.
    #[must_use]
    pub const fn from_config(config: &Config) -> Self {
        Self {
            budget: ScanBudget {
                max_points: config.max_blocks,
                max_duration: Duration::from_secs(config.duration_secs),
            },
            interval: Duration::from_millis(config.interval_ms),
        }
    }
}

/// What one worker accomplished.
#[derive(Debug, Clone)]
pub struct ScanSummary {
    /// Name of the scanned center.
    pub center: String,
    /// Grid points scanned (including failed ones).
    pub points_scanned: u32,
    /// Wall-clock time the worker ran for.
    pub elapsed: Duration,
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

/// Scans one center: walks the spiral, fetches each grid point, and stores
/// the results.
///
/// Per-point failures (network, decode, store) are logged and skipped; the
/// worker only stops on its budgets or the `stop` flag, both checked before
/// each point, so an in-flight point always completes its writes.
pub async fn scan_center<F>(
    db: &dyn Database,
    fetcher: &F,
    center: &Center,
    options: &ScanOptions,
    stop: &AtomicBool,
) -> ScanSummary
where
    F: AreaFetcher,
{
    let start = Instant::now();
    let mut path = SpiralPath::new();
    let mut scanned: u32 = 0;

    while scanned < options.budget.max_points
        && start.elapsed() < options.budget.max_duration
        && !stop.load(Ordering::Relaxed)
    {
        let Some((x, y)) = path.next() else { break };
        let lng = center.lng + f64::from(x) * GRID_STEP_DEGREES;
        let lat = center.lat + f64::from(y) * GRID_STEP_DEGREES;

        match fetcher.fetch_near(lng, lat).await {
            Ok(areas) => {
                for area in &areas {
                    if let Err(e) = lemoscan_database::upsert_area(db, area).await {
                        log::warn!(
                            "[{}@{scanned}] failed to store area {}: {e}",
                            center.name,
                            area.id
                        );
                    }
                }
                log::info!(
                    "[{}@{scanned}] ({lat:.4}, {lng:.4}) -> {} areas",
                    center.name,
                    areas.len()
                );
            }
            Err(e) => {
                log::warn!("[{}@{scanned}] ({lat:.4}, {lng:.4}) {e}", center.name);
            }
        }

        scanned += 1;
        tokio::time::sleep(options.interval).await;
    }

    let elapsed = start.elapsed();
    log::info!(
        "[{}] scan complete: {scanned} points in {:.2} minutes",
        center.name,
        elapsed.as_secs_f64() / 60.0
    );

    ScanSummary {
        center: center.name.clone(),
        points_scanned: scanned,
        elapsed,
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Launches one worker per center against the live Lemobar API and waits for
/// all of them.
///
/// The authorization precondition is checked before any worker launches.
/// Raising `stop` makes every worker finish its in-flight point and exit;
/// already-written data is kept.
///
/// # Errors
///
/// Returns [`ScanError`] if no authorization token is configured or the API
/// client cannot be built. Worker failures never surface here; a worker
/// that hits a bad response burst just logs and carries on.
pub async fn scan_all(
    db: Arc<Box<dyn Database>>,
    config: &Config,
    centers: &[Center],
    stop: Arc<AtomicBool>,
) -> Result<Vec<ScanSummary>, ScanError> {
    if config.authorization.trim().is_empty() {
        return Err(ScanError::MissingAuthorization);
    }

    let fetcher = Arc::new(LemobarApi::new(&config.authorization)?);
    let options = ScanOptions::from_config(config);

    Ok(scan_all_with(db, fetcher, options, centers, stop).await)
}

/// Launches one worker per center with an arbitrary [`AreaFetcher`] and
/// waits for all of them, reporting aggregate elapsed time.
///
/// Workers run as independent tasks; one worker's panic is logged and never
/// aborts its siblings.
pub async fn scan_all_with<F>(
    db: Arc<Box<dyn Database>>,
    fetcher: Arc<F>,
    options: ScanOptions,
    centers: &[Center],
    stop: Arc<AtomicBool>,
) -> Vec<ScanSummary>
where
    F: AreaFetcher + 'static,
{
    let start = Instant::now();
    log::info!("scanning {} centers", centers.len());

    let mut handles = Vec::with_capacity(centers.len());
    for center in centers {
        let db = Arc::clone(&db);
        let fetcher = Arc::clone(&fetcher);
        let stop = Arc::clone(&stop);
        let center = center.clone();

        handles.push(tokio::spawn(async move {
            scan_center(
                db.as_ref().as_ref(),
                fetcher.as_ref(),
                &center,
                &options,
                stop.as_ref(),
            )
            .await
        }));
    }

    let mut summaries = Vec::with_capacity(handles.len());
    for handle in handles {
        match handle.await {
            Ok(summary) => summaries.push(summary),
            Err(e) => log::error!("scan worker panicked: {e}"),
        }
    }

    log::info!(
        "all centers finished in {:.2} minutes",
        start.elapsed().as_secs_f64() / 60.0
    );

    summaries
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use lemoscan_models::Area;

    use super::*;

    /// Mock fetcher that records every queried coordinate and returns a
    /// configured set of area ids on each call.
    struct RecordingFetcher {
        calls: Mutex<Vec<(f64, f64)>>,
        ids: Vec<i64>,
        fail: bool,
    }

    impl RecordingFetcher {
        fn returning(ids: &[i64]) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                ids: ids.to_vec(),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                ids: Vec::new(),
                fail: true,
            }
        }

        fn calls(&self) -> Vec<(f64, f64)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl AreaFetcher for RecordingFetcher {
        async fn fetch_near(&self, lng: f64, lat: f64) -> Result<Vec<Area>, ClientError> {
            self.calls.lock().unwrap().push((lng, lat));

            if self.fail {
                return Err(ClientError::Decode("API returned code 500".to_owned()));
            }

            Ok(self
                .ids
                .iter()
                .map(|&id| Area {
                    id,
                    area_name: format!("Area {id}"),
                    detail_address: String::new(),
                    latitude: lat,
                    longitude: lng,
                    total_device_num: 2,
                    free_device_num: 1,
                    wait_duration: 0,
                })
                .collect())
        }
    }

    fn options(max_points: u32, max_duration: Duration) -> ScanOptions {
        ScanOptions {
            budget: ScanBudget {
                max_points,
                max_duration,
            },
            interval: Duration::from_millis(1),
        }
    }

    const LONG: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn zero_point_budget_makes_no_calls() {
        let db = lemoscan_database::open_in_memory().await.unwrap();
        let fetcher = RecordingFetcher::returning(&[1]);
        let center = Center::new("Test", 0.0, 0.0);
        let stop = AtomicBool::new(false);

        let summary = scan_center(db.as_ref(), &fetcher, &center, &options(0, LONG), &stop).await;

        assert_eq!(summary.points_scanned, 0);
        assert!(fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn zero_duration_budget_stops_before_the_first_point() {
        let db = lemoscan_database::open_in_memory().await.unwrap();
        let fetcher = RecordingFetcher::returning(&[1]);
        let center = Center::new("Test", 0.0, 0.0);
        let stop = AtomicBool::new(false);

        let summary = scan_center(
            db.as_ref(),
            &fetcher,
            &center,
            &options(100, Duration::ZERO),
            &stop,
        )
        .await;

        assert_eq!(summary.points_scanned, 0);
        assert!(fetcher.calls().is_empty());
    }

    /// Fetcher that takes longer than the worker's time budget to respond.
    struct SlowFetcher {
        calls: Mutex<u32>,
        delay: Duration,
    }

    impl AreaFetcher for SlowFetcher {
        async fn fetch_near(&self, lng: f64, lat: f64) -> Result<Vec<Area>, ClientError> {
            *self.calls.lock().unwrap() += 1;
            tokio::time::sleep(self.delay).await;

            Ok(vec![Area {
                id: 1,
                area_name: "Slow".to_owned(),
                detail_address: String::new(),
                latitude: lat,
                longitude: lng,
                total_device_num: 1,
                free_device_num: 1,
                wait_duration: 0,
            }])
        }
    }

    #[tokio::test]
    async fn duration_elapsing_mid_step_still_completes_the_write() {
        let db = lemoscan_database::open_in_memory().await.unwrap();
        // The budget expires while the first fetch is still in flight.
        let fetcher = SlowFetcher {
            calls: Mutex::new(0),
            delay: Duration::from_millis(50),
        };
        let center = Center::new("Test", 0.0, 0.0);
        let stop = AtomicBool::new(false);

        let summary = scan_center(
            db.as_ref(),
            &fetcher,
            &center,
            &options(100, Duration::from_millis(5)),
            &stop,
        )
        .await;

        assert_eq!(summary.points_scanned, 1);
        assert_eq!(*fetcher.calls.lock().unwrap(), 1);
        assert_eq!(lemoscan_database::count_areas(db.as_ref()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn raised_stop_flag_prevents_any_scanning() {
        let db = lemoscan_database::open_in_memory().await.unwrap();
        let fetcher = RecordingFetcher::returning(&[1]);
        let center = Center::new("Test", 0.0, 0.0);
        let stop = AtomicBool::new(true);

        let summary = scan_center(db.as_ref(), &fetcher, &center, &options(100, LONG), &stop).await;

        assert_eq!(summary.points_scanned, 0);
        assert!(fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn four_point_scan_walks_the_spiral_and_dedups() {
        let db = lemoscan_database::open_in_memory().await.unwrap();
        let fetcher = RecordingFetcher::returning(&[1]);
        let center = Center::new("Origin", 0.0, 0.0);
        let stop = AtomicBool::new(false);

        let summary = scan_center(db.as_ref(), &fetcher, &center, &options(4, LONG), &stop).await;

        assert_eq!(summary.points_scanned, 4);
        // (lng, lat) pairs: spiral offsets (0,0),(1,0),(1,1),(0,1) x 0.03.
        assert_eq!(
            fetcher.calls(),
            vec![(0.0, 0.0), (0.03, 0.0), (0.03, 0.03), (0.0, 0.03)]
        );

        // All four calls returned the same area id -> one row.
        assert_eq!(lemoscan_database::count_areas(db.as_ref()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn failed_points_consume_budget_and_write_nothing() {
        let db = lemoscan_database::open_in_memory().await.unwrap();
        let fetcher = RecordingFetcher::failing();
        let center = Center::new("Test", 31.0, 121.0);
        let stop = AtomicBool::new(false);

        let summary = scan_center(db.as_ref(), &fetcher, &center, &options(3, LONG), &stop).await;

        assert_eq!(summary.points_scanned, 3);
        assert_eq!(fetcher.calls().len(), 3);
        assert_eq!(lemoscan_database::count_areas(db.as_ref()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn concurrent_workers_share_the_store_without_duplicates() {
        let db = Arc::new(lemoscan_database::open_in_memory().await.unwrap());
        // Every worker re-discovers the same five areas.
        let fetcher = Arc::new(RecordingFetcher::returning(&[1, 2, 3, 4, 5]));
        let centers = vec![
            Center::new("A", 0.0, 0.0),
            Center::new("B", 1.0, 1.0),
            Center::new("C", 2.0, 2.0),
        ];
        let stop = Arc::new(AtomicBool::new(false));

        let summaries = scan_all_with(
            Arc::clone(&db),
            Arc::clone(&fetcher),
            options(6, LONG),
            &centers,
            stop,
        )
        .await;

        assert_eq!(summaries.len(), 3);
        for summary in &summaries {
            assert_eq!(summary.points_scanned, 6);
        }
        assert_eq!(fetcher.calls().len(), 18);
        assert_eq!(
            lemoscan_database::count_areas(db.as_ref().as_ref())
                .await
                .unwrap(),
            5
        );
    }

    #[tokio::test]
    async fn scan_all_requires_authorization() {
        let db = Arc::new(lemoscan_database::open_in_memory().await.unwrap());
        let config = Config::default();
        let stop = Arc::new(AtomicBool::new(false));

        let result = scan_all(db, &config, &lemoscan_models::default_centers(), stop).await;

        assert!(matches!(result, Err(ScanError::MissingAuthorization)));
    }
}
