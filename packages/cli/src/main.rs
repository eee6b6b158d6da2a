#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the Lemobar area scanner.
//!
//! Provides subcommands for running a scan, exporting collected areas to
//! CSV, showing database statistics, and inspecting the configuration.
//! Running without a subcommand opens the interactive menu.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::{Parser, Subcommand};
use dialoguer::Confirm;
use lemoscan_models::{Config, default_centers};
use switchy_database::Database;

mod config;
mod interactive;

use config::DEFAULT_CONFIG_PATH;

/// Scan Lemobar areas city by city.
#[derive(Parser)]
#[command(name = "lemoscan")]
#[command(about = "Collect Lemobar massage-chair areas by spiral-scanning city grids")]
struct Cli {
    /// Path to the JSON config file.
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Subcommand to execute; omit for the interactive menu.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Top-level subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Scan all configured city centers and collect areas.
    Scan {
        /// Skip the confirmation prompt and export automatically when done.
        #[arg(long)]
        yes: bool,
    },

    /// Export collected areas to CSV.
    Export,

    /// Show database statistics.
    Stats,

    /// Show the current configuration.
    ShowConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let loaded = match config::load_config(&cli.config) {
        Ok(loaded) => loaded,
        Err(e) => {
            log::warn!("failed to load config, using defaults: {e}");
            Config::default()
        }
    };

    match cli.command {
        Some(Commands::Scan { yes }) => cmd_scan(&loaded, yes).await,
        Some(Commands::Export) => cmd_export(&loaded).await,
        Some(Commands::Stats) => cmd_stats(&loaded).await,
        Some(Commands::ShowConfig) => {
            show_config(&loaded);
            Ok(())
        }
        None => interactive::run(&cli.config, loaded).await,
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Runs the full multi-city scan, then offers a CSV export.
async fn cmd_scan(config: &Config, assume_yes: bool) -> Result<(), Box<dyn std::error::Error>> {
    if config.authorization.trim().is_empty() {
        println!("The authorization token is not set.");
        println!("Set it under 'Modify config' (or edit {DEFAULT_CONFIG_PATH}) first.");
        return Ok(());
    }

    show_config(config);

    if !assume_yes {
        let proceed = Confirm::new()
            .with_prompt("Start collecting?")
            .default(false)
            .interact()?;
        if !proceed {
            println!("Scan cancelled.");
            return Ok(());
        }
    }

    let db = Arc::new(lemoscan_database::open_db(&config.output_db).await?);
    let centers = default_centers();

    // Ctrl-C raises the stop flag; workers finish their in-flight point and
    // exit at the next budget check, keeping everything written so far.
    let stop = Arc::new(AtomicBool::new(false));
    let stop_on_signal = Arc::clone(&stop);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("interrupt received; stopping workers after their current point");
            stop_on_signal.store(true, Ordering::Relaxed);
        }
    });

    println!("Scanning {} cities...", centers.len());
    let summaries = lemoscan_scan::scan_all(Arc::clone(&db), config, &centers, stop).await?;

    let total_points: u64 = summaries.iter().map(|s| u64::from(s.points_scanned)).sum();
    for summary in &summaries {
        println!(
            "  {}: {} points in {:.2} minutes",
            summary.center,
            summary.points_scanned,
            summary.elapsed.as_secs_f64() / 60.0
        );
    }
    println!(
        "Done: {total_points} points across {} cities, {} areas in store.",
        summaries.len(),
        lemoscan_database::count_areas(db.as_ref().as_ref()).await?
    );

    let export_now = if assume_yes {
        true
    } else {
        Confirm::new()
            .with_prompt("Export to CSV now?")
            .default(true)
            .interact()?
    };
    if export_now {
        run_export(db.as_ref().as_ref(), config).await;
    }

    Ok(())
}

/// Opens the store and exports it to CSV.
async fn cmd_export(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let db = lemoscan_database::open_db(&config.output_db).await?;
    run_export(db.as_ref(), config).await;
    Ok(())
}

/// Exports to the configured CSV path, reporting the outcome.
async fn run_export(db: &dyn Database, config: &Config) {
    match lemoscan_export::export_csv(db, &config.output_csv).await {
        Ok(count) => println!(
            "Exported {count} areas to {}.",
            config.output_csv.display()
        ),
        Err(e) => println!("Export failed: {e}"),
    }
}

/// Prints total and per-city-prefix record counts.
async fn cmd_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let db = lemoscan_database::open_db(&config.output_db).await?;

    let total = lemoscan_database::count_areas(db.as_ref()).await?;
    println!("Total areas: {total}");

    if total > 0 {
        println!("By city prefix (top 10):");
        for (city, count) in lemoscan_database::city_breakdown(db.as_ref()).await? {
            println!("  {city}: {count}");
        }
    }

    Ok(())
}

/// Prints the current configuration with the token truncated.
fn show_config(config: &Config) {
    let auth = if config.authorization.is_empty() {
        "(not set)".to_owned()
    } else if config.authorization.chars().count() > 20 {
        let prefix: String = config.authorization.chars().take(20).collect();
        format!("{prefix}...")
    } else {
        config.authorization.clone()
    };

    println!("Current configuration:");
    println!("  Authorization:    {auth}");
    println!("  Request interval: {} ms", config.interval_ms);
    println!("  Scan duration:    {} s per city", config.duration_secs);
    println!("  Max points:       {} per city", config.max_blocks);
    println!("  Database file:    {}", config.output_db.display());
    println!("  Export file:      {}", config.output_csv.display());
}
