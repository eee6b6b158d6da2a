//! Interactive menu for the scanner.
//!
//! Presents a menu-driven interface using `dialoguer` so operators can run
//! scans, export data, and adjust the configuration without memorising CLI
//! flags. Config edits are saved to disk immediately.

use std::path::Path;

use dialoguer::{Input, Select};
use lemoscan_models::Config;

use crate::config::save_config;

/// Runs the interactive menu loop.
///
/// # Errors
///
/// Returns an error if an I/O prompt or a database operation fails.
pub async fn run(config_path: &Path, mut config: Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("Lemobar area scanner");

    loop {
        println!();
        let items = &[
            "Start collection",
            "Export to CSV",
            "Show config",
            "Modify config",
            "Database stats",
            "Help",
            "Exit",
        ];

        let selection = Select::new()
            .with_prompt("lemoscan")
            .items(items)
            .default(0)
            .interact()?;

        match selection {
            0 => crate::cmd_scan(&config, false).await?,
            1 => crate::cmd_export(&config).await?,
            2 => crate::show_config(&config),
            3 => modify_config(config_path, &mut config)?,
            4 => crate::cmd_stats(&config).await?,
            5 => show_help(),
            6 => {
                println!("Goodbye.");
                return Ok(());
            }
            _ => unreachable!(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config menu
// ---------------------------------------------------------------------------

/// Interactive config sub-menu. Each accepted change is saved immediately.
fn modify_config(
    config_path: &Path,
    config: &mut Config,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        println!();
        let items = &[
            "Authorization token",
            "Request interval (ms)",
            "Scan duration (seconds per city)",
            "Max points per city",
            "Database file path",
            "Export file path",
            "Back",
        ];

        let selection = Select::new()
            .with_prompt("Modify config")
            .items(items)
            .default(0)
            .interact()?;

        match selection {
            0 => {
                let token: String = Input::new()
                    .with_prompt("Authorization token (from the mini-program)")
                    .interact_text()?;
                if token.trim().is_empty() {
                    println!("The token cannot be empty.");
                    continue;
                }
                config.authorization = token;
            }
            1 => {
                let interval: u64 = Input::new()
                    .with_prompt("Request interval in milliseconds")
                    .default(config.interval_ms)
                    .interact_text()?;
                if interval == 0 {
                    println!("The interval must be positive; it is the rate-limit guard.");
                    continue;
                }
                config.interval_ms = interval;
            }
            2 => {
                let duration: u64 = Input::new()
                    .with_prompt("Scan duration in seconds per city")
                    .default(config.duration_secs)
                    .interact_text()?;
                if duration == 0 {
                    println!("The duration must be positive.");
                    continue;
                }
                config.duration_secs = duration;
            }
            3 => {
                let blocks: u32 = Input::new()
                    .with_prompt("Maximum points per city")
                    .default(config.max_blocks)
                    .interact_text()?;
                if blocks == 0 {
                    println!("The point budget must be positive.");
                    continue;
                }
                config.max_blocks = blocks;
            }
            4 => {
                let path: String = Input::new()
                    .with_prompt("Database file path")
                    .default(config.output_db.display().to_string())
                    .interact_text()?;
                config.output_db = path.into();
            }
            5 => {
                let path: String = Input::new()
                    .with_prompt("Export file path")
                    .default(config.output_csv.display().to_string())
                    .interact_text()?;
                config.output_csv = path.into();
            }
            6 => return Ok(()),
            _ => unreachable!(),
        }

        match save_config(config_path, config) {
            Ok(()) => println!("Saved."),
            Err(e) => println!("Failed to save config: {e}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Help
// ---------------------------------------------------------------------------

/// Prints usage notes.
fn show_help() {
    println!();
    println!("Usage notes:");
    println!("  1. Set the authorization token first (Modify config). It is the");
    println!("     Authorization header captured from the Lemobar mini-program.");
    println!("  2. Collection scans all 24 cities concurrently, spiralling");
    println!("     outward from each city center, and dedups areas by id.");
    println!("  3. Ctrl-C stops a running scan gracefully; collected data is kept.");
    println!("  4. Export writes the whole store to a CSV file.");
    println!();
    println!("Parameters:");
    println!("  Request interval  pause between API calls per city; keep it");
    println!("                    generous to avoid being rate-limited.");
    println!("  Scan duration     time budget per city.");
    println!("  Max points        grid-point budget per city.");
    println!();
    println!("  Tokens expire after a while; re-capture when requests start");
    println!("  failing with decode errors.");
}
