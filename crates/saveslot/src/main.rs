//! saveslot - inspect and maintain a directory of save slots.
//!
//! This is the main entry point for the saveslot CLI.

use clap::{Parser, Subcommand};
use saveslot_core::{Outcome, SlotRepository, StoreConfig, Validation};
use saveslot_util::log::{LogConfig, LogLevel};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;

#[derive(Parser)]
#[command(name = "saveslot")]
#[command(author, version, about = "Inspect and maintain a directory of save slots", long_about = None)]
struct Cli {
    /// Save root directory (overrides saveslot.json and SAVESLOT_ROOT)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Print every result as a JSON outcome
    #[arg(long, global = true)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List slots with their save time and player
    List,
    /// Print one document of a slot
    Show {
        /// Slot ID, e.g. save_1
        slot: String,
        /// Document name without extension, e.g. user
        document: String,
    },
    /// Check that a slot holds every required document
    Validate {
        /// Slot ID
        slot: String,
    },
    /// Print the ID of the most recent save
    Latest,
    /// Delete a slot and everything in it
    Delete {
        /// Slot ID
        slot: String,
    },
    /// Print version information
    Version,
}

/// One row of `saveslot list`.
#[derive(Debug, Serialize)]
struct SlotSummary {
    id: String,
    timestamp: Option<String>,
    user_name: Option<String>,
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    saveslot_util::log::init(LogConfig {
        level: if cli.verbose {
            LogLevel::Debug
        } else {
            LogLevel::Warn
        },
        ..LogConfig::default()
    });

    let Cli {
        root,
        json,
        command,
        ..
    } = cli;

    match command {
        Commands::Version => report(
            Outcome::ok(serde_json::json!({
                "name": "saveslot",
                "version": env!("CARGO_PKG_VERSION"),
            })),
            json,
            |_| print_version(),
        ),
        Commands::List => {
            let repository = open_repository(root)?;
            report(list_slots(&repository), json, |slots| print_slots(slots))
        }
        Commands::Show { slot, document } => {
            let repository = open_repository(root)?;
            report(repository.load_document(&slot, &document), json, |value| {
                match serde_json::to_string_pretty(value) {
                    Ok(text) => println!("{text}"),
                    Err(_) => println!("{value}"),
                }
            })
        }
        Commands::Validate { slot } => {
            let repository = open_repository(root)?;
            report(repository.validate(&slot), json, |validation| {
                print_validation(&slot, validation)
            })
        }
        Commands::Latest => {
            let repository = open_repository(root)?;
            report(repository.get_latest_save_id(), json, |id| println!("{id}"))
        }
        Commands::Delete { slot } => {
            let repository = open_repository(root)?;
            report(repository.delete(&slot), json, |_| {
                println!("Deleted save slot: {slot}")
            })
        }
    }
}

fn open_repository(root: Option<PathBuf>) -> anyhow::Result<SlotRepository> {
    let cwd = std::env::current_dir()?;
    let config = resolve_config(&cwd, root)?;
    debug!(root = %config.root.display(), "Using save root");
    Ok(SlotRepository::open(&config)?)
}

/// Load `saveslot.json` from `cwd` plus environment overrides, then apply `--root`.
///
/// With no configured root at all the per-user data directory is used.
fn resolve_config(cwd: &Path, root: Option<PathBuf>) -> anyhow::Result<StoreConfig> {
    let (mut config, sources) = StoreConfig::load(Some(cwd))?;
    for source in &sources {
        debug!(path = %source.display(), "Loaded config");
    }

    if let Some(root) = root {
        config.root = root;
    } else if sources.is_empty() && std::env::var_os("SAVESLOT_ROOT").is_none() {
        if let Some(user_root) = saveslot_util::path::user_save_root() {
            config.root = user_root;
        }
    }
    Ok(config)
}

/// Print `outcome` and map it to the process exit status.
fn report<T: Serialize>(
    outcome: Outcome<T>,
    json: bool,
    render: impl FnOnce(&T),
) -> anyhow::Result<ExitCode> {
    let status = if outcome.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(status);
    }

    match outcome.into_result() {
        Ok(data) => render(&data),
        Err(e) => eprintln!("Error: {e}"),
    }
    Ok(status)
}

fn list_slots(repository: &SlotRepository) -> Outcome<Vec<SlotSummary>> {
    repository.list().map(|ids| {
        ids.into_iter()
            .map(|id| {
                let metadata = repository.load_metadata(&id).into_data();
                SlotSummary {
                    timestamp: metadata.as_ref().map(|m| m.timestamp.clone()),
                    user_name: metadata.map(|m| m.user_name),
                    id,
                }
            })
            .collect()
    })
}

fn print_slots(slots: &[SlotSummary]) {
    if slots.is_empty() {
        println!("No saves found.");
        return;
    }

    println!("{:<20} {:<22} {:<20}", "ID", "SAVED", "PLAYER");
    println!("{}", "-".repeat(62));
    for slot in slots {
        println!(
            "{:<20} {:<22} {:<20}",
            slot.id,
            slot.timestamp.as_deref().unwrap_or("-"),
            slot.user_name.as_deref().unwrap_or("-")
        );
    }
}

fn print_validation(slot: &str, validation: &Validation) {
    match &validation.missing_files {
        Some(missing) if !validation.valid => {
            println!("{slot}: incomplete (missing: {})", missing.join(", "))
        }
        _ => println!("{slot}: valid"),
    }
}

/// Print version information.
fn print_version() {
    println!("saveslot {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Inspect and maintain a directory of save slots.");
}
