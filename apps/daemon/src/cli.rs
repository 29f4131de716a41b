//! Command line interface for the QuakeLight daemon.

use clap::Parser;
use std::path::PathBuf;

/// Listen for vibrations, measure them, and show their magnitude.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Detector config (JSON). Defaults to the user config file if present.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Recorded vibration trace to replay through the trigger and accelerometer.
    #[arg(short, long, required_unless_present = "print_config")]
    pub trace: Option<PathBuf>,

    /// How long the display flashes the final digit, in milliseconds.
    #[arg(long, default_value_t = 1500)]
    pub flash_ms: u64,

    /// Print every detector event to stdout as one JSON object per line.
    #[arg(long)]
    pub json_events: bool,

    /// Print the effective config and exit.
    #[arg(long)]
    pub print_config: bool,
}
