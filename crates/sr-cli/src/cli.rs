//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sr_core::DstOverride;

use crate::commands::report::ReportArgs;

/// Stay-session reports for smart-speaker conversation logs.
///
/// Reads JSON Lines exports, groups each room's conversations into guest
/// stays and renders the plain-text experience report.
#[derive(Debug, Parser)]
#[command(name = "sr", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Segment a batch into stay sessions and write the report.
    Report(ReportArgs),

    /// Summarize a batch: span, latency risk levels, hotels and rooms.
    Summary {
        /// JSON Lines input file, or `-` for stdin.
        input: PathBuf,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List the supported timezones with their daylight-saving status.
    Zones {
        /// DST override used for the status line.
        #[arg(long, default_value = "auto")]
        dst: DstOverride,
    },

    /// Show how raw timestamp strings are normalized.
    Normalize {
        /// Raw timestamp values.
        #[arg(required = true)]
        values: Vec<String>,
    },
}
