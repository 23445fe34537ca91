//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// contraband -- scan a source tree or release bundle for policy violations.
///
/// Use `contraband <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "contraband", version, about, long_about = None)]
pub struct Cli {
    /// Path to the contraband.toml configuration file.
    ///
    /// When omitted, `contraband.toml` in the working directory is used if present,
    /// otherwise built-in defaults apply.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan a directory, file or archive.
    Scan(ScanArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- scan ----

/// Scan a target path for forbidden keywords and file names.
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Path to scan (default: current directory).
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Override the number of scan workers.
    #[arg(short = 'j', long)]
    pub workers: Option<usize>,

    /// Override the queue policy when the task queue is full (block, reject).
    #[arg(long)]
    pub queue_policy: Option<String>,

    /// Also descend into hidden directories (names starting with '.').
    #[arg(long)]
    pub hidden: bool,

    /// Exit with code 0 even when issues are found.
    #[arg(long)]
    pub no_fail: bool,
}

// ---- config ----

/// Manage contraband configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, limits, pool, checks).
        #[arg(long)]
        section: Option<String>,
    },
}
