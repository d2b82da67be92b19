//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Clubstore CLI - Club database connectivity tool
#[derive(Parser, Debug)]
#[command(name = "clubstore")]
#[command(version)]
#[command(about = "Clubstore CLI - Club database connectivity tool", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the configuration file (defaults to ./clubstore.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Diagnose driver and database connectivity
    Doctor(DoctorArgs),

    /// List installed database drivers
    Drivers(DriversArgs),

    /// List the tables in the database
    Tables(TablesArgs),

    /// Run a single statement against the database
    Query(QueryArgs),

    /// Display version information
    Version,
}

/// Arguments for the `doctor` command
#[derive(Args, Debug)]
pub struct DoctorArgs {
    /// Database file to probe (defaults to the configured store path)
    pub path: Option<PathBuf>,

    /// Only probe the driver with this name
    #[arg(short, long)]
    pub driver: Option<String>,

    /// Never ask for a path interactively
    #[arg(long)]
    pub no_prompt: bool,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `drivers` command
#[derive(Args, Debug)]
pub struct DriversArgs {
    /// Driver family prefix to highlight (defaults to the configured family)
    #[arg(short, long)]
    pub family: Option<String>,
}

/// Arguments for the `tables` command
#[derive(Args, Debug)]
pub struct TablesArgs {
    /// Database file (defaults to the configured store path)
    #[arg(long, env = "CLUBSTORE_DB_PATH")]
    pub db: Option<PathBuf>,
}

/// Arguments for the `query` command
#[derive(Args, Debug)]
pub struct QueryArgs {
    /// SQL statement with `?` placeholders
    pub sql: String,

    /// Positional parameter: integer, real, `null`, or text
    #[arg(short, long = "param", value_name = "VALUE")]
    pub params: Vec<String>,

    /// Commit the statement and report the affected-row count
    #[arg(short, long)]
    pub write: bool,

    /// Print rows as JSON
    #[arg(long)]
    pub json: bool,

    /// Database file (defaults to the configured store path)
    #[arg(long, env = "CLUBSTORE_DB_PATH")]
    pub db: Option<PathBuf>,
}
