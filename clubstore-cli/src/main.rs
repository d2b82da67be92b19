//! Clubstore CLI - Command-line interface for the club store.

use clap::Parser;

use clubstore_cli::cli::{Cli, Command};
use clubstore_cli::commands;
use clubstore_cli::config::Config;
use clubstore_cli::error::CliResult;
use clubstore_cli::output;

fn main() {
    if let Err(e) = run() {
        output::newline();
        output::error(&e.to_string());
        if let Some(help) = miette::Diagnostic::help(&e) {
            output::dim(&format!("  help: {}", help));
        }
        std::process::exit(1);
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();

    let config = Config::discover(cli.config.as_deref())?;
    let mut log = config.log.clone().from_env();
    if cli.verbose {
        log = log.level("debug");
    }
    clubstore_store::logging::init(&log);
    tracing::debug!(command = ?cli.command, config = ?cli.config, "Running command");

    match cli.command {
        Command::Doctor(args) => commands::doctor::run(args, &config),
        Command::Drivers(args) => commands::drivers::run(args, &config),
        Command::Tables(args) => commands::tables::run(args, &config),
        Command::Query(args) => commands::query::run(args, &config),
        Command::Version => commands::version::run(),
    }
}
