//! `clubstore doctor` command - Diagnose driver and database connectivity.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use owo_colors::OwoColorize;

use clubstore_store::config::normalize_path;
use clubstore_store::diagnose::{self, DiagnosticReport, SystemInfo};
use clubstore_store::{DriverFamily, DriverRegistry, HostRegistry, StaticRegistry};

use crate::cli::DoctorArgs;
use crate::config::Config;
use crate::error::{CliError, CliResult};
use crate::output::{self, kv};

/// Run the doctor command
pub fn run(args: DoctorArgs, config: &Config) -> CliResult<()> {
    let store = config.store_for(args.path.as_deref());
    let family = DriverFamily::new(store.driver_family.clone());
    let path = resolve_path(&args, store.candidate_path()?)?;

    let host = HostRegistry::new().busy_timeout(store.busy_timeout_ms);
    let pinned = args.driver.as_deref().or(store.driver.as_deref());
    let registry: Box<dyn DriverRegistry> = match pinned {
        Some(name) => {
            let mut registry = StaticRegistry::new();
            for driver in host.drivers() {
                if driver.descriptor().name().eq_ignore_ascii_case(name) {
                    registry = registry.with_shared(Arc::clone(&driver));
                }
            }
            Box::new(registry)
        }
        None => Box::new(host),
    };

    let report = diagnose::probe_drivers(registry.as_ref(), &family, &path);

    if args.json {
        let body = serde_json::json!({
            "system": SystemInfo::collect(),
            "report": &report,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else {
        print_report(&report, &family, pinned);
    }

    if report.is_success() {
        Ok(())
    } else if !report.file_exists {
        Err(CliError::Diagnostics(format!(
            "database file not found: {}",
            report.path.display()
        )))
    } else {
        Err(CliError::Diagnostics(
            "no driver could open the database".to_string(),
        ))
    }
}

/// Ask for a path when none was given and the default is missing.
fn resolve_path(args: &DoctorArgs, candidate: PathBuf) -> CliResult<PathBuf> {
    if args.path.is_none() && !candidate.is_file() && !args.no_prompt {
        output::warn(&format!("Database not found at {}", candidate.display()));
        if let Some(entered) = output::input("Enter the full path to the database file") {
            return Ok(normalize_path(Path::new(entered.trim_matches('"')))?);
        }
    }
    Ok(normalize_path(&candidate)?)
}

fn print_report(report: &DiagnosticReport, family: &DriverFamily, pinned: Option<&str>) {
    let system = SystemInfo::collect();

    output::header("Database connectivity diagnostics");

    output::section("System");
    kv("OS", &format!("{} ({})", system.os, system.family));
    kv("Architecture", &format!("{} ({}-bit)", system.arch, system.pointer_width));
    if let Some(dir) = &system.current_dir {
        kv("Working directory", &dir.display().to_string());
    }
    output::newline();

    output::section("Database");
    kv("Path", &report.path.display().to_string());
    kv(
        "Exists",
        if report.file_exists {
            "yes"
        } else {
            "no"
        },
    );
    output::newline();

    output::section("Drivers");
    kv("Installed", &report.installed.len().to_string());
    kv("Family", family.prefix());
    if let Some(name) = pinned {
        kv("Pinned", name);
    }
    if report.matching.is_empty() {
        output::warn(&format!("No {} drivers found", family));
    }
    for name in &report.matching {
        output::list_item(name);
    }
    output::newline();

    if !report.probes.is_empty() {
        output::section("Connection tests");
        for probe in &report.probes {
            match &probe.result {
                Ok(found) => {
                    println!("  {} {}", "✔".green().bold(), probe.driver);
                    kv("    Tables", &found.tables.len().to_string());
                    if let Some(users) = found.users {
                        kv("    Users", &users.to_string());
                    }
                }
                Err(message) => {
                    println!("  {} {}", "✖".red().bold(), probe.driver);
                    kv("    Error", message);
                }
            }
            if !probe.supports_extension {
                output::dim("      driver does not list this file's extension");
            }
        }
        output::newline();
    }

    match report.working_driver() {
        Some(probe) => {
            output::success(&format!("Connected with {}", probe.driver));
            output::dim(&format!("  {}", probe.descriptor));
            if let Ok(found) = &probe.result {
                for table in &found.tables {
                    output::list_item(table);
                }
            }
        }
        None => {
            output::section("Suggested fixes");
            for (i, tip) in diagnose::suggestions(family).iter().enumerate() {
                output::numbered_item(i + 1, tip);
            }
        }
    }
}
