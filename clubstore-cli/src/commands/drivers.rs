//! `clubstore drivers` command - List installed database drivers.

use owo_colors::OwoColorize;

use clubstore_store::{DriverFamily, DriverRegistry, HostRegistry};

use crate::cli::DriversArgs;
use crate::config::Config;
use crate::error::CliResult;
use crate::output::{self, kv};

/// Run the drivers command
pub fn run(args: DriversArgs, config: &Config) -> CliResult<()> {
    let store = config.store_for(None);
    let family = DriverFamily::new(args.family.unwrap_or(store.driver_family));
    let registry = HostRegistry::new();
    let drivers = registry.drivers();

    output::header("Installed drivers");
    kv("Family", family.prefix());
    if let Some(pinned) = &store.driver {
        kv("Pinned", pinned);
    }
    output::newline();

    if drivers.is_empty() {
        output::warn("No drivers are installed");
        return Ok(());
    }

    let mut matching = 0;
    for driver in &drivers {
        let descriptor = driver.descriptor();
        let extensions = descriptor
            .extensions()
            .iter()
            .map(|e| format!(".{}", e))
            .collect::<Vec<_>>()
            .join(", ");
        if family.matches(descriptor.name()) {
            matching += 1;
            println!(
                "  {} {} {}",
                "✔".green().bold(),
                descriptor.name(),
                extensions.dimmed()
            );
        } else {
            println!("  {} {} {}", "·".dimmed(), descriptor.name().dimmed(), extensions.dimmed());
        }
    }

    output::newline();
    output::info(&format!(
        "{} of {} driver(s) match the {} family",
        matching,
        drivers.len(),
        family
    ));

    Ok(())
}
