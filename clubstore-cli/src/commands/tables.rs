//! `clubstore tables` command - List the tables in the database.

use clubstore_store::ConnectionManager;

use crate::cli::TablesArgs;
use crate::config::Config;
use crate::error::CliResult;
use crate::output;

/// Run the tables command
pub fn run(args: TablesArgs, config: &Config) -> CliResult<()> {
    let manager = ConnectionManager::new(config.store_for(args.db.as_deref()))?;
    let tables = manager.tables()?;

    output::header(&format!("Tables in {}", manager.location()));

    if tables.is_empty() {
        output::warn("The database has no tables");
        return Ok(());
    }

    for table in &tables {
        output::list_item(table);
    }
    output::newline();
    output::dim(&format!("{} table(s)", tables.len()));

    Ok(())
}
