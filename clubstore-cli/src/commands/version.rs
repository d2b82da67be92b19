//! `clubstore version` command - Display version information.

use crate::error::CliResult;
use crate::output::{self, kv};

/// Package version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Package name
const NAME: &str = env!("CARGO_PKG_NAME");

/// Run the version command
pub fn run() -> CliResult<()> {
    output::header("Clubstore");

    kv("Version", VERSION);
    kv("Binary", NAME);

    #[cfg(debug_assertions)]
    let build_mode = "debug";
    #[cfg(not(debug_assertions))]
    let build_mode = "release";

    kv("Build", build_mode);
    kv("Target", &format!("{}-{}", std::env::consts::ARCH, std::env::consts::OS));

    output::newline();

    output::section("Components");
    kv("clubstore-store", env!("CARGO_PKG_VERSION"));
    kv("sqlite", clubstore_store::sqlite::library_version());

    Ok(())
}
