//! Operator diagnostics.
//!
//! Separate from the request path: enumerates every installed driver, keeps
//! the family matches, and probes each one against the store with `SELECT 1`
//! so an operator can see which driver (if any) actually works on this host.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::driver::{ConnectionDescriptor, Driver, DriverFamily, DriverRegistry};
use crate::error::DriverResult;
use crate::types::Value;

/// Table whose row count the probe reports when present.
const USERS_TABLE: &str = "USERS";

/// Facts about the running process that matter for driver compatibility.
#[derive(Debug, Clone, Serialize)]
pub struct SystemInfo {
    /// Operating system.
    pub os: &'static str,
    /// OS family.
    pub family: &'static str,
    /// CPU architecture.
    pub arch: &'static str,
    /// Pointer width in bits; drivers must match it.
    pub pointer_width: u32,
    /// Current directory, if it can be read.
    pub current_dir: Option<PathBuf>,
}

impl SystemInfo {
    /// Collect information about this process.
    pub fn collect() -> Self {
        Self {
            os: std::env::consts::OS,
            family: std::env::consts::FAMILY,
            arch: std::env::consts::ARCH,
            pointer_width: usize::BITS,
            current_dir: std::env::current_dir().ok(),
        }
    }
}

/// What a successful probe found.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeSuccess {
    /// User tables in the store.
    pub tables: Vec<String>,
    /// Row count of the `USERS` table, when there is one.
    pub users: Option<i64>,
}

/// Result of probing one driver.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeOutcome {
    /// Driver name.
    pub driver: String,
    /// Descriptor the probe connected with.
    pub descriptor: String,
    /// Whether the driver claims the store file's extension.
    pub supports_extension: bool,
    /// What the probe found, or the driver's error message.
    pub result: Result<ProbeSuccess, String>,
}

impl ProbeOutcome {
    /// Whether the probe succeeded.
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Findings of a full diagnostic run.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticReport {
    /// Store path that was probed.
    pub path: PathBuf,
    /// Whether the store file exists.
    pub file_exists: bool,
    /// Family prefix used to filter drivers.
    pub family: String,
    /// Every installed driver.
    pub installed: Vec<String>,
    /// Installed drivers in the family.
    pub matching: Vec<String>,
    /// One outcome per matching driver, in registry order.
    pub probes: Vec<ProbeOutcome>,
}

impl DiagnosticReport {
    /// The first driver whose probe succeeded.
    pub fn working_driver(&self) -> Option<&ProbeOutcome> {
        self.probes.iter().find(|p| p.is_success())
    }

    /// Whether some driver can open the store.
    pub fn is_success(&self) -> bool {
        self.working_driver().is_some()
    }
}

/// Probe every family driver in `registry` against `path`.
///
/// When the file does not exist no driver is probed.
pub fn probe_drivers(registry: &dyn DriverRegistry, family: &DriverFamily, path: &Path) -> DiagnosticReport {
    let installed = registry.drivers();
    let installed_names: Vec<String> = installed
        .iter()
        .map(|d| d.descriptor().name().to_string())
        .collect();
    let matching = family.filter(installed);
    let file_exists = path.is_file();

    info!(
        path = %path.display(),
        file_exists,
        installed = ?installed_names,
        matching = matching.len(),
        "Running driver diagnostics"
    );

    let probes = if file_exists {
        matching.iter().map(|d| probe_driver(d.as_ref(), path)).collect()
    } else {
        warn!(path = %path.display(), "Database file does not exist; skipping probes");
        Vec::new()
    };

    DiagnosticReport {
        path: path.to_path_buf(),
        file_exists,
        family: family.prefix().to_string(),
        installed: installed_names,
        matching: matching
            .iter()
            .map(|d| d.descriptor().name().to_string())
            .collect(),
        probes,
    }
}

/// Connect with one driver, run `SELECT 1`, and list what the store holds.
pub fn probe_driver(driver: &dyn Driver, path: &Path) -> ProbeOutcome {
    let descriptor = ConnectionDescriptor::new(driver.descriptor().name(), path);
    let result = run_probe(driver, &descriptor).map_err(|e| e.message);

    match &result {
        Ok(found) => info!(driver = %driver.descriptor(), tables = found.tables.len(), "Probe succeeded"),
        Err(message) => warn!(driver = %driver.descriptor(), error = %message, "Probe failed"),
    }

    ProbeOutcome {
        driver: driver.descriptor().name().to_string(),
        descriptor: descriptor.to_string(),
        supports_extension: driver.descriptor().supports(path),
        result,
    }
}

fn run_probe(driver: &dyn Driver, descriptor: &ConnectionDescriptor) -> DriverResult<ProbeSuccess> {
    let mut session = driver.connect(descriptor)?;

    let found: DriverResult<ProbeSuccess> = (|| {
        session.query("SELECT 1", &[])?;
        let tables = session.tables()?;
        let users = match tables.iter().find(|t| t.eq_ignore_ascii_case(USERS_TABLE)) {
            Some(table) => {
                let rows = session.query(&format!("SELECT COUNT(*) FROM {}", table), &[])?;
                rows.first().and_then(|r| match r.values().first() {
                    Some(Value::Integer(n)) => Some(*n),
                    _ => None,
                })
            }
            None => None,
        };
        Ok(ProbeSuccess { tables, users })
    })();

    let closed = session.close();
    let found = found?;
    closed?;
    Ok(found)
}

/// Remediation steps for a failed diagnostic run.
pub fn suggestions(family: &DriverFamily) -> Vec<String> {
    vec![
        format!(
            "Install a {} connectivity driver built for this process's architecture ({}-bit)",
            family,
            usize::BITS
        ),
        "Check that the database path is correct and the file is accessible".to_string(),
        "Use a full, absolute path to the database file".to_string(),
        "If several drivers are installed, pin one with the `driver` setting or CLUBSTORE_DRIVER"
            .to_string(),
        "Make sure this user has read and write permission on the database file and its directory"
            .to_string(),
    ]
}
