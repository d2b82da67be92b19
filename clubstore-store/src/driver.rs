//! Driver registry and connection descriptors.
//!
//! A driver is a host-registered component that knows how to open one store
//! format. The manager never names a driver directly: it asks a
//! [`DriverRegistry`] for every installed driver, keeps the ones whose name
//! starts with the configured [`DriverFamily`], and connects through the
//! selected one.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use crate::error::DriverResult;
use crate::row::Row;
use crate::types::Value;

/// Identity and capabilities of an installed driver.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DriverDescriptor {
    name: String,
    extensions: Vec<String>,
}

impl DriverDescriptor {
    /// Create a descriptor. Extensions are stored lower-case without dots.
    pub fn new<I, S>(name: impl Into<String>, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            name: name.into(),
            extensions: extensions
                .into_iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }

    /// Driver name as the registry reports it.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// File extensions this driver opens.
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Whether the driver claims files with this path's extension.
    pub fn supports(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
            .unwrap_or(false)
    }
}

impl fmt::Display for DriverDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Name prefix selecting the drivers able to open the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverFamily(String);

impl DriverFamily {
    /// Create a family from a name prefix.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self(prefix.into())
    }

    /// The prefix.
    pub fn prefix(&self) -> &str {
        &self.0
    }

    /// Whether a driver name belongs to this family.
    pub fn matches(&self, name: &str) -> bool {
        name.starts_with(&self.0)
    }

    /// Keep the family members of `drivers`, preserving registry order.
    pub fn filter(&self, drivers: Vec<Arc<dyn Driver>>) -> Vec<Arc<dyn Driver>> {
        drivers
            .into_iter()
            .filter(|d| self.matches(d.descriptor().name()))
            .collect()
    }
}

impl fmt::Display for DriverFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifies which driver opens which store file.
///
/// Rendered as `DRIVER={name};DBQ=path;`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    /// Driver name.
    pub driver: String,
    /// Store file.
    pub path: PathBuf,
}

impl ConnectionDescriptor {
    /// Create a descriptor.
    pub fn new(driver: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            driver: driver.into(),
            path: path.into(),
        }
    }
}

impl fmt::Display for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DRIVER={{{}}};DBQ={};", self.driver, self.path.display())
    }
}

/// Error parsing a connection descriptor string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid connection descriptor: {0}")]
pub struct DescriptorParseError(String);

impl FromStr for ConnectionDescriptor {
    type Err = DescriptorParseError;

    /// Parse `DRIVER={name};DBQ=path;`. Keys are case-insensitive and the
    /// braces around the driver name are optional.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut driver = None;
        let mut path = None;

        for pair in split_attributes(s) {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| DescriptorParseError(format!("expected key=value, got '{}'", pair)))?;
            let value = value.trim();
            match key.trim().to_ascii_uppercase().as_str() {
                "DRIVER" => {
                    let name = value
                        .strip_prefix('{')
                        .and_then(|v| v.strip_suffix('}'))
                        .unwrap_or(value);
                    driver = Some(name.to_string());
                }
                "DBQ" => path = Some(PathBuf::from(value)),
                _ => {}
            }
        }

        let driver = driver
            .filter(|d| !d.is_empty())
            .ok_or_else(|| DescriptorParseError("missing DRIVER".to_string()))?;
        let path = path
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or_else(|| DescriptorParseError("missing DBQ".to_string()))?;
        Ok(Self { driver, path })
    }
}

/// Split on `;` that are not inside `{...}`.
fn split_attributes(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            ';' if depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts.into_iter().filter(|p| !p.trim().is_empty()).collect()
}

/// A live driver session. One session backs exactly one connection handle.
pub trait Session: Send {
    /// Start an explicit transaction.
    fn begin(&mut self) -> DriverResult<()>;

    /// Run a statement and fetch every row.
    fn query(&mut self, sql: &str, params: &[Value]) -> DriverResult<Vec<Row>>;

    /// Run a statement and return the affected-row count.
    fn execute(&mut self, sql: &str, params: &[Value]) -> DriverResult<u64>;

    /// Run one statement once per parameter set and return the total count.
    fn execute_batch(&mut self, sql: &str, params_list: &[Vec<Value>]) -> DriverResult<u64> {
        let mut total = 0;
        for params in params_list {
            total += self.execute(sql, params)?;
        }
        Ok(total)
    }

    /// Commit the open transaction.
    fn commit(&mut self) -> DriverResult<()>;

    /// Roll back the open transaction.
    fn rollback(&mut self) -> DriverResult<()>;

    /// Whether a transaction is open.
    fn in_transaction(&self) -> bool;

    /// Names of the user tables in the store.
    fn tables(&mut self) -> DriverResult<Vec<String>>;

    /// Close the session, reporting any error from the driver.
    fn close(self: Box<Self>) -> DriverResult<()>;
}

/// An installed connectivity driver.
pub trait Driver: Send + Sync {
    /// Name and capabilities.
    fn descriptor(&self) -> &DriverDescriptor;

    /// Open a session for the described store.
    fn connect(&self, descriptor: &ConnectionDescriptor) -> DriverResult<Box<dyn Session>>;
}

/// Enumerates the drivers installed on the host.
pub trait DriverRegistry: Send + Sync {
    /// All installed drivers, in host order.
    fn drivers(&self) -> Vec<Arc<dyn Driver>>;

    /// Names of all installed drivers, in host order.
    fn driver_names(&self) -> Vec<String> {
        self.drivers()
            .iter()
            .map(|d| d.descriptor().name().to_string())
            .collect()
    }
}

/// Drivers compiled into this build.
#[derive(Debug, Clone, Default)]
pub struct HostRegistry {
    busy_timeout_ms: Option<u64>,
}

impl HostRegistry {
    /// Create the host registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Busy timeout handed to the bundled drivers.
    pub fn busy_timeout(mut self, ms: Option<u64>) -> Self {
        self.busy_timeout_ms = ms;
        self
    }
}

impl DriverRegistry for HostRegistry {
    fn drivers(&self) -> Vec<Arc<dyn Driver>> {
        vec![Arc::new(
            crate::sqlite::SqliteDriver::new().busy_timeout(self.busy_timeout_ms),
        )]
    }
}

/// A fixed list of drivers.
#[derive(Clone, Default)]
pub struct StaticRegistry {
    drivers: Vec<Arc<dyn Driver>>,
}

impl StaticRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a driver.
    pub fn with_driver(mut self, driver: impl Driver + 'static) -> Self {
        self.drivers.push(Arc::new(driver));
        self
    }

    /// Append a shared driver.
    pub fn with_shared(mut self, driver: Arc<dyn Driver>) -> Self {
        self.drivers.push(driver);
        self
    }
}

impl fmt::Debug for StaticRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticRegistry")
            .field("drivers", &self.driver_names())
            .finish()
    }
}

impl DriverRegistry for StaticRegistry {
    fn drivers(&self) -> Vec<Arc<dyn Driver>> {
        self.drivers.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DriverError;

    struct NamedDriver(DriverDescriptor);

    impl Driver for NamedDriver {
        fn descriptor(&self) -> &DriverDescriptor {
            &self.0
        }

        fn connect(&self, _: &ConnectionDescriptor) -> DriverResult<Box<dyn Session>> {
            Err(DriverError::open("not a real driver"))
        }
    }

    fn named(name: &str) -> NamedDriver {
        NamedDriver(DriverDescriptor::new(name, ["accdb", "mdb"]))
    }

    #[test]
    fn test_descriptor_supports() {
        let d = DriverDescriptor::new("Microsoft Access Driver (*.mdb, *.accdb)", [".MDB", "accdb"]);
        assert_eq!(d.extensions(), &["mdb".to_string(), "accdb".to_string()]);
        assert!(d.supports(Path::new("C:/club/sports.ACCDB")));
        assert!(!d.supports(Path::new("/club/sports.db")));
        assert!(!d.supports(Path::new("/club/sports")));
    }

    #[test]
    fn test_family_filter_keeps_order() {
        let registry = StaticRegistry::new()
            .with_driver(named("SQL Server"))
            .with_driver(named("Microsoft Access Driver (*.mdb, *.accdb)"))
            .with_driver(named("Microsoft Access dBASE Driver"));
        let family = DriverFamily::new("Microsoft Access");

        let matching = family.filter(registry.drivers());
        let names: Vec<_> = matching.iter().map(|d| d.descriptor().name()).collect();
        assert_eq!(
            names,
            vec!["Microsoft Access Driver (*.mdb, *.accdb)", "Microsoft Access dBASE Driver"]
        );
    }

    #[test]
    fn test_connection_descriptor_display() {
        let d = ConnectionDescriptor::new("SQLite3 Driver", "/srv/club.db");
        assert_eq!(d.to_string(), "DRIVER={SQLite3 Driver};DBQ=/srv/club.db;");
    }

    #[test]
    fn test_connection_descriptor_parse() {
        let d: ConnectionDescriptor = "Driver={Microsoft Access Driver (*.mdb; *.accdb)};Dbq=C:\\club.accdb;"
            .parse()
            .unwrap();
        assert_eq!(d.driver, "Microsoft Access Driver (*.mdb; *.accdb)");
        assert_eq!(d.path, PathBuf::from("C:\\club.accdb"));

        let d: ConnectionDescriptor = "DRIVER=SQLite3;DBQ=/tmp/a.db".parse().unwrap();
        assert_eq!(d.driver, "SQLite3");
    }

    #[test]
    fn test_connection_descriptor_parse_errors() {
        assert!("".parse::<ConnectionDescriptor>().is_err());
        assert!("DBQ=/tmp/a.db".parse::<ConnectionDescriptor>().is_err());
        assert!("DRIVER={x}".parse::<ConnectionDescriptor>().is_err());
        assert!("DRIVER".parse::<ConnectionDescriptor>().is_err());
    }

    #[test]
    fn test_host_registry_lists_bundled_sqlite() {
        let names = HostRegistry::new().driver_names();
        assert_eq!(names.len(), 1);
        assert!(DriverFamily::new("SQLite").matches(&names[0]));
    }
}
