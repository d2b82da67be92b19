//! Integration tests for the connection manager against fixture stores.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use clubstore::prelude::*;
use clubstore::store::{
    ConnectionDescriptor, Driver, DriverDescriptor, DriverError, DriverResult, Session,
    SqliteDriver, StaticRegistry,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

/// Fixture store with TEAMS [(1, "Eagles"), (2, "Hawks")].
fn teams_store() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sports_management_system.db");
    rusqlite::Connection::open(&path)
        .unwrap()
        .execute_batch(
            "CREATE TABLE TEAMS (TeamID INTEGER PRIMARY KEY AUTOINCREMENT, TeamName TEXT NOT NULL);
             INSERT INTO TEAMS (TeamName) VALUES ('Eagles'), ('Hawks');",
        )
        .unwrap();
    (dir, path)
}

fn manager(path: &PathBuf) -> ConnectionManager {
    ConnectionManager::new(StoreConfig::file(path)).unwrap()
}

fn team_count(manager: &ConnectionManager) -> i64 {
    manager
        .query_one(&Statement::new("SELECT COUNT(*) FROM TEAMS"))
        .unwrap()
        .unwrap()
        .get(0)
        .unwrap()
}

/// Driver that records connect attempts.
struct CountingDriver {
    descriptor: DriverDescriptor,
    attempts: Arc<AtomicUsize>,
}

impl Driver for CountingDriver {
    fn descriptor(&self) -> &DriverDescriptor {
        &self.descriptor
    }

    fn connect(&self, descriptor: &ConnectionDescriptor) -> DriverResult<Box<dyn Session>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        SqliteDriver::new().connect(descriptor)
    }
}

#[test]
fn test_construction_requires_existing_file() {
    let (dir, path) = teams_store();
    assert!(ConnectionManager::new(StoreConfig::file(&path)).is_ok());

    for missing in ["absent.db", "nested/absent.db", "absent"] {
        let err = ConnectionManager::new(StoreConfig::file(dir.path().join(missing))).unwrap_err();
        assert!(err.is_configuration(), "{missing}: {err}");
        assert!(err.to_string().contains("database file not found"));
    }
}

#[test]
fn test_no_matching_driver_never_connects() {
    let (_dir, path) = teams_store();
    let attempts = Arc::new(AtomicUsize::new(0));
    let registry = StaticRegistry::new().with_driver(CountingDriver {
        descriptor: DriverDescriptor::new("Text Driver (*.txt, *.csv)", ["txt", "csv"]),
        attempts: Arc::clone(&attempts),
    });
    let manager = ConnectionManager::builder()
        .path(&path)
        .registry(Arc::new(registry))
        .build()
        .unwrap();

    let err = manager.open_connection().unwrap_err();
    assert!(err.is_driver_not_found());
    assert_eq!(err.code(), "store::driver_not_found");
    assert!(err.to_string().contains("no SQLite drivers found"));

    let err = manager
        .execute(&Statement::new("SELECT 1"), ResultMode::Rows)
        .unwrap_err();
    assert!(err.is_driver_not_found());
    assert_eq!(attempts.load(Ordering::SeqCst), 0);
}

#[test]
fn test_empty_registry_is_driver_not_found() {
    let (_dir, path) = teams_store();
    let manager = ConnectionManager::builder()
        .path(&path)
        .registry(Arc::new(StaticRegistry::new()))
        .build()
        .unwrap();
    let err = manager.open_connection().unwrap_err();
    assert!(err.to_string().contains("installed: none"));
}

#[test]
fn test_matching_driver_opens_probe_capable_handle() {
    let (_dir, path) = teams_store();
    let attempts = Arc::new(AtomicUsize::new(0));
    let registry = StaticRegistry::new()
        .with_driver(CountingDriver {
            descriptor: DriverDescriptor::new("Text Driver (*.txt, *.csv)", ["txt"]),
            attempts: Arc::new(AtomicUsize::new(0)),
        })
        .with_driver(CountingDriver {
            descriptor: DriverDescriptor::new("SQLite3 Driver", ["db"]),
            attempts: Arc::clone(&attempts),
        });
    let manager = ConnectionManager::builder()
        .path(&path)
        .registry(Arc::new(registry))
        .build()
        .unwrap();

    let mut handle = manager.open_connection().unwrap();
    handle.probe().unwrap();
    assert_eq!(handle.driver().name(), "SQLite3 Driver");
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
    assert_eq!(manager.open_handles(), 1);
    handle.close().unwrap();
    assert_eq!(manager.open_handles(), 0);
}

#[test]
fn test_read_returns_fixture_rows() {
    let (_dir, path) = teams_store();
    let manager = manager(&path);

    let rows = manager
        .execute(
            &Statement::new("SELECT TeamID, TeamName FROM TEAMS ORDER BY TeamID"),
            ResultMode::Rows,
        )
        .unwrap()
        .into_rows();

    let teams: Vec<(i64, String)> = rows
        .iter()
        .map(|r| (r.get(0).unwrap(), r.get(1).unwrap()))
        .collect();
    assert_eq!(teams, vec![(1, "Eagles".to_string()), (2, "Hawks".to_string())]);
    assert_eq!(rows[0].get_by_name::<String>("teamname").unwrap(), "Eagles");
}

#[test]
fn test_write_commits_and_is_visible() {
    let (_dir, path) = teams_store();
    let manager = manager(&path);
    let before = team_count(&manager);

    let result = manager
        .execute(
            &Statement::new("INSERT INTO TEAMS (TeamName) VALUES (?)").bind("Falcons"),
            ResultMode::AffectedCount,
        )
        .unwrap();
    assert_eq!(result, ExecutionResult::Affected(1));
    assert_eq!(team_count(&manager), before + 1);

    // Durable: visible to an unrelated connection.
    let outside: String = rusqlite::Connection::open(&path)
        .unwrap()
        .query_row("SELECT TeamName FROM TEAMS WHERE TeamID = 3", [], |r| r.get(0))
        .unwrap();
    assert_eq!(outside, "Falcons");
}

#[test]
fn test_update_reports_exact_affected_count() {
    let (_dir, path) = teams_store();
    let manager = manager(&path);
    let affected = manager
        .execute_write(&Statement::new("UPDATE TEAMS SET TeamName = TeamName || ' FC'"))
        .unwrap();
    assert_eq!(affected, 2);

    let none = manager
        .execute_write(&Statement::new("DELETE FROM TEAMS WHERE TeamID = ?").bind(99))
        .unwrap();
    assert_eq!(none, 0);
}

#[test]
fn test_thousand_executes_leak_nothing() {
    let (_dir, path) = teams_store();
    let manager = manager(&path);

    for i in 0..1000 {
        let rows = manager
            .execute(
                &Statement::new("SELECT TeamName FROM TEAMS WHERE TeamID = ?").bind(i % 2 + 1),
                ResultMode::Rows,
            )
            .unwrap()
            .into_rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(manager.open_handles(), 0);
    }
}

#[test]
fn test_failed_statement_rolls_back() {
    let (_dir, path) = teams_store();
    let manager = manager(&path);

    let err = manager
        .execute(
            &Statement::new("UPDATE TEAMS SET TeamName = 'Ghosts' WHERE NoSuchColumn = 1"),
            ResultMode::AffectedCount,
        )
        .unwrap_err();
    assert!(err.is_query());
    assert!(err.to_string().contains("no such column"));
    assert_eq!(manager.open_handles(), 0);

    // A batch whose second statement fails leaves nothing behind.
    let err = manager
        .execute_many(
            &Statement::new("INSERT INTO TEAMS (TeamName) VALUES (?)"),
            &[vec![Value::from("Falcons")], vec![Value::Null]],
        )
        .unwrap_err();
    assert!(err.is_query());
    assert!(err.to_string().contains("NOT NULL"));

    let names: Vec<String> = manager
        .query(&Statement::new("SELECT TeamName FROM TEAMS ORDER BY TeamID"))
        .unwrap()
        .iter()
        .map(|r| r.get(0).unwrap())
        .collect();
    assert_eq!(names, vec!["Eagles".to_string(), "Hawks".to_string()]);
}

#[test]
fn test_insert_falcons_increments_count_by_one() {
    let (_dir, path) = teams_store();
    let manager = manager(&path);
    let before = team_count(&manager);

    let affected = manager
        .execute(
            &Statement::with_params("INSERT INTO TEAMS (TeamName) VALUES (?)", ["Falcons"]),
            ResultMode::from_expect_rows(false),
        )
        .unwrap()
        .affected();
    assert_eq!(affected, Some(1));
    assert_eq!(team_count(&manager), before + 1);
}

#[test]
fn test_manager_is_shared_across_threads() {
    let (_dir, path) = teams_store();
    let manager = Arc::new(manager(&path));

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let manager = Arc::clone(&manager);
            std::thread::spawn(move || {
                for _ in 0..25 {
                    let rows = manager
                        .query(&Statement::new("SELECT TeamID FROM TEAMS"))
                        .unwrap();
                    assert_eq!(rows.len(), 2);
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(manager.open_handles(), 0);
}
