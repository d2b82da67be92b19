//! Benchmarks for store operations.

use std::hint::black_box;

use clubstore_store::{ConnectionManager, ResultMode, Statement, StoreConfig, Value};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

/// Create a store with `teams` rows in TEAMS.
fn setup_store(teams: usize) -> (ConnectionManager, tempfile::TempDir) {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("club.db");

    let conn = rusqlite::Connection::open(&path).unwrap();
    conn.execute_batch("CREATE TABLE TEAMS (TeamID INTEGER PRIMARY KEY, TeamName TEXT NOT NULL)")
        .unwrap();
    for i in 0..teams {
        conn.execute("INSERT INTO TEAMS (TeamName) VALUES (?1)", [format!("Team {}", i)])
            .unwrap();
    }
    drop(conn);

    let manager = ConnectionManager::new(StoreConfig::file(&path)).unwrap();
    (manager, temp_dir)
}

/// Full open, query, rollback and release cycle.
fn bench_read(c: &mut Criterion) {
    let (manager, _dir) = setup_store(100);
    let statement = Statement::new("SELECT TeamID, TeamName FROM TEAMS WHERE TeamID = ?").bind(42);

    c.bench_function("read_single_row", |b| {
        b.iter(|| {
            let rows = manager.query(black_box(&statement)).unwrap();
            black_box(rows)
        })
    });
}

/// Open, execute, commit and release.
fn bench_write(c: &mut Criterion) {
    let (manager, _dir) = setup_store(0);
    let statement = Statement::new("INSERT INTO TEAMS (TeamName) VALUES (?)").bind("Falcons");

    c.bench_function("write_single_row", |b| {
        b.iter(|| {
            manager
                .execute(black_box(&statement), ResultMode::AffectedCount)
                .unwrap()
        })
    });
}

/// One transaction per batch, varying batch size.
fn bench_execute_many(c: &mut Criterion) {
    let mut group = c.benchmark_group("execute_many");

    let insert = Statement::new("INSERT INTO TEAMS (TeamName) VALUES (?)");

    for size in [10, 100, 1000] {
        let (manager, _dir) = setup_store(0);
        let params: Vec<Vec<Value>> = (0..size)
            .map(|i| vec![Value::from(format!("Team {}", i))])
            .collect();

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &params, |b, params| {
            b.iter(|| {
                manager
                    .execute_many(&insert, black_box(params))
                    .unwrap()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_read, bench_write, bench_execute_many);
criterion_main!(benches);
