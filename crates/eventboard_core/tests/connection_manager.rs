use eventboard_core::db::{open_db_in_memory, DbError};
use eventboard_core::{ConnectionError, ConnectionManager, ConnectionState, DbHandle};
use rusqlite::Connection;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

const CALLERS: usize = 16;
const SLOW_CONNECT: Duration = Duration::from_millis(250);

/// Connector that counts attempts and stays in flight long enough for every
/// caller to pile up behind the first one.
fn counting_connector(
    attempts: Arc<AtomicUsize>,
    succeed: bool,
) -> impl Fn(&str) -> Result<Connection, DbError> + Send + Sync + 'static {
    move |_: &str| {
        attempts.fetch_add(1, Ordering::SeqCst);
        thread::sleep(SLOW_CONNECT);
        if succeed {
            open_db_in_memory()
        } else {
            Err(DbError::UnsupportedSchemaVersion {
                db_version: 99,
                latest_supported: 2,
            })
        }
    }
}

fn spawn_callers(
    manager: &Arc<ConnectionManager>,
) -> Vec<thread::Result<Result<DbHandle, ConnectionError>>> {
    let barrier = Arc::new(Barrier::new(CALLERS));
    let workers: Vec<_> = (0..CALLERS)
        .map(|_| {
            let manager = Arc::clone(manager);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                manager.get_connection()
            })
        })
        .collect();

    workers.into_iter().map(|worker| worker.join()).collect()
}

fn call_concurrently(manager: &Arc<ConnectionManager>) -> Vec<Result<DbHandle, ConnectionError>> {
    spawn_callers(manager)
        .into_iter()
        .map(|joined| joined.expect("worker should not panic"))
        .collect()
}

#[test]
fn concurrent_first_calls_share_one_attempt_and_one_handle() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let manager = Arc::new(ConnectionManager::new(
        ":memory:",
        counting_connector(Arc::clone(&attempts), true),
    ));

    let results = call_concurrently(&manager);

    assert_eq!(attempts.load(Ordering::SeqCst), 1);
    let handles: Vec<DbHandle> = results
        .into_iter()
        .map(|result| result.expect("every caller should connect"))
        .collect();
    assert!(handles
        .iter()
        .all(|handle| handle.same_connection(&handles[0])));
    assert_eq!(manager.state(), ConnectionState::Connected);

    let again = manager.get_connection().unwrap();
    assert!(again.same_connection(&handles[0]));
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}

#[test]
fn concurrent_first_calls_share_one_failure_then_retry_fresh() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let manager = Arc::new(ConnectionManager::new(
        "unreachable.db",
        counting_connector(Arc::clone(&attempts), false),
    ));

    let results = call_concurrently(&manager);

    assert_eq!(attempts.load(Ordering::SeqCst), 1);
    for result in results {
        match result {
            Err(ConnectionError::Failed { address, source }) => {
                assert_eq!(address, "unreachable.db");
                assert!(matches!(
                    *source,
                    DbError::UnsupportedSchemaVersion { db_version: 99, .. }
                ));
            }
            other => panic!("expected shared failure, got {other:?}"),
        }
    }
    assert_eq!(manager.state(), ConnectionState::Unconnected);

    manager
        .get_connection()
        .expect_err("next call should start a fresh attempt");
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[test]
fn waiters_are_released_when_the_connector_panics() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&attempts);
    let manager = Arc::new(ConnectionManager::new(
        "crashing.db",
        move |_: &str| -> Result<Connection, DbError> {
            counter.fetch_add(1, Ordering::SeqCst);
            thread::sleep(SLOW_CONNECT);
            panic!("connector crashed mid-handshake");
        },
    ));

    let results = spawn_callers(&manager);

    assert_eq!(attempts.load(Ordering::SeqCst), 1);
    let panicked = results.iter().filter(|joined| joined.is_err()).count();
    assert_eq!(panicked, 1, "only the thread running the connector unwinds");
    for joined in results.into_iter().flatten() {
        match joined {
            Err(ConnectionError::Aborted { address }) => assert_eq!(address, "crashing.db"),
            other => panic!("expected aborted attempt, got {other:?}"),
        }
    }
    assert_eq!(manager.state(), ConnectionState::Unconnected);
}

#[test]
fn recovers_after_a_failed_attempt() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&attempts);
    let manager = ConnectionManager::new(":memory:", move |_: &str| {
        if counter.fetch_add(1, Ordering::SeqCst) == 0 {
            Err(DbError::UnsupportedSchemaVersion {
                db_version: 3,
                latest_supported: 2,
            })
        } else {
            open_db_in_memory()
        }
    });

    assert!(manager.get_connection().is_err());
    let handle = manager.get_connection().expect("second attempt should connect");
    assert!(handle.same_connection(&manager.get_connection().unwrap()));
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[test]
fn sqlite_manager_opens_file_database_lazily() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lazy.db");
    let manager = ConnectionManager::sqlite(path.to_str().unwrap());

    assert!(!path.exists());
    let handle = manager.get_connection().unwrap();
    assert!(path.exists());

    let tables: i64 = handle.with_conn(|conn| {
        conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('events', 'bookings');",
            [],
            |row| row.get(0),
        )
        .unwrap()
    });
    assert_eq!(tables, 2);
}
