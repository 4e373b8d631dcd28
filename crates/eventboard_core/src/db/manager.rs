//! Process-wide connection lifecycle.
//!
//! # Responsibility
//! - Establish the backing-store connection lazily, on first use.
//! - Share one connection handle with every caller once established.
//!
//! # Invariants
//! - State is exactly one of `Unconnected`, `Connecting`, `Connected`.
//! - At most one connection attempt is outstanding at any time; callers that
//!   arrive while `Connecting` wait on that attempt's shared outcome.
//! - A failed attempt is never cached: state returns to `Unconnected` and
//!   every waiter of that attempt receives the same error.
//! - The manager never closes a connection on its own.

use super::open::open_address;
use super::{DbError, DbResult};
use crate::logging::sanitize_message;
use log::{debug, error, info};
use parking_lot::{Condvar, Mutex};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

const MAX_LOGGED_ERROR_CHARS: usize = 200;

/// Opens a raw connection for a store address.
///
/// Implementations are called at most once per attempt and may block.
pub trait Connector: Send + Sync {
    fn connect(&self, address: &str) -> DbResult<Connection>;
}

impl<F> Connector for F
where
    F: Fn(&str) -> DbResult<Connection> + Send + Sync,
{
    fn connect(&self, address: &str) -> DbResult<Connection> {
        self(address)
    }
}

/// Default connector: opens SQLite at the address and applies migrations.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteConnector;

impl Connector for SqliteConnector {
    fn connect(&self, address: &str) -> DbResult<Connection> {
        open_address(address)
    }
}

/// Shared handle to the live connection.
///
/// Clones refer to the same underlying connection; statement execution is
/// serialized through the handle's lock.
#[derive(Clone)]
pub struct DbHandle {
    conn: Arc<Mutex<Connection>>,
}

impl DbHandle {
    fn new(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Runs `f` with exclusive access to the connection.
    pub fn with_conn<T>(&self, f: impl FnOnce(&mut Connection) -> T) -> T {
        let mut guard = self.conn.lock();
        f(&mut guard)
    }

    /// Returns whether both handles point at the same connection.
    pub fn same_connection(&self, other: &DbHandle) -> bool {
        Arc::ptr_eq(&self.conn, &other.conn)
    }
}

impl Debug for DbHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbHandle")
            .field("ptr", &Arc::as_ptr(&self.conn))
            .finish()
    }
}

/// Failure of one connection attempt, shared by every caller that waited on it.
#[derive(Debug, Clone)]
pub enum ConnectionError {
    /// The connector returned an error.
    Failed {
        address: String,
        source: Arc<DbError>,
    },
    /// The connector panicked before producing an outcome.
    Aborted { address: String },
}

impl Display for ConnectionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Failed { address, source } => {
                write!(f, "failed to connect to `{address}`: {source}")
            }
            Self::Aborted { address } => {
                write!(f, "connection attempt to `{address}` was aborted")
            }
        }
    }
}

impl Error for ConnectionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Failed { source, .. } => Some(source.as_ref()),
            Self::Aborted { .. } => None,
        }
    }
}

/// Observable connection phase, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Unconnected,
    Connecting,
    Connected,
}

type Outcome = Result<DbHandle, ConnectionError>;

enum Phase {
    Unconnected,
    Connecting(Arc<PendingAttempt>),
    Connected(DbHandle),
}

struct PendingAttempt {
    outcome: Mutex<Option<Outcome>>,
    settled: Condvar,
}

impl PendingAttempt {
    fn new() -> Self {
        Self {
            outcome: Mutex::new(None),
            settled: Condvar::new(),
        }
    }

    fn wait(&self) -> Outcome {
        let mut outcome = self.outcome.lock();
        loop {
            if let Some(result) = outcome.as_ref() {
                return result.clone();
            }
            self.settled.wait(&mut outcome);
        }
    }

    fn settle(&self, result: Outcome) {
        *self.outcome.lock() = Some(result);
        self.settled.notify_all();
    }
}

/// Lazily connecting, deduplicating owner of the backing-store connection.
///
/// Construct one per process and share it (`Arc<ConnectionManager>`) with
/// every component that touches storage.
pub struct ConnectionManager {
    address: String,
    connector: Box<dyn Connector>,
    phase: Mutex<Phase>,
    attempts: AtomicU64,
}

impl ConnectionManager {
    /// Creates a manager in the `Unconnected` state. No I/O happens here.
    pub fn new(address: impl Into<String>, connector: impl Connector + 'static) -> Self {
        Self {
            address: address.into(),
            connector: Box::new(connector),
            phase: Mutex::new(Phase::Unconnected),
            attempts: AtomicU64::new(0),
        }
    }

    /// Creates a manager that opens SQLite at `address`.
    pub fn sqlite(address: impl Into<String>) -> Self {
        Self::new(address, SqliteConnector)
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn state(&self) -> ConnectionState {
        match &*self.phase.lock() {
            Phase::Unconnected => ConnectionState::Unconnected,
            Phase::Connecting(_) => ConnectionState::Connecting,
            Phase::Connected(_) => ConnectionState::Connected,
        }
    }

    /// Number of connection attempts started over this manager's lifetime.
    pub fn attempts_started(&self) -> u64 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Returns the shared connection, connecting first if needed.
    ///
    /// # Contract
    /// - `Connected`: returns the cached handle without I/O.
    /// - `Connecting`: blocks until the in-flight attempt settles and returns
    ///   its outcome.
    /// - `Unconnected`: starts one attempt on the calling thread.
    ///
    /// # Errors
    /// - Returns `ConnectionError` when the attempt this call started or waited
    ///   on fails. The next call starts a fresh attempt.
    pub fn get_connection(&self) -> Result<DbHandle, ConnectionError> {
        let mut phase = self.phase.lock();
        let in_flight = match &*phase {
            Phase::Connected(handle) => return Ok(handle.clone()),
            Phase::Connecting(pending) => Some(Arc::clone(pending)),
            Phase::Unconnected => None,
        };

        if let Some(pending) = in_flight {
            drop(phase);
            debug!("event=db_connect module=db status=wait");
            return pending.wait();
        }

        let pending = Arc::new(PendingAttempt::new());
        *phase = Phase::Connecting(Arc::clone(&pending));
        drop(phase);
        self.run_attempt(&pending)
    }

    /// Drops the cached connection and returns to `Unconnected`.
    ///
    /// Returns `false` when no connection was established. An in-flight
    /// attempt is left alone. Handles already given out stay usable until
    /// they are dropped.
    pub fn shutdown(&self) -> bool {
        let mut phase = self.phase.lock();
        if !matches!(*phase, Phase::Connected(_)) {
            return false;
        }
        *phase = Phase::Unconnected;
        info!("event=db_shutdown module=db status=ok");
        true
    }

    fn run_attempt(&self, pending: &PendingAttempt) -> Outcome {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        let started_at = Instant::now();
        info!("event=db_connect module=db status=start attempt={attempt}");

        let mut guard = AbortGuard {
            manager: self,
            pending,
            armed: true,
        };
        let outcome = self
            .connector
            .connect(&self.address)
            .map(DbHandle::new)
            .map_err(|err| ConnectionError::Failed {
                address: self.address.clone(),
                source: Arc::new(err),
            });
        guard.armed = false;

        match &outcome {
            Ok(_) => info!(
                "event=db_connect module=db status=ok attempt={} duration_ms={}",
                attempt,
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=db_connect module=db status=error attempt={} duration_ms={} error_code=db_connect_failed error={}",
                attempt,
                started_at.elapsed().as_millis(),
                sanitize_message(&err.to_string(), MAX_LOGGED_ERROR_CHARS)
            ),
        }

        self.settle(pending, outcome.clone());
        outcome
    }

    /// Publishes the phase first so late arrivals never wait on a settled attempt.
    fn settle(&self, pending: &PendingAttempt, outcome: Outcome) {
        {
            let mut phase = self.phase.lock();
            *phase = match &outcome {
                Ok(handle) => Phase::Connected(handle.clone()),
                Err(_) => Phase::Unconnected,
            };
        }
        pending.settle(outcome);
    }
}

impl Debug for ConnectionManager {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("address", &self.address)
            .field("state", &self.state())
            .finish()
    }
}

/// Releases waiters if the connector unwinds.
struct AbortGuard<'a> {
    manager: &'a ConnectionManager,
    pending: &'a PendingAttempt,
    armed: bool,
}

impl Drop for AbortGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            error!("event=db_connect module=db status=error error_code=db_connect_aborted");
            self.manager.settle(
                self.pending,
                Err(ConnectionError::Aborted {
                    address: self.manager.address.clone(),
                }),
            );
        }
    }
}
