//! Connection owner and transaction handles.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections and run the reachability
//!   check plus schema bootstrap before returning a usable store.
//! - Serialize access to the single connection across threads.
//! - Issue `StoreTransaction` handles and validate them on use.
//!
//! # Invariants
//! - A live `StoreTransaction` owns the connection lock; statements issued
//!   through it run in program order and commit or roll back together.
//! - A transaction dropped without `commit`/`rollback` is rolled back.
//! - A thread holding a `StoreTransaction` gets `InvalidTransaction` for
//!   ambient statements and nested `begin` calls on the same store instead
//!   of blocking on its own lock.

use super::schema::{create_tables, TABLES};
use super::{StoreError, StoreResult};
use log::{debug, error, info, warn};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

/// Default wait applied when the database file is locked by another process.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Tunables applied to every opened connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    /// How long SQLite waits on a locked database before failing.
    pub busy_timeout: Duration,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }
}

/// Shared SQLite storage engine.
///
/// `Store` is `Send + Sync`; share it behind an `Arc` and call it from any
/// thread.
pub struct Store {
    conn: Mutex<Connection>,
    /// Thread owning the open transaction, if any.
    holder: Mutex<Option<ThreadId>>,
    mode: &'static str,
}

/// Execution context for one storage statement.
#[derive(Clone, Copy)]
pub enum ExecScope<'a> {
    /// Run directly on the store's connection in autocommit mode.
    Ambient,
    /// Run inside the given transaction.
    Within(&'a StoreTransaction<'a>),
}

impl<'a> From<&'a StoreTransaction<'a>> for ExecScope<'a> {
    fn from(tx: &'a StoreTransaction<'a>) -> Self {
        Self::Within(tx)
    }
}

/// Open transaction on a `Store`.
///
/// Created by `Store::begin`, finished by `Store::commit` or
/// `Store::rollback`.
pub struct StoreTransaction<'s> {
    owner: &'s Store,
    conn: MutexGuard<'s, Connection>,
    active: bool,
}

impl Store {
    /// Opens (or creates) a SQLite database file with default options.
    ///
    /// # Errors
    /// - `StoreError::Connection` when the file cannot be opened, the
    ///   reachability check fails, or tables cannot be created.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::open_with(path, StoreOptions::default())
    }

    /// Opens (or creates) a SQLite database file.
    ///
    /// # Side effects
    /// - Creates the file when absent; never creates parent directories.
    /// - Emits `db_open` logging events with duration and status.
    pub fn open_with(path: impl AsRef<Path>, options: StoreOptions) -> StoreResult<Self> {
        let started_at = Instant::now();
        info!("event=db_open module=db status=start mode=file");

        match Connection::open(path) {
            Ok(conn) => Self::bootstrap(conn, options, "file", started_at),
            Err(err) => {
                error!(
                    "event=db_open module=db status=error mode=file duration_ms={} error_code=db_open_failed error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(StoreError::Connection(err))
            }
        }
    }

    /// Opens a private in-memory database with default options.
    pub fn open_in_memory() -> StoreResult<Self> {
        let started_at = Instant::now();
        info!("event=db_open module=db status=start mode=memory");

        match Connection::open_in_memory() {
            Ok(conn) => Self::bootstrap(conn, StoreOptions::default(), "memory", started_at),
            Err(err) => {
                error!(
                    "event=db_open module=db status=error mode=memory duration_ms={} error_code=db_open_failed error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(StoreError::Connection(err))
            }
        }
    }

    fn bootstrap(
        conn: Connection,
        options: StoreOptions,
        mode: &'static str,
        started_at: Instant,
    ) -> StoreResult<Self> {
        let result = configure_connection(&conn, &options)
            .and_then(|()| ping_connection(&conn))
            .and_then(|()| create_tables(&conn));

        match result {
            Ok(()) => {
                info!(
                    "event=db_open module=db status=ok mode={} duration_ms={} tables={}",
                    mode,
                    started_at.elapsed().as_millis(),
                    TABLES.join(",")
                );
                Ok(Self {
                    conn: Mutex::new(conn),
                    holder: Mutex::new(None),
                    mode,
                })
            }
            Err(err) => {
                error!(
                    "event=db_open module=db status=error mode={} duration_ms={} error_code=db_bootstrap_failed error={}",
                    mode,
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(StoreError::Connection(err))
            }
        }
    }

    /// Verifies the backend still answers a trivial query.
    ///
    /// # Errors
    /// - `StoreError::InvalidTransaction` when called by the thread holding
    ///   an open transaction.
    /// - `StoreError::Connection` when the query fails.
    pub fn ping(&self) -> StoreResult<()> {
        let conn = self.lock_ambient()?;
        ping_connection(&conn).map_err(StoreError::Connection)
    }

    /// Creates the catalog tables when absent.
    ///
    /// Runs automatically on open; exposed so callers can repeat it inside
    /// their own transaction.
    pub fn ensure_schema(&self, scope: ExecScope<'_>) -> StoreResult<()> {
        self.run(scope, |conn| Ok(create_tables(conn)?))
    }

    /// Starts an immediate (write-locking) transaction.
    ///
    /// Blocks until no other transaction or ambient statement holds the
    /// connection.
    ///
    /// # Errors
    /// - `StoreError::InvalidTransaction` when this thread already holds a
    ///   transaction on this store.
    /// - `StoreError::Transaction` when SQLite refuses `BEGIN`.
    pub fn begin(&self) -> StoreResult<StoreTransaction<'_>> {
        let conn = self.lock_ambient()?;
        if let Err(err) = conn.execute_batch("BEGIN IMMEDIATE;") {
            error!(
                "event=tx_begin module=db status=error mode={} error={}",
                self.mode, err
            );
            return Err(StoreError::Transaction(err));
        }
        self.set_holder(Some(thread::current().id()));
        debug!("event=tx_begin module=db status=ok mode={}", self.mode);

        Ok(StoreTransaction {
            owner: self,
            conn,
            active: true,
        })
    }

    /// Commits a transaction begun on this store.
    ///
    /// # Errors
    /// - `StoreError::InvalidTransaction` for a foreign or inactive handle.
    /// - `StoreError::Transaction` when `COMMIT` fails; the handle is then
    ///   rolled back on drop.
    pub fn commit(&self, tx: StoreTransaction<'_>) -> StoreResult<()> {
        self.finish(tx, "COMMIT;", "tx_commit")
    }

    /// Rolls back a transaction begun on this store.
    ///
    /// # Errors
    /// - `StoreError::InvalidTransaction` for a foreign or inactive handle.
    /// - `StoreError::Transaction` when `ROLLBACK` fails.
    pub fn rollback(&self, tx: StoreTransaction<'_>) -> StoreResult<()> {
        self.finish(tx, "ROLLBACK;", "tx_rollback")
    }

    /// Closes the underlying connection.
    ///
    /// # Errors
    /// - `StoreError::Close` when SQLite reports a failure while closing.
    pub fn close(self) -> StoreResult<()> {
        let mode = self.mode;
        let conn = self.conn.into_inner().unwrap_or_else(PoisonError::into_inner);
        match conn.close() {
            Ok(()) => {
                info!("event=db_close module=db status=ok mode={mode}");
                Ok(())
            }
            Err((_conn, err)) => {
                error!("event=db_close module=db status=error mode={mode} error={err}");
                Err(StoreError::Close(err))
            }
        }
    }

    /// Runs `f` against the connection selected by `scope`.
    pub(crate) fn run<T>(
        &self,
        scope: ExecScope<'_>,
        f: impl FnOnce(&Connection) -> StoreResult<T>,
    ) -> StoreResult<T> {
        match scope {
            ExecScope::Ambient => {
                let conn = self.lock_ambient()?;
                f(&conn)
            }
            ExecScope::Within(tx) => {
                self.check_handle(tx)?;
                f(&tx.conn)
            }
        }
    }

    fn finish(
        &self,
        mut tx: StoreTransaction<'_>,
        sql: &str,
        event: &'static str,
    ) -> StoreResult<()> {
        self.check_handle(&tx)?;
        match tx.conn.execute_batch(sql) {
            Ok(()) => {
                tx.active = false;
                debug!("event={} module=db status=ok mode={}", event, self.mode);
                Ok(())
            }
            Err(err) => {
                error!(
                    "event={} module=db status=error mode={} error={}",
                    event, self.mode, err
                );
                Err(StoreError::Transaction(err))
            }
        }
    }

    fn check_handle(&self, tx: &StoreTransaction<'_>) -> StoreResult<()> {
        if !std::ptr::eq(tx.owner, self) {
            return Err(StoreError::InvalidTransaction(
                "transaction belongs to a different store",
            ));
        }
        if !tx.active || tx.conn.is_autocommit() {
            return Err(StoreError::InvalidTransaction(
                "transaction is no longer active",
            ));
        }
        Ok(())
    }

    /// Locks the connection for a statement outside any transaction.
    fn lock_ambient(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        if self.holder() == Some(thread::current().id()) {
            warn!(
                "event=db_lock module=db status=rejected mode={} reason=thread_holds_transaction",
                self.mode
            );
            return Err(StoreError::InvalidTransaction(
                "ambient statement while this thread holds a transaction",
            ));
        }
        Ok(self.lock())
    }

    fn holder(&self) -> Option<ThreadId> {
        *self.holder.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_holder(&self, holder: Option<ThreadId>) {
        *self.holder.lock().unwrap_or_else(PoisonError::into_inner) = holder;
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        match self.conn.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("event=db_lock module=db status=recovered reason=poisoned");
                poisoned.into_inner()
            }
        }
    }
}

impl Drop for StoreTransaction<'_> {
    fn drop(&mut self) {
        self.owner.set_holder(None);
        if !self.active || self.conn.is_autocommit() {
            return;
        }
        match self.conn.execute_batch("ROLLBACK;") {
            Ok(()) => debug!("event=tx_rollback module=db status=ok reason=dropped"),
            Err(err) => warn!("event=tx_rollback module=db status=error reason=dropped error={err}"),
        }
    }
}

fn configure_connection(conn: &Connection, options: &StoreOptions) -> rusqlite::Result<()> {
    conn.busy_timeout(options.busy_timeout)
}

fn ping_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.query_row("SELECT 1;", [], |row| row.get::<_, i64>(0))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{ExecScope, Store};
    use crate::db::StoreError;

    #[test]
    fn handle_finished_behind_the_store_is_rejected() {
        let store = Store::open_in_memory().unwrap();
        let tx = store.begin().unwrap();
        tx.conn.execute_batch("COMMIT;").unwrap();

        let err = store.ensure_schema(ExecScope::Within(&tx)).unwrap_err();
        assert!(matches!(err, StoreError::InvalidTransaction(_)));

        let err = store.commit(tx).unwrap_err();
        assert!(matches!(err, StoreError::InvalidTransaction(_)));
    }

    #[test]
    fn nested_begin_on_the_same_thread_is_rejected() {
        let store = Store::open_in_memory().unwrap();
        let tx = store.begin().unwrap();

        let err = store.begin().err().expect("nested begin should fail");
        assert!(matches!(err, StoreError::InvalidTransaction(_)));
        let err = store.ping().unwrap_err();
        assert!(matches!(err, StoreError::InvalidTransaction(_)));

        store.rollback(tx).unwrap();
        store.ping().unwrap();
        let tx = store.begin().unwrap();
        store.commit(tx).unwrap();
    }

    #[test]
    fn store_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Store>();
    }
}
