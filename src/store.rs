//! Store Module
//!
//! The key-value store: one SQLite connection behind one lock.
//!
//! ## Responsibilities
//! - Create the single-table schema on open
//! - Apply the durability trade-off (relaxed fsync) to the engine
//! - Serialize every operation on the instance through its lock
//! - Surface use-after-close as an error instead of touching the engine

use std::path::Path;

use parking_lot::{Mutex, MutexGuard};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

use crate::config::{Config, Location};
use crate::error::{KvError, Result};

/// A persistent string-to-string map
///
/// ## Concurrency Model: one lock per instance
///
/// - Every public method takes `conn` before touching SQLite, so operations
///   on one instance never overlap. Effects land in lock-acquisition order.
/// - The guard is dropped on every return path, including errors.
/// - The lock protects the connection handle only. A caller doing `get`
///   then `put` holds the lock twice, not across the gap, so a second
///   writer (another thread, or another `Store` on the same file) can commit
///   in between and the later commit wins. Use [`Store::update`] when that
///   matters.
///
/// `None` inside the mutex means the store has been closed.
pub struct Store {
    /// Store configuration
    config: Config,

    /// The SQLite connection, exclusively owned by this instance
    conn: Mutex<Option<Connection>>,
}

impl Store {
    const CREATE_TABLE: &'static str =
        "CREATE TABLE IF NOT EXISTS store (key TEXT PRIMARY KEY, value TEXT)";
    const SELECT: &'static str = "SELECT value FROM store WHERE key = ?1";
    const UPSERT: &'static str = "INSERT INTO store (key, value) VALUES (?1, ?2) \
         ON CONFLICT(key) DO UPDATE SET value = excluded.value";
    const DELETE: &'static str = "DELETE FROM store WHERE key = ?1";

    /// Open or create a store with the given config
    ///
    /// On open:
    /// 1. Connect to the location (missing directories are not created)
    /// 2. Set busy timeout, journal mode and sync mode
    /// 3. Create the table if it does not exist
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;

        let open_err = |source| KvError::Open {
            location: config.location.to_string(),
            source,
        };

        let conn = match &config.location {
            Location::InMemory => Connection::open_in_memory(),
            Location::File(path) => Connection::open(path),
        }
        .map_err(open_err)?;

        conn.busy_timeout(config.busy_timeout).map_err(open_err)?;

        // SQLite answers with the mode actually in effect ("memory" for
        // in-memory databases)
        let journal_mode: String = conn
            .pragma_update_and_check(None, "journal_mode", config.journal_mode.as_pragma(), |row| {
                row.get(0)
            })
            .map_err(open_err)?;

        conn.pragma_update(None, "synchronous", config.synchronous.as_pragma())
            .map_err(open_err)?;

        conn.execute(Self::CREATE_TABLE, []).map_err(open_err)?;

        tracing::debug!(
            "Opened store at {} (journal_mode={}, synchronous={:?})",
            config.location,
            journal_mode,
            config.synchronous
        );

        Ok(Self {
            config,
            conn: Mutex::new(Some(conn)),
        })
    }

    /// Open a durable store at `path` with default settings
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::open(Config::builder().path(path.as_ref()).build())
    }

    /// Open a transient store with default settings
    pub fn open_in_memory() -> Result<Self> {
        Self::open(Config::default())
    }

    /// Insert `key` or replace its value
    pub fn put(&self, key: &str, value: &str) -> Result<()> {
        self.with_conn(|conn| {
            tracing::trace!("put key={} ({} bytes)", key, value.len());
            Self::upsert(conn, key, value).map_err(KvError::Write)
        })
    }

    /// Get the value for `key`, `None` if absent
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        self.with_conn(|conn| {
            tracing::trace!("get key={}", key);
            Self::select(conn, key).map_err(KvError::Read)
        })
    }

    /// Delete `key`; deleting an absent key is not an error
    pub fn delete(&self, key: &str) -> Result<()> {
        self.with_conn(|conn| {
            tracing::trace!("delete key={}", key);
            Self::remove(conn, key).map_err(KvError::Write)
        })
    }

    /// Atomic read-modify-write of one key
    ///
    /// Runs in an `IMMEDIATE` transaction, which takes the database write
    /// lock before reading. No other handle on the same file can commit
    /// between the read and the write, so concurrent `update`s never lose
    /// each other's changes.
    ///
    /// `f` receives the current value and returns the new one; returning
    /// `None` deletes the key. The instance lock is held while `f` runs,
    /// so `f` must not call back into this store.
    pub fn update<F>(&self, key: &str, f: F) -> Result<Option<String>>
    where
        F: FnOnce(Option<&str>) -> Option<String>,
    {
        self.with_conn(|conn| {
            tracing::trace!("update key={}", key);

            // Dropping `tx` without commit rolls back
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(KvError::Write)?;

            let current = Self::select(&tx, key).map_err(KvError::Read)?;
            let next = f(current.as_deref());

            match &next {
                Some(value) => Self::upsert(&tx, key, value),
                None => Self::remove(&tx, key),
            }
            .map_err(KvError::Write)?;

            tx.commit().map_err(KvError::Write)?;
            Ok(next)
        })
    }

    /// Close the store, releasing the connection
    ///
    /// Every later call, including another `close`, fails with
    /// [`KvError::Closed`]. If SQLite refuses to close cleanly the
    /// connection is still dropped and the error is returned.
    pub fn close(&self) -> Result<()> {
        let conn = self.lock()?.take().ok_or(KvError::Closed)?;

        conn.close().map_err(|(_conn, e)| {
            tracing::warn!("Error closing store at {}: {}", self.config.location, e);
            KvError::Write(e)
        })?;

        tracing::debug!("Closed store at {}", self.config.location);
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Get the backing location
    pub fn location(&self) -> &Location {
        &self.config.location
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Whether `close` has been called
    pub fn is_closed(&self) -> bool {
        self.conn.lock().is_none()
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Acquire the instance lock, honouring `lock_timeout`
    fn lock(&self) -> Result<MutexGuard<'_, Option<Connection>>> {
        match self.config.lock_timeout {
            None => Ok(self.conn.lock()),
            Some(timeout) => self.conn.try_lock_for(timeout).ok_or_else(|| {
                tracing::warn!("Lock wait on {} exceeded {:?}", self.config.location, timeout);
                KvError::LockTimeout(timeout)
            }),
        }
    }

    /// Run `f` on the open connection with the lock held
    fn with_conn<T>(&self, f: impl FnOnce(&mut Connection) -> Result<T>) -> Result<T> {
        let mut guard = self.lock()?;
        let conn = guard.as_mut().ok_or(KvError::Closed)?;
        f(conn)
    }

    /// A NULL value column reads as absent
    fn select(conn: &Connection, key: &str) -> rusqlite::Result<Option<String>> {
        let value: Option<Option<String>> = conn
            .query_row(Self::SELECT, params![key], |row| row.get(0))
            .optional()?;
        Ok(value.flatten())
    }

    fn upsert(conn: &Connection, key: &str, value: &str) -> rusqlite::Result<()> {
        conn.execute(Self::UPSERT, params![key, value])?;
        Ok(())
    }

    fn remove(conn: &Connection, key: &str) -> rusqlite::Result<()> {
        conn.execute(Self::DELETE, params![key])?;
        Ok(())
    }
}
