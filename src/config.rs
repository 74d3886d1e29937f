//! Configuration for kvlite
//!
//! Centralized configuration with sensible defaults.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{KvError, Result};

/// Where the store keeps its data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// Transient store, gone when the handle is closed
    InMemory,

    /// Durable SQLite file
    File(PathBuf),
}

impl Location {
    /// Whether data survives the handle (file-backed)
    pub fn is_durable(&self) -> bool {
        matches!(self, Location::File(_))
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::InMemory => f.write_str(":memory:"),
            Location::File(path) => write!(f, "{}", path.display()),
        }
    }
}

impl From<&Path> for Location {
    fn from(path: &Path) -> Self {
        Location::File(path.to_path_buf())
    }
}

impl From<PathBuf> for Location {
    fn from(path: PathBuf) -> Self {
        Location::File(path)
    }
}

/// How aggressively SQLite fsyncs (`PRAGMA synchronous`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Hand writes to the OS and move on (fastest, may lose recent
    /// commits on power loss)
    Off,

    /// Sync at critical moments only
    Normal,

    /// Sync on every commit (safest, slowest)
    Full,
}

impl SyncMode {
    pub(crate) fn as_pragma(self) -> &'static str {
        match self {
            SyncMode::Off => "OFF",
            SyncMode::Normal => "NORMAL",
            SyncMode::Full => "FULL",
        }
    }
}

/// SQLite journal mode (`PRAGMA journal_mode`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalMode {
    /// Write-ahead log: many readers alongside one writer
    Wal,

    /// Rollback journal, deleted after each transaction
    Delete,

    /// Rollback journal, truncated after each transaction
    Truncate,
}

impl JournalMode {
    pub(crate) fn as_pragma(self) -> &'static str {
        match self {
            JournalMode::Wal => "WAL",
            JournalMode::Delete => "DELETE",
            JournalMode::Truncate => "TRUNCATE",
        }
    }
}

/// Main configuration for a Store instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Backing location (in-memory or a file path)
    pub location: Location,

    // -------------------------------------------------------------------------
    // Durability Configuration
    // -------------------------------------------------------------------------
    /// fsync behaviour of the backing engine
    pub synchronous: SyncMode,

    /// Journal mode; ignored by SQLite for in-memory stores
    pub journal_mode: JournalMode,

    // -------------------------------------------------------------------------
    // Concurrency Configuration
    // -------------------------------------------------------------------------
    /// How long SQLite waits on a file lock held by another handle
    pub busy_timeout: Duration,

    /// How long a caller waits for this instance's lock.
    /// `None` blocks until the lock is free.
    pub lock_timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            location: Location::InMemory,
            synchronous: SyncMode::Off,
            journal_mode: JournalMode::Wal,
            busy_timeout: Duration::from_secs(5),
            lock_timeout: None,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject settings the store cannot honour
    pub fn validate(&self) -> Result<()> {
        if self.lock_timeout == Some(Duration::ZERO) {
            return Err(KvError::Config("lock_timeout must be non-zero".to_string()));
        }
        if let Location::File(path) = &self.location {
            if path.as_os_str().is_empty() {
                return Err(KvError::Config("file location must not be empty".to_string()));
            }
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Store data in the given file
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.location = Location::File(path.into());
        self
    }

    /// Store data in memory only
    pub fn in_memory(mut self) -> Self {
        self.config.location = Location::InMemory;
        self
    }

    /// Set the backing location directly
    pub fn location(mut self, location: Location) -> Self {
        self.config.location = location;
        self
    }

    /// Set the fsync behaviour
    pub fn synchronous(mut self, mode: SyncMode) -> Self {
        self.config.synchronous = mode;
        self
    }

    /// Set the journal mode
    pub fn journal_mode(mut self, mode: JournalMode) -> Self {
        self.config.journal_mode = mode;
        self
    }

    /// Set the SQLite busy timeout
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.config.busy_timeout = timeout;
        self
    }

    /// Bound the wait for the instance lock
    pub fn lock_timeout(mut self, timeout: Duration) -> Self {
        self.config.lock_timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
