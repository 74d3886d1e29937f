//! # kvlite
//!
//! A minimal persistent key-value store with:
//! - SQLite as the durable backing engine (one `store` table)
//! - Relaxed fsync for throughput, traded against power-loss durability
//! - One lock per store instance serializing all operations
//! - Opt-in atomic read-modify-write for callers that need it
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Caller threads (Arc<Store>)                 │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ put / get / delete / update / close
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                 Store lock (parking_lot::Mutex)              │
//! │                 one operation at a time                      │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │              rusqlite::Connection (autocommit)               │
//! │          store(key TEXT PRIMARY KEY, value TEXT)             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Write skew
//!
//! Plain `get` followed by `put` is two separate critical sections. Two
//! callers (or two stores on one file) can both read the same value and
//! both write; the last commit wins and nobody is told. This is accepted
//! behavior. [`Store::update`] closes the gap for callers that ask for it.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;
pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{KvError, Result};
pub use config::{Config, JournalMode, Location, SyncMode};
pub use store::Store;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of kvlite
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
