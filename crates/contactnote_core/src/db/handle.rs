//! Shared storage handle.
//!
//! # Responsibility
//! - Own the single migrated connection used by every repository.
//! - Serialize units of work issued from different execution contexts.
//!
//! # Invariants
//! - The wrapped connection has migrations applied before the handle exists.
//! - A unit of work holds the lock for its whole duration; multi-statement
//!   consistency inside one unit is the caller's transaction scope.

use super::{open_db, open_db_in_memory, DbError, DbResult};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Cloneable handle to the process storage engine.
///
/// Constructed once at startup and passed into sessions/services.
#[derive(Debug, Clone)]
pub struct StorageHandle {
    conn: Arc<Mutex<Connection>>,
}

impl StorageHandle {
    /// Wraps an already migrated connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Opens (and migrates) a database file.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        open_db(path).map(Self::new)
    }

    /// Opens (and migrates) a private in-memory database.
    pub fn open_in_memory() -> DbResult<Self> {
        open_db_in_memory().map(Self::new)
    }

    /// Runs one unit of work against the shared connection.
    ///
    /// Blocks while another unit holds the connection.
    pub fn with_conn<T, E>(&self, f: impl FnOnce(&Connection) -> Result<T, E>) -> Result<T, E>
    where
        E: From<DbError>,
    {
        let guard = self.conn.lock().map_err(|_| DbError::Poisoned)?;
        f(&guard)
    }
}
