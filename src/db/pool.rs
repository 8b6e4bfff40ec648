//! Bounded SQLite connection pool.
//!
//! Capacity is enforced by a tokio `Semaphore`: `acquire()` waits for a
//! permit, then reuses an idle connection or opens a new one. The
//! connection goes back to the idle stack when the guard drops, on every
//! exit path. Uncommitted transactions are rolled back by rusqlite before
//! that happens, so idle connections never carry open transactions.

use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use super::sqlite::{open_connection, open_database};
use super::DatabaseError;

/// Shared handle to the pool. Cheap to clone.
#[derive(Clone)]
pub struct DbPool {
    inner: Arc<PoolInner>,
}

struct PoolInner {
    path: PathBuf,
    capacity: usize,
    idle: Mutex<Vec<Connection>>,
    permits: Arc<Semaphore>,
}

impl DbPool {
    /// Open the database at `path`, run migrations once, and build a pool
    /// that hands out at most `capacity` connections at a time.
    pub fn open(path: &Path, capacity: usize) -> Result<Self, DatabaseError> {
        let capacity = capacity.max(1);
        let first = open_database(path)?;
        tracing::info!(path = %path.display(), capacity, "Database pool ready");
        Ok(Self {
            inner: Arc::new(PoolInner {
                path: path.to_path_buf(),
                capacity,
                idle: Mutex::new(vec![first]),
                permits: Arc::new(Semaphore::new(capacity)),
            }),
        })
    }

    /// Wait for a free slot and return a scoped connection.
    pub async fn acquire(&self) -> Result<PooledConnection, DatabaseError> {
        let permit = self
            .inner
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| DatabaseError::PoolClosed)?;

        let reused = self
            .inner
            .idle
            .lock()
            .ok()
            .and_then(|mut idle| idle.pop());

        let conn = match reused {
            Some(conn) => conn,
            None => open_connection(&self.inner.path)?,
        };

        Ok(PooledConnection {
            conn: Some(conn),
            pool: Arc::clone(&self.inner),
            _permit: permit,
        })
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Connections currently checked out.
    pub fn in_use(&self) -> usize {
        self.inner.capacity - self.inner.permits.available_permits()
    }

    /// Stop handing out connections. Pending and future `acquire` calls fail.
    pub fn close(&self) {
        self.inner.permits.close();
        if let Ok(mut idle) = self.inner.idle.lock() {
            idle.clear();
        }
    }
}

/// A connection checked out of the pool.
pub struct PooledConnection {
    conn: Option<Connection>,
    pool: Arc<PoolInner>,
    _permit: OwnedSemaphorePermit,
}

impl Deref for PooledConnection {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        self.conn.as_ref().expect("connection present until drop")
    }
}

impl DerefMut for PooledConnection {
    fn deref_mut(&mut self) -> &mut Connection {
        self.conn.as_mut().expect("connection present until drop")
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            if self.pool.permits.is_closed() {
                return;
            }
            if let Ok(mut idle) = self.pool.idle.lock() {
                idle.push(conn);
            }
        }
    }
}
