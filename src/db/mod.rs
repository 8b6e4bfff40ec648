pub mod pool;
pub mod sqlite;
pub mod repository;

pub use pool::*;
pub use sqlite::*;
pub use repository::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },

    #[error("Migration failed at version {version}: {reason}")]
    MigrationFailed { version: i64, reason: String },

    #[error("Constraint violated: {0}")]
    ConstraintViolation(String),

    #[error("Connection pool is closed")]
    PoolClosed,
}

impl DatabaseError {
    /// True when the failing statement referenced a table that does not exist.
    ///
    /// Access-control strategies treat this as "privilege source unavailable"
    /// rather than an infrastructure failure.
    pub fn is_missing_table(&self) -> bool {
        match self {
            DatabaseError::Sqlite(rusqlite::Error::SqliteFailure(_, Some(msg))) => {
                msg.starts_with("no such table")
            }
            _ => false,
        }
    }
}
