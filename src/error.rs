//! Domain error shared by the clinic workflows.
//!
//! Each variant maps to one class of failure the API reports: bad input,
//! missing entity, illegal state transition, unresolved reference data,
//! or storage failure.

use crate::db::DatabaseError;

#[derive(Debug, thiserror::Error)]
pub enum ClinicError {
    /// Malformed, missing or out-of-range input. Names the field.
    #[error("{0}")]
    Validation(String),

    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The requested state transition is not legal from the current state.
    #[error("{0}")]
    Conflict(String),

    /// A line item references unknown or unavailable catalog data.
    #[error("{0}")]
    Integrity(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl ClinicError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        ClinicError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl From<rusqlite::Error> for ClinicError {
    fn from(err: rusqlite::Error) -> Self {
        ClinicError::Database(DatabaseError::Sqlite(err))
    }
}
