//! Error taxonomy for the hospital management core.
//!
//! Every operation failure is recoverable: the menu layer reports the
//! message and returns to its loop.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, HospitalError>;

#[derive(Debug, Error)]
pub enum HospitalError {
    /// Primary-key lookup missed where the operation requires the row.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// A foreign-key target does not exist; nothing was written.
    #[error("invalid reference: {field} {id} does not exist")]
    InvalidReference { field: &'static str, id: i64 },

    /// A state-machine precondition was violated (occupied bed, illegal
    /// appointment transition).
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Storage-layer uniqueness / NOT NULL / foreign-key failure, or a
    /// restrict-delete with dependent rows.
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    /// Malformed input value; the caller should re-prompt.
    #[error("validation error: {0}")]
    Validation(String),

    /// Unexpected storage fault.
    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for HospitalError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            use sqlx::error::ErrorKind;
            match db.kind() {
                ErrorKind::UniqueViolation
                | ErrorKind::ForeignKeyViolation
                | ErrorKind::NotNullViolation
                | ErrorKind::CheckViolation => {
                    return HospitalError::ConstraintViolation(db.message().to_string());
                }
                _ => {}
            }
        }
        HospitalError::Database(err)
    }
}
