//! Domain error types
//!
//! These errors are framework-agnostic and represent business-level failures.
//! The HTTP mapping lives in `api::error`.

use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    /// Referenced entity is absent
    #[error("{0}")]
    NotFound(&'static str),
    /// Uniqueness violation
    #[error("{0}")]
    Conflict(String),
    /// Bulk create accepted nothing; carries the aggregate rejection messages
    #[error("No students were created")]
    BulkRejected(Vec<String>),
    /// Malformed or out-of-range input, rejected before storage access
    #[error("{0}")]
    Validation(String),
    /// Missing or incorrect credential
    #[error("Invalid or missing API key")]
    Unauthorized,
    /// Database/persistence error
    #[error("Database error: {0}")]
    Database(String),
}

// Unique-constraint failures surface as conflicts; everything else is a storage failure.
impl From<DbErr> for DomainError {
    fn from(e: DbErr) -> Self {
        match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                DomainError::Conflict("Email already exists".to_string())
            }
            _ => DomainError::Database(e.to_string()),
        }
    }
}
