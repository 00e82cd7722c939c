//! Repository Module
//!
//! Free async functions over `&SqlitePool` (or a transaction connection),
//! one module per table group.

// Auth
pub mod user;

// Settings / branches / tables
pub mod branch;
pub mod layout;
pub mod settings;

// Menu
pub mod customer;
pub mod meal;
pub mod menu;
pub mod raw_material;

// Sales
pub mod draft_order;
pub mod numbering;
pub mod payment;
pub mod sales_invoice;

// Back office
pub mod employee;
pub mod expense;
pub mod purchase;
pub mod report;
pub mod salary;

use shared::ErrorCode;
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Domain rule violation carrying a specific error code
    #[error("{1}")]
    Business(ErrorCode, String),
}

impl RepoError {
    pub fn business(code: ErrorCode, msg: impl Into<String>) -> Self {
        RepoError::Business(code, msg.into())
    }
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => RepoError::NotFound("Row not found".into()),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                RepoError::Duplicate(db.message().to_string())
            }
            _ => RepoError::Database(err.to_string()),
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;
