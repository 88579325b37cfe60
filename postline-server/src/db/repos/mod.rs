//! Repository implementations for database access
//!
//! Each repository borrows the pool and maps constraint violations onto
//! `DbError::Conflict` so handlers never check-then-insert.

pub mod posts;
pub mod users;

pub use posts::{Post, PostRepo, PostWithAuthor};
pub use users::{NewUser, User, UserRepo};

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },

    #[error("conflict: {reason}")]
    Conflict { reason: &'static str },
}

/// Name of the unique constraint/index a write violated, if any.
pub(crate) fn unique_violation(err: &sqlx::Error) -> Option<String> {
    let db_err = err.as_database_error()?;
    if !db_err.is_unique_violation() {
        return None;
    }
    Some(db_err.constraint().unwrap_or_default().to_owned())
}
