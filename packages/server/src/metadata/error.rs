use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetadataError {
    /// A uniqueness invariant rejected the write.
    #[error("Unique constraint violated: {0}")]
    Conflict(String),

    #[error("Metadata store error: {0}")]
    Backend(String),
}

impl From<DbErr> for MetadataError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => MetadataError::Conflict(detail),
            _ => MetadataError::Backend(err.to_string()),
        }
    }
}
