use sqlx::error::ErrorKind;
use thiserror::Error;

/// Storage failures, classified from the driver's error kind so callers can
/// tell a broken constraint apart from an unavailable database.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    #[error("check constraint violated: {0}")]
    CheckViolation(String),

    #[error("database error: {0}")]
    Database(sqlx::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            let constraint = db_err
                .constraint()
                .or_else(|| constraint_name(db_err.message()))
                .unwrap_or("unnamed")
                .to_string();
            match db_err.kind() {
                ErrorKind::UniqueViolation => return StorageError::UniqueViolation(constraint),
                ErrorKind::ForeignKeyViolation => {
                    return StorageError::ForeignKeyViolation(constraint)
                }
                ErrorKind::CheckViolation | ErrorKind::NotNullViolation => {
                    return StorageError::CheckViolation(constraint)
                }
                _ => {}
            }
        }
        StorageError::Database(err)
    }
}

/// Pulls the constraint or index name out of a MySQL error message. The
/// MySQL driver does not report it as a separate field.
///
/// * `Duplicate entry '..' for key 'table.index'` (1062; older servers omit `table.`)
/// * `.. a foreign key constraint fails (.., CONSTRAINT <name> FOREIGN KEY ..)` (1451, 1452),
///   with the name in backquotes
/// * `Check constraint 'name' is violated.` (3819)
fn constraint_name(message: &str) -> Option<&str> {
    if let Some((_, rest)) = message.split_once(" for key '") {
        let key = rest.split('\'').next()?;
        return Some(key.rsplit('.').next().unwrap_or(key));
    }
    if let Some((_, rest)) = message.split_once("CONSTRAINT `") {
        return rest.split('`').next();
    }
    if let Some(rest) = message.strip_prefix("Check constraint '") {
        return rest.split('\'').next();
    }
    None
}
