use rusqlite;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MyappError {
    #[error("SQLite error: {0}")]
    RusqliteError(rusqlite::Error),
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("Constraint violation: {0}")]
    ConstraintError(String),
    #[error("Validation error: {field}: {message}")]
    ValidationError { field: &'static str, message: String },
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("birth_date is not set; baby boomer status cannot be computed")]
    MissingBirthDate,
    #[error("Migration {name} failed: {source}")]
    MigrationError {
        name: &'static str,
        source: rusqlite::Error,
    },
    #[error("Config error: {0}")]
    ConfigError(String),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl MyappError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field,
            message: message.into(),
        }
    }

    /// True for rejections raised by a NOT NULL, UNIQUE, CHECK or FOREIGN KEY constraint.
    pub fn is_constraint(&self) -> bool {
        matches!(self, Self::ConstraintError(_))
    }
}

impl From<rusqlite::Error> for MyappError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(code, msg)
                if code.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Self::ConstraintError(msg.clone().unwrap_or_else(|| err.to_string()))
            }
            _ => Self::RusqliteError(err),
        }
    }
}
