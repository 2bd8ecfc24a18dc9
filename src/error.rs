use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(rusqlite::Error),

    #[error("storage temporarily unavailable: {0}")]
    StorageTransient(String),

    #[error("not found")]
    NotFound,

    #[error("already exists: {0}")]
    Duplicate(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("end time must be after start time")]
    InvalidRange,

    #[error("invalid or unknown availability token")]
    InvalidToken,

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("token lookup collision")]
    TokenLookupCollision,

    #[error("invalid token format")]
    InvalidTokenFormat,

    #[error("unauthorized")]
    Unauthorized,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Stable machine-readable kind, independent of the message text.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Database(_) => "database",
            Error::StorageTransient(_) => "storage_transient",
            Error::NotFound => "not_found",
            Error::Duplicate(_) => "duplicate",
            Error::Conflict(_) => "conflict",
            Error::InvalidRange => "invalid_range",
            Error::InvalidToken => "invalid_token",
            Error::Validation(_) => "validation",
            Error::TokenLookupCollision => "token_lookup_collision",
            Error::InvalidTokenFormat => "invalid_token_format",
            Error::Unauthorized => "unauthorized",
            Error::Io(_) => "io",
            Error::Config(_) => "config",
        }
    }

    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::StorageTransient(_))
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _)
                if matches!(
                    e.code,
                    rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
                ) =>
            {
                Error::StorageTransient(err.to_string())
            }
            _ => Error::Database(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
