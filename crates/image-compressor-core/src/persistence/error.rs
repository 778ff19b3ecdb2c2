use std::path::PathBuf;

/// Result type for persistence operations
pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Persistence-specific errors
#[derive(Debug)]
pub enum PersistenceError {
    /// SQLite errors
    Database(rusqlite::Error),

    /// Path cannot be stored as text
    Path(PathBuf, String),

    /// The storage path is already held by another record
    DuplicatePath(PathBuf),

    /// No record with this id
    NotFound(i64),

    /// Errors during database initialization
    Initialization(String),
}

impl PersistenceError {
    /// Map a SQLite error, turning UNIQUE violations on `filepath` into `DuplicatePath`
    pub(crate) fn from_write(err: rusqlite::Error, path: &std::path::Path) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _)
                if e.code == rusqlite::ErrorCode::ConstraintViolation
                    && e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                PersistenceError::DuplicatePath(path.to_path_buf())
            }
            _ => PersistenceError::Database(err),
        }
    }
}

impl From<rusqlite::Error> for PersistenceError {
    fn from(err: rusqlite::Error) -> Self {
        PersistenceError::Database(err)
    }
}

impl std::fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Database(err) => write!(f, "Database error: {}", err),
            Self::Path(path, msg) => write!(f, "Path error for {}: {}", path.display(), msg),
            Self::DuplicatePath(path) => write!(f, "Duplicate storage path: {}", path.display()),
            Self::NotFound(id) => write!(f, "Record not found: {}", id),
            Self::Initialization(msg) => write!(f, "Database initialization error: {}", msg),
        }
    }
}

impl std::error::Error for PersistenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Database(err) => Some(err),
            _ => None,
        }
    }
}

// Structural cases keep their meaning in the main Error type
impl From<PersistenceError> for crate::Error {
    fn from(err: PersistenceError) -> Self {
        match err {
            PersistenceError::DuplicatePath(path) => crate::Error::DuplicatePath(path),
            PersistenceError::NotFound(id) => crate::Error::NotFound(id),
            other => crate::Error::Persistence(other),
        }
    }
}
