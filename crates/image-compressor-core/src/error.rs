use std::path::PathBuf;
use thiserror::Error;

use crate::persistence::PersistenceError;

pub type Result<T> = core::result::Result<T, Error>;

/// Custom error types for the image-compressor library
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Image processing error
    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// Record store error that is not one of the structural cases below
    #[error("Record store error: {0}")]
    Persistence(PersistenceError),

    /// The managed storage directory could not be created or accessed
    #[error("Storage directory unavailable: {path}: {source}")]
    StorageUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Copying a file into the storage directory failed
    #[error("Failed to copy {path} into storage: {source}")]
    CopyFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Another record already points at this storage path
    #[error("Storage path already recorded: {0}")]
    DuplicatePath(PathBuf),

    /// No record with this id
    #[error("Image record not found: {0}")]
    NotFound(i64),

    /// Compression options outside the enumerated choices
    #[error("Invalid compression options: {0}")]
    InvalidOptions(String),

    /// Invalid configuration error
    #[error("Invalid configuration: {0}")]
    Configuration(String),
}
