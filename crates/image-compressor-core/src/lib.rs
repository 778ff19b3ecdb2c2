//! Core functionality for ingesting and batch-compressing images.
//!
//! This library provides the foundational components:
//! - A SQLite record store of managed images
//! - A flat storage directory with collision-free naming
//! - Batch ingestion of candidate files
//! - Batch compression with bit-depth and format conversion

// -- External Dependencies --
use log::info;

// -- Standard Library --
use std::path::Path;

// -- Internal Modules --
mod error;

// -- Public Re-exports --
pub use compression::{
    BitDepth, CompressionFailure, CompressionOptions, CompressionOutcome, CompressionResult,
    FailureReason, OutputFormat, Quality,
};
pub use config::*;
pub use error::{Error, Result};
pub use ingestion::{IngestResult, RejectReason, Rejection};
pub use persistence::{ImageRecord, RecordStore};
pub use storage::StorageDir;
pub use types::*;

// -- Public Modules --
pub mod compression;
pub mod config;
pub mod ingestion;
pub mod logging;
pub mod persistence;
pub mod storage;
pub mod types;

/// Main entry point: owns the record store and the storage directory
#[derive(Debug)]
pub struct ImageCompressor {
    config: Config,
    store: RecordStore,
    storage: StorageDir,
}

impl ImageCompressor {
    /// Validate the configuration, prepare the storage directory and open the store
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let storage = StorageDir::new(&config.storage_dir);
        storage.ensure_ready()?;

        let store = RecordStore::open(&config.database_path)?;

        info!(
            "Image compressor ready: storage={}, database={}",
            storage.root().display(),
            config.database_path.display()
        );

        Ok(Self {
            config,
            store,
            storage,
        })
    }

    /// Assemble from already constructed parts
    pub fn from_parts(config: Config, store: RecordStore, storage: StorageDir) -> Self {
        Self {
            config,
            store,
            storage,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn storage(&self) -> &StorageDir {
        &self.storage
    }

    /// Copy and record a batch of candidate files
    pub fn ingest<P: AsRef<Path>>(&self, candidates: &[P]) -> Result<IngestResult> {
        ingestion::Ingestor::new(&self.store, &self.storage).ingest(candidates)
    }

    /// Re-encode every recorded image
    pub fn compress_all(&self, options: &CompressionOptions) -> Result<CompressionOutcome> {
        compression::Compressor::new(&self.store, &self.storage).compress_all(options)
    }

    /// All records, newest first
    pub fn list_images(&self) -> Result<Vec<ImageRecord>> {
        Ok(self.store.list_all()?)
    }

    /// Delete a record, and its file too when `delete_file` is set
    pub fn remove_image(&self, id: i64, delete_file: bool) -> Result<ImageRecord> {
        let record = self.store.get(id)?;
        self.store.delete(id)?;

        if delete_file {
            self.storage.remove(&record.storage_path);
        }

        info!("Removed record {} ({})", record.id, record.display_name);
        Ok(record)
    }
}
