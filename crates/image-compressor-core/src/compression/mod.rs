//! Batch re-encoding of every recorded image.
//!
//! Each record is decoded, converted to the requested bit depth, encoded to
//! `<stem>_compressed.<ext>` in the storage directory, and the record is
//! moved over to the new file. One bad file never stops the batch.

mod convert;
mod encode;
mod options;

pub use convert::convert_bit_depth;
pub use encode::encode;
pub use options::{BitDepth, CompressionOptions, OutputFormat, Quality};

use image::DynamicImage;
use log::{debug, info, warn};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::persistence::{ImageRecord, RecordStore};
use crate::storage::StorageDir;

/// Marker appended to the stem of every compressed file
pub const COMPRESSED_SUFFIX: &str = "_compressed";

/// Why a single record could not be compressed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The stored file is missing or not a readable image
    DecodeFailed(String),

    /// The converted image could not be encoded or written
    EncodeFailed(String),

    /// The new file was written but the record could not be moved to it
    RecordUpdate(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DecodeFailed(cause) => write!(f, "decode failed: {}", cause),
            Self::EncodeFailed(cause) => write!(f, "encode failed: {}", cause),
            Self::RecordUpdate(cause) => write!(f, "record update failed: {}", cause),
        }
    }
}

/// A record that was left as it was
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressionFailure {
    pub id: i64,
    pub display_name: String,
    pub reason: FailureReason,
}

/// Summary of a batch that had records to work on
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompressionResult {
    /// Records in the snapshot taken at the start of the batch
    pub attempted: usize,
    pub failures: Vec<CompressionFailure>,
}

impl CompressionResult {
    pub fn succeeded(&self) -> usize {
        self.attempted - self.failures.len()
    }
}

/// What `compress_all` did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompressionOutcome {
    /// The store held no records
    NothingToCompress,
    Completed(CompressionResult),
}

impl CompressionOutcome {
    pub fn attempted(&self) -> usize {
        match self {
            Self::NothingToCompress => 0,
            Self::Completed(result) => result.attempted,
        }
    }

    pub fn failures(&self) -> &[CompressionFailure] {
        match self {
            Self::NothingToCompress => &[],
            Self::Completed(result) => &result.failures,
        }
    }
}

/// Re-encodes recorded images and keeps store and directory in step
pub struct Compressor<'a> {
    store: &'a RecordStore,
    storage: &'a StorageDir,
}

impl<'a> Compressor<'a> {
    pub fn new(store: &'a RecordStore, storage: &'a StorageDir) -> Self {
        Self { store, storage }
    }

    /// Compress every record present when the call starts.
    ///
    /// Fails only when the snapshot cannot be read or the storage directory
    /// is unusable; per-record problems are reported in the result.
    pub fn compress_all(&self, options: &CompressionOptions) -> Result<CompressionOutcome> {
        let records = self.store.list_all()?;
        if records.is_empty() {
            info!("No images in the record store to compress");
            return Ok(CompressionOutcome::NothingToCompress);
        }

        self.storage.ensure_ready()?;

        info!(
            "Compressing {} image(s): format={}, bit_depth={}, quality={}",
            records.len(),
            options.format,
            options.bit_depth.bits(),
            options.quality.get()
        );

        let mut result = CompressionResult {
            attempted: records.len(),
            failures: Vec::new(),
        };

        for record in &records {
            if let Err(reason) = self.compress_one(record, options) {
                warn!(
                    "Failed to compress {} (id {}): {}",
                    record.display_name, record.id, reason
                );
                result.failures.push(CompressionFailure {
                    id: record.id,
                    display_name: record.display_name.clone(),
                    reason,
                });
            }
        }

        info!(
            "Compression finished: {} of {} succeeded",
            result.succeeded(),
            result.attempted
        );
        Ok(CompressionOutcome::Completed(result))
    }

    /// Output path for a record under the given options
    pub fn output_path(&self, record: &ImageRecord, format: OutputFormat) -> PathBuf {
        self.compressed_path(record, format, 0)
    }

    fn compressed_path(&self, record: &ImageRecord, format: OutputFormat, n: u64) -> PathBuf {
        let stem = record.display_stem();
        let file_name = if n == 0 {
            format!("{}{}.{}", stem, COMPRESSED_SUFFIX, format.extension())
        } else {
            format!("{}{}_{}.{}", stem, COMPRESSED_SUFFIX, n, format.extension())
        };
        self.storage.path_for(file_name)
    }

    /// Where this record's output goes.
    ///
    /// Starts at [`Compressor::output_path`] and moves on to
    /// `<stem>_compressed_1.<ext>`, `_2`, ... while the name belongs to another
    /// record or to a file no record owns. The record's own path is always
    /// acceptable, so repeated passes stay on the same file.
    fn resolve_output_path(
        &self,
        record: &ImageRecord,
        format: OutputFormat,
    ) -> std::result::Result<PathBuf, FailureReason> {
        let mut n = 0;
        loop {
            let candidate = self.compressed_path(record, format, n);
            if candidate == record.storage_path {
                return Ok(candidate);
            }

            let owner = self
                .store
                .find_by_path(&candidate)
                .map_err(|e| FailureReason::RecordUpdate(e.to_string()))?;
            match owner {
                Some(other) if other.id != record.id => {
                    debug!(
                        "{} belongs to record {}, trying the next name",
                        candidate.display(),
                        other.id
                    );
                }
                _ if candidate.exists() => {
                    debug!("{} exists outside the store, skipping", candidate.display());
                }
                _ => return Ok(candidate),
            }
            n += 1;
        }
    }

    fn compress_one(
        &self,
        record: &ImageRecord,
        options: &CompressionOptions,
    ) -> std::result::Result<(), FailureReason> {
        let img = decode_image(&record.storage_path)?;

        let converted = convert_bit_depth(img, options.bit_depth);
        let bytes = encode(&converted, options).map_err(FailureReason::EncodeFailed)?;

        let output_path = self.resolve_output_path(record, options.format)?;
        self.storage
            .write_replacing(&output_path, &bytes)
            .map_err(|e| {
                FailureReason::EncodeFailed(format!(
                    "Failed to write {}: {}",
                    output_path.display(),
                    e
                ))
            })?;

        debug!(
            "Wrote {} ({} bytes) for record {}",
            output_path.display(),
            bytes.len(),
            record.id
        );

        if output_path != record.storage_path {
            self.storage.remove(&record.storage_path);
            self.store
                .update_path(record.id, &output_path)
                .map_err(|e| FailureReason::RecordUpdate(e.to_string()))?;
        }
        Ok(())
    }
}

/// Decode by content; the extension is only a hint
fn decode_image(path: &Path) -> std::result::Result<DynamicImage, FailureReason> {
    let decode_failed = |e: &dyn fmt::Display| FailureReason::DecodeFailed(e.to_string());

    image::io::Reader::open(path)
        .map_err(|e| decode_failed(&e))?
        .with_guessed_format()
        .map_err(|e| decode_failed(&e))?
        .decode()
        .map_err(|e| decode_failed(&e))
}
