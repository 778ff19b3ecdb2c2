use log::{debug, info, warn};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::persistence::{PersistenceError, RecordStore};
use crate::storage::StorageDir;
use crate::types::is_supported_image;

/// Why a candidate file did not become a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// Extension is not one of the supported image types
    UnsupportedType,

    /// The copy into the storage directory failed
    CopyFailed(String),

    /// The final storage path was already recorded; the copy stays on disk
    DuplicatePath,

    /// The record store refused the insert for another reason
    Store(String),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedType => write!(f, "unsupported file type"),
            Self::CopyFailed(cause) => write!(f, "copy failed: {}", cause),
            Self::DuplicatePath => write!(f, "storage path already recorded"),
            Self::Store(cause) => write!(f, "record store error: {}", cause),
        }
    }
}

/// A candidate that was not ingested
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub path: PathBuf,
    pub reason: RejectReason,
}

/// Outcome of one ingestion batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestResult {
    /// Number of records created
    pub accepted: usize,

    /// Candidates that were skipped, in input order
    pub rejected: Vec<Rejection>,
}

impl IngestResult {
    /// True when nothing was accepted
    pub fn is_empty(&self) -> bool {
        self.accepted == 0
    }

    /// True when no candidate even had a supported type
    pub fn nothing_supported(&self) -> bool {
        self.accepted == 0
            && self
                .rejected
                .iter()
                .all(|r| r.reason == RejectReason::UnsupportedType)
    }
}

/// Copies candidate files into storage and records them
pub struct Ingestor<'a> {
    store: &'a RecordStore,
    storage: &'a StorageDir,
}

impl<'a> Ingestor<'a> {
    pub fn new(store: &'a RecordStore, storage: &'a StorageDir) -> Self {
        Self { store, storage }
    }

    /// Ingest a batch of candidate files.
    ///
    /// Per-file problems end up in the result; only an unusable storage
    /// directory fails the call.
    pub fn ingest<P: AsRef<Path>>(&self, candidates: &[P]) -> Result<IngestResult> {
        self.storage.ensure_ready()?;

        let mut result = IngestResult::default();
        let mut supported = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            let path = candidate.as_ref();
            if is_supported_image(path) {
                supported.push(path);
            } else {
                debug!("Skipping unsupported file {}", path.display());
                result.rejected.push(Rejection {
                    path: path.to_path_buf(),
                    reason: RejectReason::UnsupportedType,
                });
            }
        }

        info!(
            "Ingesting {} of {} candidate file(s)",
            supported.len(),
            candidates.len()
        );

        for path in supported {
            match self.ingest_one(path) {
                Ok(id) => {
                    debug!("Ingested {} as record {}", path.display(), id);
                    result.accepted += 1;
                }
                Err(reason) => {
                    warn!("Could not add image {}: {}", path.display(), reason);
                    result.rejected.push(Rejection {
                        path: path.to_path_buf(),
                        reason,
                    });
                }
            }
        }

        info!(
            "Ingestion finished: {} accepted, {} rejected",
            result.accepted,
            result.rejected.len()
        );
        Ok(result)
    }

    fn ingest_one(&self, source: &Path) -> std::result::Result<i64, RejectReason> {
        let placed = self
            .storage
            .place(source)
            .map_err(|e| RejectReason::CopyFailed(e.to_string()))?;

        let display_name = placed
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        // The copy is kept even when the insert fails
        self.store
            .add(&display_name, &placed)
            .map_err(|e| match e {
                PersistenceError::DuplicatePath(_) => RejectReason::DuplicatePath,
                other => RejectReason::Store(other.to_string()),
            })
    }
}
