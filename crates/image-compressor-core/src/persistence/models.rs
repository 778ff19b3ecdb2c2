use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// One managed image as persisted in the record store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// ID in the database, assigned on insert
    pub id: i64,

    /// File name shown to the user
    pub display_name: String,

    /// Path of the current file in the storage directory
    pub storage_path: PathBuf,
}

impl ImageRecord {
    /// Check if the recorded file still exists in the filesystem
    pub fn file_exists(&self) -> bool {
        self.storage_path.exists()
    }

    /// Display name without its extension
    pub fn display_stem(&self) -> &str {
        Path::new(&self.display_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.display_name)
    }
}
