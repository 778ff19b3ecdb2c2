use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

use super::error::{PersistenceError, PersistenceResult};
use super::models::ImageRecord;

/// SQLite-backed record store for managed images.
///
/// Owns the uniqueness rule on `filepath`; it never touches the files the
/// records point at.
pub struct RecordStore {
    conn: Connection,
    db_path: Option<PathBuf>,
}

impl RecordStore {
    /// Open (or create) the database file and initialize the schema
    pub fn open(db_path: impl AsRef<Path>) -> PersistenceResult<Self> {
        let db_path = db_path.as_ref();

        // Ensure the parent directory exists
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                PersistenceError::Initialization(format!(
                    "Failed to create database directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let conn = Connection::open(db_path)?;
        let store = Self {
            conn,
            db_path: Some(db_path.to_path_buf()),
        };
        store.init_schema()?;

        info!("Record store initialized at {}", db_path.display());
        Ok(store)
    }

    /// Open a throwaway store that lives only as long as this value
    pub fn open_in_memory() -> PersistenceResult<Self> {
        let store = Self {
            conn: Connection::open_in_memory()?,
            db_path: None,
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create the images table if needed
    fn init_schema(&self) -> PersistenceResult<()> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS images (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    filename TEXT NOT NULL,
                    filepath TEXT NOT NULL UNIQUE
                );",
            )
            .map_err(|e| {
                PersistenceError::Initialization(format!("Failed to create schema: {}", e))
            })
    }

    /// Path of the database file, `None` for in-memory stores
    pub fn path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Insert a new record and return its id
    pub fn add(&self, display_name: &str, storage_path: &Path) -> PersistenceResult<i64> {
        let path_str = path_to_text(storage_path)?;

        self.conn
            .execute(
                "INSERT INTO images (filename, filepath) VALUES (?1, ?2)",
                params![display_name, path_str],
            )
            .map_err(|e| PersistenceError::from_write(e, storage_path))?;

        let id = self.conn.last_insert_rowid();
        debug!("Recorded image {} as id {}", storage_path.display(), id);
        Ok(id)
    }

    /// All records, newest first
    pub fn list_all(&self) -> PersistenceResult<Vec<ImageRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, filename, filepath FROM images ORDER BY id DESC")?;

        let rows = stmt.query_map([], row_to_record)?;

        let mut records = Vec::new();
        for record in rows {
            records.push(record?);
        }
        Ok(records)
    }

    /// Fetch one record by id
    pub fn get(&self, id: i64) -> PersistenceResult<ImageRecord> {
        self.conn
            .query_row(
                "SELECT id, filename, filepath FROM images WHERE id = ?1",
                params![id],
                row_to_record,
            )
            .optional()?
            .ok_or(PersistenceError::NotFound(id))
    }

    /// Record currently holding this storage path, if any
    pub fn find_by_path(&self, storage_path: &Path) -> PersistenceResult<Option<ImageRecord>> {
        let path_str = path_to_text(storage_path)?;

        let record = self
            .conn
            .query_row(
                "SELECT id, filename, filepath FROM images WHERE filepath = ?1",
                params![path_str],
                row_to_record,
            )
            .optional()?;
        Ok(record)
    }

    /// Number of records
    pub fn count(&self) -> PersistenceResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM images", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Point an existing record at a new file.
    ///
    /// Other records are not consulted first; a clash is only caught by the
    /// UNIQUE constraint on `filepath`.
    pub fn update_path(&self, id: i64, new_storage_path: &Path) -> PersistenceResult<()> {
        let path_str = path_to_text(new_storage_path)?;

        let changed = self
            .conn
            .execute(
                "UPDATE images SET filepath = ?1 WHERE id = ?2",
                params![path_str, id],
            )
            .map_err(|e| PersistenceError::from_write(e, new_storage_path))?;

        if changed == 0 {
            return Err(PersistenceError::NotFound(id));
        }
        Ok(())
    }

    /// Remove a record. The file it points at is left alone.
    pub fn delete(&self, id: i64) -> PersistenceResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM images WHERE id = ?1", params![id])?;

        if changed == 0 {
            return Err(PersistenceError::NotFound(id));
        }
        Ok(())
    }
}

impl std::fmt::Debug for RecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStore")
            .field("db_path", &self.db_path)
            .finish()
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<ImageRecord> {
    let path: String = row.get(2)?;
    Ok(ImageRecord {
        id: row.get(0)?,
        display_name: row.get(1)?,
        storage_path: PathBuf::from(path),
    })
}

fn path_to_text(path: &Path) -> PersistenceResult<&str> {
    path.to_str().ok_or_else(|| {
        PersistenceError::Path(path.to_path_buf(), "path is not valid UTF-8".to_string())
    })
}
