use log::{debug, warn};
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::error::{Error, Result};
use crate::logging::{log_file_error, log_fs_modification};

/// The single flat directory holding every managed image file.
///
/// Knows nothing about records; callers decide what a path means.
#[derive(Debug, Clone)]
pub struct StorageDir {
    root: PathBuf,
}

impl StorageDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the directory if it is missing. Safe to call repeatedly.
    pub fn ensure_ready(&self) -> Result<()> {
        fs::create_dir_all(&self.root).map_err(|source| Error::StorageUnavailable {
            path: self.root.clone(),
            source,
        })?;

        if !self.root.is_dir() {
            return Err(Error::StorageUnavailable {
                path: self.root.clone(),
                source: io::Error::new(io::ErrorKind::Other, "not a directory"),
            });
        }
        Ok(())
    }

    /// Path of a bare file name inside the directory
    pub fn path_for(&self, file_name: impl AsRef<OsStr>) -> PathBuf {
        self.root.join(file_name.as_ref())
    }

    /// First free destination for `file_name`: the name itself, then
    /// `stem_1.ext`, `stem_2.ext`, and so on.
    pub fn unique_destination(&self, file_name: &OsStr) -> PathBuf {
        let name = Path::new(file_name);
        let stem = name.file_stem().unwrap_or(file_name);
        let extension = name.extension();

        let mut candidate = self.root.join(file_name);
        let mut suffix: u64 = 1;
        while candidate.exists() {
            let mut next = OsString::from(stem);
            next.push(format!("_{}", suffix));
            if let Some(ext) = extension {
                next.push(".");
                next.push(ext);
            }
            candidate = self.root.join(next);
            suffix += 1;
        }
        candidate
    }

    /// Copy an external file into the directory and return the path used.
    ///
    /// The source is left untouched. The returned path always refers to a
    /// complete copy.
    pub fn place(&self, source: &Path) -> Result<PathBuf> {
        let file_name = source.file_name().ok_or_else(|| Error::CopyFailed {
            path: source.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"),
        })?;

        let destination = self.unique_destination(file_name);

        if let Err(e) = fs::copy(source, &destination) {
            log_file_error(source, "copy", &e);
            // Do not leave a partial copy behind
            if destination.exists() {
                self.remove(&destination);
            }
            return Err(Error::CopyFailed {
                path: source.to_path_buf(),
                source: e,
            });
        }

        log_fs_modification(
            "copy",
            &destination,
            Some(&format!("from {}", source.display())),
        );
        Ok(destination)
    }

    /// Write `bytes` to `path` through a temporary file in the directory.
    ///
    /// The target is replaced by a rename, so an existing file at `path` is
    /// either fully replaced or left as it was.
    pub fn write_replacing(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        let mut temp = NamedTempFile::new_in(&self.root)?;
        temp.write_all(bytes)?;
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| e.error)?;

        log_fs_modification("write", path, Some(&format!("{} bytes", bytes.len())));
        Ok(())
    }

    /// Best-effort delete. Failures are logged and otherwise ignored.
    pub fn remove(&self, path: &Path) {
        match fs::remove_file(path) {
            Ok(()) => log_fs_modification("delete", path, None),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Nothing to delete at {}", path.display());
            }
            Err(e) => warn!("Could not delete {}: {}", path.display(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::tempdir;

    fn create_file(dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
        let file_path = dir.join(name);
        let mut file = File::create(&file_path).unwrap();
        file.write_all(contents).unwrap();
        file_path
    }

    #[test]
    fn test_ensure_ready_is_idempotent() {
        let temp_dir = tempdir().unwrap();
        let storage = StorageDir::new(temp_dir.path().join("stored_images"));

        storage.ensure_ready().unwrap();
        storage.ensure_ready().unwrap();

        let entries: Vec<_> = fs::read_dir(temp_dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
        assert!(storage.root().is_dir());
    }

    #[test]
    fn test_ensure_ready_fails_on_a_file() {
        let temp_dir = tempdir().unwrap();
        let blocker = create_file(temp_dir.path(), "stored_images", b"not a dir");
        let storage = StorageDir::new(&blocker);

        let result = storage.ensure_ready();
        assert!(matches!(result, Err(Error::StorageUnavailable { .. })));
    }

    #[test]
    fn test_place_without_collision() {
        let source_dir = tempdir().unwrap();
        let storage_dir = tempdir().unwrap();
        let source = create_file(source_dir.path(), "photo.png", b"PNG DATA");
        let storage = StorageDir::new(storage_dir.path());

        let placed = storage.place(&source).unwrap();
        assert_eq!(placed, storage_dir.path().join("photo.png"));
        assert_eq!(fs::read(&placed).unwrap(), b"PNG DATA");
        // The source is left where it was
        assert!(source.exists());
    }

    #[test]
    fn test_place_appends_numeric_suffix() {
        let source_dir = tempdir().unwrap();
        let storage_dir = tempdir().unwrap();
        let source = create_file(source_dir.path(), "photo.png", b"NEW");
        create_file(storage_dir.path(), "photo.png", b"OLD");
        create_file(storage_dir.path(), "photo_1.png", b"OLD");
        let storage = StorageDir::new(storage_dir.path());

        let placed = storage.place(&source).unwrap();
        assert_eq!(placed, storage_dir.path().join("photo_2.png"));
        assert_eq!(fs::read(storage_dir.path().join("photo.png")).unwrap(), b"OLD");
    }

    #[test]
    fn test_failed_copy_leaves_no_destination() {
        let source_dir = tempdir().unwrap();
        let storage_dir = tempdir().unwrap();
        // A directory cannot be copied as a file
        let source = source_dir.path().join("folder.png");
        fs::create_dir(&source).unwrap();
        let storage = StorageDir::new(storage_dir.path());

        let result = storage.place(&source);
        assert!(matches!(result, Err(Error::CopyFailed { .. })));
        assert_eq!(fs::read_dir(storage_dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_write_replacing_swaps_in_a_new_file() {
        let storage_dir = tempdir().unwrap();
        let storage = StorageDir::new(storage_dir.path());
        let target = create_file(storage_dir.path(), "a_compressed.png", b"OLD");
        // A second name for the old file sees the old bytes only if the
        // old file was never truncated in place
        let other_name = storage_dir.path().join("old_link");
        fs::hard_link(&target, &other_name).unwrap();

        storage.write_replacing(&target, b"NEW CONTENT").unwrap();

        assert_eq!(fs::read(&target).unwrap(), b"NEW CONTENT");
        assert_eq!(fs::read(&other_name).unwrap(), b"OLD");
        // No temporary files left behind
        assert_eq!(fs::read_dir(storage_dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn test_write_replacing_failure_keeps_existing_file() {
        let storage_dir = tempdir().unwrap();
        let storage = StorageDir::new(storage_dir.path());
        let target = create_file(storage_dir.path(), "keep.png", b"OLD");
        let missing_dir = StorageDir::new(storage_dir.path().join("missing"));

        // The temporary file cannot be created, so nothing is replaced
        assert!(missing_dir.write_replacing(&target, b"NEW").is_err());
        assert_eq!(fs::read(&target).unwrap(), b"OLD");
    }

    #[test]
    fn test_unique_destination_without_extension() {
        let storage_dir = tempdir().unwrap();
        create_file(storage_dir.path(), "README", b"x");
        let storage = StorageDir::new(storage_dir.path());

        let destination = storage.unique_destination(OsStr::new("README"));
        assert_eq!(destination, storage_dir.path().join("README_1"));
    }

    #[test]
    fn test_place_missing_source() {
        let storage_dir = tempdir().unwrap();
        let storage = StorageDir::new(storage_dir.path());

        let result = storage.place(Path::new("/path/that/does/not/exist/photo.png"));
        assert!(matches!(result, Err(Error::CopyFailed { .. })));
        assert!(!storage_dir.path().join("photo.png").exists());
    }

    #[test]
    fn test_remove_missing_file_is_silent() {
        let storage_dir = tempdir().unwrap();
        let storage = StorageDir::new(storage_dir.path());
        let path = create_file(storage_dir.path(), "gone.png", b"x");

        storage.remove(&path);
        assert!(!path.exists());
        // Second call must not panic or error
        storage.remove(&path);
    }
}
