//! Filesystem collaborators used by the catalog, compositor and exporter

use crate::io::error::{Result, WithPath};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Directory listing, file reads and atomic file writes
///
/// The engine only touches storage through this trait so that callers can
/// substitute their own backing store.
pub trait Storage: Send + Sync {
    /// Names of the entries directly inside `path`, sorted by name
    ///
    /// # Errors
    ///
    /// Returns a filesystem error if the directory is missing or unreadable
    fn list_dir(&self, path: &Path) -> Result<Vec<String>>;

    /// Whether `path` names an existing directory
    fn is_dir(&self, path: &Path) -> bool;

    /// Whether `path` names an existing entry of any kind
    fn exists(&self, path: &Path) -> bool;

    /// Full contents of the file at `path`
    ///
    /// # Errors
    ///
    /// Returns a filesystem error if the file is missing or unreadable
    fn read_file(&self, path: &Path) -> Result<Vec<u8>>;

    /// Replace the file at `path` with `bytes`
    ///
    /// Readers never observe a partially written file under `path`.
    ///
    /// # Errors
    ///
    /// Returns a filesystem error if the parent directory is missing or the
    /// write or rename fails
    fn write_file(&self, path: &Path, bytes: &[u8]) -> Result<()>;

    /// Create `path` and all missing parents
    ///
    /// # Errors
    ///
    /// Returns a filesystem error if a directory cannot be created
    fn create_dir_all(&self, path: &Path) -> Result<()>;
}

/// [`Storage`] backed by the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSystem;

impl Storage for FileSystem {
    fn list_dir(&self, path: &Path) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(path).with_path(path, "list directory")? {
            let entry = entry.with_path(path, "list directory")?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read_file(&self, path: &Path) -> Result<Vec<u8>> {
        std::fs::read(path).with_path(path, "read file")
    }

    fn write_file(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        // Temp file must live on the same filesystem for the rename to be atomic
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut file = NamedTempFile::new_in(parent).with_path(parent, "create temp file")?;
        file.write_all(bytes).with_path(path, "write file")?;
        file.as_file()
            .sync_all()
            .with_path(path, "flush file")?;
        file.persist(path)
            .map_err(|e| e.error)
            .with_path(path, "rename file")?;
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        std::fs::create_dir_all(path).with_path(path, "create directory")
    }
}
