use std::io::Write;
use std::path::{Component, Path, PathBuf};

use super::ObjectStore;
use crate::error::StorageError;

/// An [`ObjectStore`] rooted at a local directory.
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps an object key to a file below the root, rejecting keys that
    /// are absolute or would climb out of it.
    fn resolve(&self, key: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(key);
        let well_formed = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !well_formed {
            return Err(StorageError::InvalidPath(key.to_string()));
        }
        Ok(self.root.join(relative))
    }

    fn ensure_directory(&self, path: &Path) -> Result<(), StorageError> {
        if !path.exists() {
            std::fs::create_dir_all(path).map_err(|e| StorageError::CreateDirectory {
                path: path.to_path_buf(),
                source: e,
            })?;
        }
        Ok(())
    }
}

impl ObjectStore for FsObjectStore {
    fn upload(&self, key: &str, content: &[u8]) -> Result<(), StorageError> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            self.ensure_directory(parent)?;
        }

        // create_new: a second upload to the same key fails instead of clobbering.
        let mut file = match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(StorageError::AlreadyExists(key.to_string()));
            }
            Err(e) => return Err(StorageError::WriteFile { path, source: e }),
        };

        file.write_all(content)
            .map_err(|e| StorageError::WriteFile {
                path: path.clone(),
                source: e,
            })?;

        log::debug!("Stored {} bytes at {}", content.len(), key);
        Ok(())
    }

    fn remove(&self, keys: &[String]) -> Result<usize, StorageError> {
        // Validate the whole batch before touching anything.
        let paths = keys
            .iter()
            .map(|k| self.resolve(k))
            .collect::<Result<Vec<_>, _>>()?;

        let mut removed = 0;
        for path in paths {
            match std::fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(StorageError::RemoveFile { path, source: e }),
            }
        }

        log::debug!("Removed {} of {} objects", removed, keys.len());
        Ok(removed)
    }
}
