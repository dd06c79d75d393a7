//! Blob storage for uploaded images.
//!
//! Records only reference blobs by path; the bytes live behind an
//! [`ObjectStore`].

pub mod filesystem;

pub use filesystem::FsObjectStore;

use crate::error::StorageError;

/// Path-addressed object storage.
///
/// Paths are `/`-separated relative keys such as `user/case/0-scan.dcm`.
pub trait ObjectStore: Send + Sync {
    /// Stores `content` under `path`. Existing objects are not overwritten.
    fn upload(&self, path: &str, content: &[u8]) -> Result<(), StorageError>;

    /// Removes all named objects in one call, returning how many existed.
    /// Paths that do not exist are ignored.
    fn remove(&self, paths: &[String]) -> Result<usize, StorageError>;
}
