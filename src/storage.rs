//! Pluggable storage backends for shard inputs and result outputs.
//!
//! All durable state in the pipeline flows through the [`Storage`] trait:
//! shard files written by the partitioner, and the long-form/summary
//! snapshots rewritten by the runner on every flush. Paths are
//! `/`-separated strings relative to the storage root.
//!
//! Flushes must be atomic with respect to a crash, so full rewrites go
//! through [`write_atomic`]: the bytes land at a temporary name and are
//! renamed over the canonical path only once fully synced. A reader never
//! observes a half-written snapshot.

pub mod file;
pub mod memory;

use std::io::{Read, Write};
use std::sync::Arc;

use crate::error::Result;

pub use file::{FileStorage, FileStorageConfig};
pub use memory::{MemoryStorage, MemoryStorageConfig};

/// A readable stream opened from storage.
pub trait StorageInput: Read + Send {}

impl<T: Read + Send> StorageInput for T {}

/// A writable stream created in storage.
///
/// Bytes are not guaranteed durable until [`flush_and_sync`] returns, and
/// not guaranteed visible at the target path until [`close`] returns.
///
/// [`flush_and_sync`]: StorageOutput::flush_and_sync
/// [`close`]: StorageOutput::close
pub trait StorageOutput: Write + Send {
    /// Flush buffered bytes and sync them to the underlying medium.
    fn flush_and_sync(&mut self) -> Result<()>;

    /// Finish the stream and make it visible at its path.
    fn close(self: Box<Self>) -> Result<()>;
}

/// Abstract storage backend.
pub trait Storage: Send + Sync + std::fmt::Debug {
    /// Open an existing file for reading.
    fn open_input(&self, path: &str) -> Result<Box<dyn StorageInput>>;

    /// Create (or truncate) a file for writing, creating parent
    /// directories as needed.
    fn create_output(&self, path: &str) -> Result<Box<dyn StorageOutput>>;

    fn file_exists(&self, path: &str) -> bool;

    fn delete_file(&self, path: &str) -> Result<()>;

    /// Atomically rename `from` to `to`, replacing any existing file.
    fn rename_file(&self, from: &str, to: &str) -> Result<()>;

    /// List all file paths under the storage root.
    fn list_files(&self) -> Result<Vec<String>>;
}

/// Configuration for creating a storage backend.
#[derive(Debug, Clone)]
pub enum StorageConfig {
    File(FileStorageConfig),
    Memory(MemoryStorageConfig),
}

/// Factory for creating storage backends from configuration.
pub struct StorageFactory;

impl StorageFactory {
    pub fn create(config: StorageConfig) -> Result<Arc<dyn Storage>> {
        match config {
            StorageConfig::File(config) => Ok(Arc::new(FileStorage::new(config)?)),
            StorageConfig::Memory(config) => Ok(Arc::new(MemoryStorage::new(config))),
        }
    }
}

/// Write `bytes` to `path` atomically: the data goes to `{path}.tmp`, is
/// flushed and synced, and is then renamed over the canonical path. A crash
/// at any point leaves either the old snapshot or the new one, never a
/// partial file.
pub fn write_atomic(storage: &dyn Storage, path: &str, bytes: &[u8]) -> Result<()> {
    let tmp_path = format!("{path}.tmp");
    let mut output = storage.create_output(&tmp_path)?;
    output.write_all(bytes)?;
    output.flush_and_sync()?;
    output.close()?;
    storage.rename_file(&tmp_path, path)
}

/// Read the full contents of a storage file.
pub fn read_to_vec(storage: &dyn Storage, path: &str) -> Result<Vec<u8>> {
    let mut input = storage.open_input(path)?;
    let mut buf = Vec::new();
    input.read_to_end(&mut buf)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_atomic_leaves_no_tmp() -> Result<()> {
        let storage = MemoryStorage::new(MemoryStorageConfig::default());
        write_atomic(&storage, "out/scores.csv", b"url,percentile\n")?;

        assert!(storage.file_exists("out/scores.csv"));
        assert!(!storage.file_exists("out/scores.csv.tmp"));
        assert_eq!(read_to_vec(&storage, "out/scores.csv")?, b"url,percentile\n");
        Ok(())
    }

    #[test]
    fn test_write_atomic_replaces_existing() -> Result<()> {
        let storage = MemoryStorage::new(MemoryStorageConfig::default());
        write_atomic(&storage, "snapshot", b"old")?;
        write_atomic(&storage, "snapshot", b"new contents")?;

        assert_eq!(read_to_vec(&storage, "snapshot")?, b"new contents");
        Ok(())
    }
}
