//! In-memory storage, used primarily by tests.

use std::io::{Cursor, Write};
use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::RwLock;

use crate::error::{ArnicaError, Result};
use crate::storage::{Storage, StorageInput, StorageOutput};

/// Configuration for [`MemoryStorage`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStorageConfig {}

/// Storage that keeps all files in a process-local byte map.
///
/// Matches the visibility semantics of [`FileStorage`](super::FileStorage):
/// an output's bytes appear in the map only when the output is closed, so
/// atomic-rename flushing behaves the same way in tests as on disk.
#[derive(Debug)]
pub struct MemoryStorage {
    files: Arc<RwLock<AHashMap<String, Vec<u8>>>>,
}

impl MemoryStorage {
    pub fn new(_config: MemoryStorageConfig) -> Self {
        Self {
            files: Arc::new(RwLock::new(AHashMap::new())),
        }
    }
}

impl Storage for MemoryStorage {
    fn open_input(&self, path: &str) -> Result<Box<dyn StorageInput>> {
        let files = self.files.read();
        match files.get(path) {
            Some(bytes) => Ok(Box::new(Cursor::new(bytes.clone()))),
            None => Err(ArnicaError::not_found(format!("no such file: {path}"))),
        }
    }

    fn create_output(&self, path: &str) -> Result<Box<dyn StorageOutput>> {
        Ok(Box::new(MemoryOutput {
            path: path.to_string(),
            buf: Vec::new(),
            files: Arc::clone(&self.files),
        }))
    }

    fn file_exists(&self, path: &str) -> bool {
        self.files.read().contains_key(path)
    }

    fn delete_file(&self, path: &str) -> Result<()> {
        match self.files.write().remove(path) {
            Some(_) => Ok(()),
            None => Err(ArnicaError::not_found(format!("no such file: {path}"))),
        }
    }

    fn rename_file(&self, from: &str, to: &str) -> Result<()> {
        let mut files = self.files.write();
        match files.remove(from) {
            Some(bytes) => {
                files.insert(to.to_string(), bytes);
                Ok(())
            }
            None => Err(ArnicaError::not_found(format!("no such file: {from}"))),
        }
    }

    fn list_files(&self) -> Result<Vec<String>> {
        let mut files: Vec<String> = self.files.read().keys().cloned().collect();
        files.sort();
        Ok(files)
    }
}

struct MemoryOutput {
    path: String,
    buf: Vec<u8>,
    files: Arc<RwLock<AHashMap<String, Vec<u8>>>>,
}

impl Write for MemoryOutput {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl StorageOutput for MemoryOutput {
    fn flush_and_sync(&mut self) -> Result<()> {
        Ok(())
    }

    fn close(self: Box<Self>) -> Result<()> {
        self.files.write().insert(self.path, self.buf);
        Ok(())
    }
}
